use crate::models::{CurrentCounts, TabEvent, TabInfo, WindowInfo};
use std::collections::BTreeMap;
use tracing::debug;

pub trait TabSource {
    fn windows(&self) -> Vec<WindowInfo>;

    fn counts(&self) -> CurrentCounts {
        let windows = self.windows();
        CurrentCounts {
            tab_count: windows.iter().map(|window| window.tabs.len() as u64).sum(),
            window_count: windows.len() as u64,
        }
    }
}

impl TabSource for Vec<WindowInfo> {
    fn windows(&self) -> Vec<WindowInfo> {
        self.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LiveBrowser {
    windows: BTreeMap<u64, Vec<u64>>,
}

impl LiveBrowser {
    pub fn from_windows(windows: Vec<WindowInfo>) -> Self {
        let mut browser = Self::default();
        browser.replace(windows);
        browser
    }

    pub fn replace(&mut self, windows: Vec<WindowInfo>) {
        self.windows = windows
            .into_iter()
            .map(|window| (window.id, window.tabs.into_iter().map(|tab| tab.id).collect()))
            .collect();
    }

    // Removing an unknown tab or window is a no-op.
    pub fn apply(&mut self, event: &TabEvent) -> bool {
        let changed = match *event {
            TabEvent::TabCreated { window_id, tab_id } => {
                let tabs = self.windows.entry(window_id).or_default();
                if tabs.contains(&tab_id) {
                    false
                } else {
                    tabs.push(tab_id);
                    true
                }
            }
            TabEvent::TabRemoved { window_id, tab_id } => match window_id {
                Some(window_id) => self
                    .windows
                    .get_mut(&window_id)
                    .is_some_and(|tabs| remove_tab(tabs, tab_id)),
                None => self
                    .windows
                    .values_mut()
                    .any(|tabs| remove_tab(tabs, tab_id)),
            },
            TabEvent::WindowCreated { window_id } => {
                if self.windows.contains_key(&window_id) {
                    false
                } else {
                    self.windows.insert(window_id, Vec::new());
                    true
                }
            }
            TabEvent::WindowRemoved { window_id } => self.windows.remove(&window_id).is_some(),
        };
        debug!(?event, changed, "applied tab event");
        changed
    }
}

fn remove_tab(tabs: &mut Vec<u64>, tab_id: u64) -> bool {
    match tabs.iter().position(|id| *id == tab_id) {
        Some(index) => {
            tabs.remove(index);
            true
        }
        None => false,
    }
}

impl TabSource for LiveBrowser {
    fn windows(&self) -> Vec<WindowInfo> {
        self.windows
            .iter()
            .map(|(id, tabs)| WindowInfo {
                id: *id,
                tabs: tabs.iter().map(|tab| TabInfo { id: *tab }).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn windows_with_tabs(tab_counts: &[u64]) -> Vec<WindowInfo> {
    let mut next_tab = 1;
    tab_counts
        .iter()
        .enumerate()
        .map(|(index, count)| {
            let tabs = (0..*count)
                .map(|_| {
                    let tab = TabInfo { id: next_tab };
                    next_tab += 1;
                    tab
                })
                .collect();
            WindowInfo {
                id: index as u64 + 1,
                tabs,
            }
        })
        .collect()
}
