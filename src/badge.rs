use crate::models::CurrentCounts;
use crate::settings::load_settings;
use crate::source::TabSource;
use crate::storage::KvStore;
use tracing::debug;

pub trait BadgeRenderer {
    fn set_text(&mut self, text: String);
}

#[derive(Debug, Clone, Default)]
pub struct Badge {
    text: String,
}

impl Badge {
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl BadgeRenderer for Badge {
    fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

pub fn badge_text(show_tabs_number: bool, counts: CurrentCounts) -> String {
    if show_tabs_number {
        counts.tab_count.to_string()
    } else {
        counts.window_count.to_string()
    }
}

pub fn refresh_badge(
    store: &KvStore,
    source: &impl TabSource,
    renderer: &mut impl BadgeRenderer,
) -> String {
    let settings = load_settings(store);
    let text = badge_text(settings.show_tabs_number, source.counts());
    debug!(%text, "badge refreshed");
    renderer.set_text(text.clone());
    text
}
