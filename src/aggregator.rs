use crate::badge::{refresh_badge, BadgeRenderer};
use crate::config::{Config, IncrementPolicy, RetentionPolicy};
use crate::errors::AppError;
use crate::models::{CurrentCounts, DayRecord, HistoryEntry, Range};
use crate::source::TabSource;
use crate::storage::{KvStore, PREV_TAB_COUNT, TAB_COUNT, TAB_HISTORY, TOTAL_TABS};
use chrono::{
    DateTime, Datelike, Days, Duration, Local, Months, NaiveDate, NaiveTime, TimeZone,
};
use tracing::{debug, info};

pub fn on_install_or_startup(
    store: &mut KvStore,
    source: &impl TabSource,
    badge: &mut impl BadgeRenderer,
    config: &Config,
) -> Result<CurrentCounts, AppError> {
    on_install_or_startup_at(store, source, badge, config, Local::now())
}

// Tabs already open at startup are not counted as opened.
pub fn on_install_or_startup_at(
    store: &mut KvStore,
    source: &impl TabSource,
    badge: &mut impl BadgeRenderer,
    config: &Config,
    now: DateTime<Local>,
) -> Result<CurrentCounts, AppError> {
    if store.get_u64(TOTAL_TABS).is_none() {
        store.set(TOTAL_TABS, 0u64);
    }

    let tab_count = source.counts().tab_count;
    store.set(TAB_COUNT, tab_count);
    store.set(PREV_TAB_COUNT, tab_count);

    refresh_badge(store, source, badge);
    let counts = record_snapshot_at(store, source, config, now)?;
    info!(
        tabs = counts.tab_count,
        windows = counts.window_count,
        "counters seeded"
    );
    Ok(counts)
}

pub fn record_snapshot(
    store: &mut KvStore,
    source: &impl TabSource,
    config: &Config,
) -> Result<CurrentCounts, AppError> {
    record_snapshot_at(store, source, config, Local::now())
}

pub fn record_snapshot_at(
    store: &mut KvStore,
    source: &impl TabSource,
    config: &Config,
    now: DateTime<Local>,
) -> Result<CurrentCounts, AppError> {
    let counts = source.counts();
    let today = date_key(now.date_naive(), &config.date_key_format);

    let prev_tab_count = store.get_u64(PREV_TAB_COUNT).unwrap_or(0);
    let total_tabs = store.get_u64(TOTAL_TABS).unwrap_or(0);
    let total_tabs = next_total(
        total_tabs,
        prev_tab_count,
        counts.tab_count,
        config.increment_policy,
    );

    store.set_json(
        &today,
        &DayRecord {
            tabs: counts.tab_count,
            windows: counts.window_count,
        },
    )?;
    store.set(TOTAL_TABS, total_tabs);
    store.set(PREV_TAB_COUNT, counts.tab_count);
    store.set(TAB_COUNT, counts.tab_count);

    debug!(
        day = %today,
        tabs = counts.tab_count,
        windows = counts.window_count,
        total_tabs,
        "snapshot recorded"
    );
    Ok(counts)
}

pub fn next_total(
    total_tabs: u64,
    prev_tab_count: u64,
    tab_count: u64,
    policy: IncrementPolicy,
) -> u64 {
    if tab_count <= prev_tab_count {
        return total_tabs;
    }
    match policy {
        IncrementPolicy::Delta => total_tabs.saturating_add(tab_count - prev_tab_count),
        IncrementPolicy::Single => total_tabs.saturating_add(1),
    }
}

pub fn append_history_entry(
    store: &mut KvStore,
    source: &impl TabSource,
    config: &Config,
) -> Result<HistoryEntry, AppError> {
    append_history_entry_at(store, source, config, Local::now())
}

pub fn append_history_entry_at(
    store: &mut KvStore,
    source: &impl TabSource,
    config: &Config,
    now: DateTime<Local>,
) -> Result<HistoryEntry, AppError> {
    let mut history = read_history(store);

    // A clock step backwards must not break the ordering of the log.
    let last = history.last().map_or(i64::MIN, |entry| entry.timestamp);
    let entry = HistoryEntry {
        timestamp: now.timestamp_millis().max(last),
        tab_count: source.counts().tab_count,
    };
    history.push(entry);

    let pruned = prune_history(&mut history, config.retention, now);
    if pruned > 0 {
        info!(pruned, remaining = history.len(), "pruned tab history");
    }

    store.set_json(TAB_HISTORY, &history)?;
    Ok(entry)
}

pub fn prune_history(
    history: &mut Vec<HistoryEntry>,
    retention: RetentionPolicy,
    now: DateTime<Local>,
) -> usize {
    let before = history.len();

    // A cutoff before the earliest representable date keeps everything.
    let cutoff = retention
        .max_age_days
        .and_then(|days| now.checked_sub_days(Days::new(u64::from(days))));
    if let Some(cutoff) = cutoff {
        let cutoff = cutoff.timestamp_millis();
        let expired = history.partition_point(|entry| entry.timestamp < cutoff);
        history.drain(..expired);
    }
    if let Some(max_entries) = retention.max_entries {
        if history.len() > max_entries {
            let excess = history.len() - max_entries;
            history.drain(..excess);
        }
    }

    before - history.len()
}

pub fn read_history(store: &KvStore) -> Vec<HistoryEntry> {
    store
        .get_as::<Vec<HistoryEntry>>(TAB_HISTORY)
        .unwrap_or_default()
}

pub fn query(store: &KvStore, range: Range) -> Vec<HistoryEntry> {
    query_at(store, range, Local::now())
}

pub fn query_at(store: &KvStore, range: Range, now: DateTime<Local>) -> Vec<HistoryEntry> {
    let start = range_start(range, now);
    read_history(store)
        .into_iter()
        .filter(|entry| entry.timestamp >= start)
        .collect()
}

pub fn range_start(range: Range, now: DateTime<Local>) -> i64 {
    let today = now.date_naive();
    let start = match range {
        Range::Today => Some(today),
        Range::Week => today.checked_sub_days(Days::new(7)),
        Range::Month => months_back(today, 1),
        Range::Year => months_back(today, 12),
        Range::AllTime => return 0,
    };
    start
        .and_then(|date| start_of_day(&Local, date))
        .map_or(0, |start| start.timestamp_millis())
}

// Keeps the day of month and rolls past the end of a shorter month:
// March 31 minus one month is March 3.
fn months_back(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let first = date.with_day(1)?.checked_sub_months(Months::new(months))?;
    first.checked_add_days(Days::new(u64::from(date.day0())))
}

const GAP_SEARCH_STEPS: i64 = 100;

// A midnight skipped by a DST jump resolves to the first local time after
// the gap, searched in 15 minute steps.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=GAP_SEARCH_STEPS).find_map(|step| {
        let local = midnight.checked_add_signed(Duration::minutes(step * 15))?;
        tz.from_local_datetime(&local).earliest()
    })
}

pub fn reset_lifetime_counter(store: &mut KvStore) {
    let previous = store.get_u64(TOTAL_TABS).unwrap_or(0);
    store.set(TOTAL_TABS, 0u64);
    info!(previous, "lifetime tab counter reset");
}

pub fn total_tabs(store: &KvStore) -> u64 {
    store.get_u64(TOTAL_TABS).unwrap_or(0)
}

pub fn date_key(date: NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}
