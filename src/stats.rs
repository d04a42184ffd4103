use crate::aggregator::date_key;
use crate::models::{DailyPoint, DayRecord};
use crate::storage::KvStore;
use chrono::{Duration, Local, NaiveDate};

pub const MAX_SERIES_DAYS: u32 = 365;

pub fn daily_series(
    store: &KvStore,
    num_days: u32,
    date_key_format: &str,
    use_gb_date_format: bool,
) -> Vec<DailyPoint> {
    daily_series_at(
        Local::now().date_naive(),
        store,
        num_days,
        date_key_format,
        use_gb_date_format,
    )
}

pub fn daily_series_at(
    today: NaiveDate,
    store: &KvStore,
    num_days: u32,
    date_key_format: &str,
    use_gb_date_format: bool,
) -> Vec<DailyPoint> {
    let num_days = num_days.clamp(1, MAX_SERIES_DAYS);
    let label_format = if use_gb_date_format { "%-d/%m" } else { "%m/%-d" };

    (0..num_days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(i64::from(offset));
            let key = date_key(date, date_key_format);
            let record = store.get_as::<DayRecord>(&key).unwrap_or_default();
            DailyPoint {
                label: date.format(label_format).to_string(),
                date: key,
                tabs: record.tabs,
                windows: record.windows,
            }
        })
        .collect()
}
