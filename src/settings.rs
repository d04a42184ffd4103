use crate::models::{Settings, SettingsPatch};
use crate::storage::KvStore;
use serde_json::Value;

pub const SHOW_TABS_NUMBER: &str = "showTabsNumber";
pub const STEP_ENABLED: &str = "stepEnabled";
pub const AUTO_SCALE: &str = "autoScale";
pub const NUM_OF_DAYS: &str = "numOfDays";
pub const USE_GB_DATE_FORMAT: &str = "useGBDateFormat";

pub fn load_settings(store: &KvStore) -> Settings {
    let defaults = Settings::default();
    Settings {
        show_tabs_number: store
            .get_bool(SHOW_TABS_NUMBER)
            .unwrap_or(defaults.show_tabs_number),
        step_enabled: store.get_bool(STEP_ENABLED).unwrap_or(defaults.step_enabled),
        auto_scale: store.get_bool(AUTO_SCALE).unwrap_or(defaults.auto_scale),
        num_of_days: store
            .get(NUM_OF_DAYS)
            .and_then(lenient_days)
            .unwrap_or(defaults.num_of_days),
        use_gb_date_format: store
            .get_bool(USE_GB_DATE_FORMAT)
            .unwrap_or(defaults.use_gb_date_format),
    }
}

// Older popups stored the raw input field value, so "14" is as valid as 14.
fn lenient_days(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub fn apply_patch(store: &mut KvStore, patch: &SettingsPatch) -> Settings {
    if let Some(value) = patch.show_tabs_number {
        store.set(SHOW_TABS_NUMBER, value);
    }
    if let Some(value) = patch.step_enabled {
        store.set(STEP_ENABLED, value);
    }
    if let Some(value) = patch.auto_scale {
        store.set(AUTO_SCALE, value);
    }
    if let Some(value) = patch.num_of_days {
        store.set(NUM_OF_DAYS, value);
    }
    if let Some(value) = patch.use_gb_date_format {
        store.set(USE_GB_DATE_FORMAT, value);
    }
    load_settings(store)
}
