use chrono::NaiveDate;
use std::{env, fmt::Write, path::PathBuf, str::FromStr};
use tracing::warn;

pub const DEFAULT_DATA_PATH: &str = "data/store.json";
pub const DEFAULT_PORT: u16 = 8080;
// en-US toLocaleDateString(), e.g. 3/7/2026
pub const DEFAULT_DATE_KEY_FORMAT: &str = "%-m/%-d/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncrementPolicy {
    #[default]
    Delta,
    Single,
}

impl FromStr for IncrementPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "delta" => Ok(Self::Delta),
            "single" => Ok(Self::Single),
            other => Err(format!("unknown increment policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    pub max_age_days: Option<u32>,
    pub max_entries: Option<usize>,
}

impl RetentionPolicy {
    pub fn is_unbounded(&self) -> bool {
        self.max_age_days.is_none() && self.max_entries.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub port: u16,
    pub increment_policy: IncrementPolicy,
    pub date_key_format: String,
    pub retention: RetentionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            port: DEFAULT_PORT,
            increment_policy: IncrementPolicy::default(),
            date_key_format: DEFAULT_DATE_KEY_FORMAT.to_string(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("APP_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }
        if let Some(port) = parse_var(&lookup, "PORT") {
            config.port = port;
        }
        if let Some(policy) = parse_var(&lookup, "TOTAL_TABS_POLICY") {
            config.increment_policy = policy;
        }
        if let Some(format) = lookup("DATE_KEY_FORMAT") {
            if is_valid_date_format(&format) {
                config.date_key_format = format;
            } else {
                warn!("ignoring DATE_KEY_FORMAT '{format}': not a valid date format");
            }
        }
        config.retention.max_age_days = parse_var(&lookup, "HISTORY_RETENTION_DAYS");
        config.retention.max_entries = parse_var(&lookup, "HISTORY_MAX_ENTRIES");

        config
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("ignoring {key}='{raw}': {err}");
            None
        }
    }
}

// Formatting a bare date fails on time specifiers.
fn is_valid_date_format(format: &str) -> bool {
    let Some(sample) = NaiveDate::from_ymd_opt(2000, 1, 1) else {
        return false;
    };
    let mut rendered = String::new();
    write!(rendered, "{}", sample.format(format)).is_ok() && !rendered.is_empty()
}
