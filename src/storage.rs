use crate::errors::AppError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;
use tracing::{error, warn};

pub const TOTAL_TABS: &str = "totalTabs";
pub const TAB_COUNT: &str = "tabCount";
pub const PREV_TAB_COUNT: &str = "prevTabCount";
pub const TAB_HISTORY: &str = "tabHistory";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvStore {
    entries: Map<String, Value>,
}

impl KvStore {
    pub fn new(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.entries.get(key).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.entries.get(key).and_then(Value::as_bool)
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match T::deserialize(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!("ignoring malformed value under '{key}': {err}");
                None
            }
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(value)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn replace(&mut self, entries: Map<String, Value>) {
        self.clear();
        self.entries.extend(entries);
    }
}

pub async fn load_store(path: &Path) -> KvStore {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Map<String, Value>>(&bytes) {
            Ok(entries) => KvStore::new(entries),
            Err(err) => {
                error!("failed to parse store file: {err}");
                KvStore::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => KvStore::default(),
        Err(err) => {
            error!("failed to read store file: {err}");
            KvStore::default()
        }
    }
}

pub async fn persist_store(path: &Path, store: &KvStore) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(store.entries())?;
    fs::write(path, payload).await?;
    Ok(())
}
