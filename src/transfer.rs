use crate::errors::AppError;
use crate::storage::KvStore;
use serde_json::{Map, Value};

pub fn export_store(store: &KvStore) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(store.entries())?)
}

pub fn parse_import(body: &str) -> Result<Map<String, Value>, AppError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| AppError::bad_request(format!("import is not valid JSON: {err}")))?;
    match value {
        Value::Object(entries) => Ok(entries),
        Value::Array(_) => Err(AppError::bad_request(
            "import root must be an object, not an array",
        )),
        _ => Err(AppError::bad_request("import root must be an object")),
    }
}

pub fn import_store(store: &mut KvStore, entries: Map<String, Value>) -> usize {
    store.replace(entries);
    store.len()
}
