use super::KeyValueStore;
use crate::error::AppError;
use crate::model::{Task, now_millis};
use serde_json::Value;

pub const STORAGE_KEY: &str = "todo_native_v1";

/// Reads the task collection persisted under [`STORAGE_KEY`].
///
/// This never fails: a missing key, unparsable text, or a non-array value all
/// yield an empty collection. Elements are cleaned one field at a time and
/// records without a string `id` are dropped.
pub fn load<S: KeyValueStore>(store: &S) -> Vec<Task> {
    let raw = match store.get(STORAGE_KEY) {
        Ok(Some(raw)) if !raw.is_empty() => raw,
        Ok(_) => return Vec::new(),
        Err(err) => {
            tracing::info!(error = %err, "storage read failed, starting empty");
            return Vec::new();
        }
    };

    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::info!(error = %err, "stored tasks are not valid JSON, starting empty");
            return Vec::new();
        }
    };

    let Value::Array(items) = parsed else {
        tracing::info!("stored tasks are not an array, starting empty");
        return Vec::new();
    };

    let total = items.len();
    let tasks: Vec<Task> = items.iter().filter_map(clean_record).collect();
    if tasks.len() != total {
        tracing::info!(kept = tasks.len(), dropped = total - tasks.len(), "dropped malformed task records");
    }
    tasks
}

/// Overwrites the persisted collection with `tasks`.
pub fn save<S: KeyValueStore>(store: &mut S, tasks: &[Task]) -> Result<(), AppError> {
    let content =
        serde_json::to_string(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;
    store.set(STORAGE_KEY, &content)
}

fn clean_record(value: &Value) -> Option<Task> {
    let record = value.as_object()?;
    let id = record.get("id")?.as_str()?.to_string();

    let text = record
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let completed = record.get("completed").is_some_and(truthy);
    let created_at = record
        .get("createdAt")
        .and_then(timestamp)
        .unwrap_or_else(now_millis);

    Some(Task {
        id,
        text,
        completed,
        created_at,
    })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn timestamp(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(whole) = number.as_i64() {
        return Some(whole);
    }
    number
        .as_f64()
        .filter(|n| n.is_finite())
        .map(|n| n.trunc() as i64)
}
