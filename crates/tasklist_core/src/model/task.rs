use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single to-do record as persisted under the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// Milliseconds since the Unix epoch. Set once at creation.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl Task {
    /// Builds a pending task with a fresh id stamped with the current time.
    /// `text` is stored as given; normalization happens upstream.
    pub fn new(text: &str) -> Self {
        Self {
            id: new_task_id(),
            text: text.to_string(),
            completed: false,
            created_at: now_millis(),
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.completed
    }
}

pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000_000) as i64
}
