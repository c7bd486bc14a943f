// Data models for todostore

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Maximum title length, in UTF-16 code units
pub const MAX_TITLE_LEN: usize = 100;

/// Priority given to new todos
pub const DEFAULT_PRIORITY: &str = "medium";

/// A single task in the todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// Carried through storage verbatim, not used by any behavior
    #[serde(default)]
    pub due_date: Option<Value>,
    /// Carried through storage verbatim, not used by any behavior
    #[serde(default = "default_priority")]
    pub priority: String,
}

impl Todo {
    /// Build a fresh, incomplete todo with a new id
    ///
    /// The title must already be validated.
    pub(crate) fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            completed: false,
            due_date: None,
            priority: default_priority(),
        }
    }
}

fn default_priority() -> String {
    DEFAULT_PRIORITY.to_string()
}

/// Check a title against the length and non-empty rules
///
/// Length is measured in UTF-16 code units and blank means whitespace or
/// byte-order marks only, matching what browser front ends enforce on the
/// same stored data.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}').is_empty() {
        return Err(ValidationError::Empty);
    }

    let len = title.encode_utf16().count();
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            len,
            max: MAX_TITLE_LEN,
        });
    }

    Ok(())
}

/// Generate a unique, creation-ordered id
///
/// UUIDv7 values from one process are strictly increasing, so the hyphenated
/// strings sort in creation order.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
