// Error types for todo operations

use thiserror::Error;

/// Result alias used throughout the library
pub type TodoResult<T> = std::result::Result<T, TodoError>;

/// Errors produced by store, undo and storage operations
///
/// None of these are fatal: callers are expected to absorb them and leave
/// the visible state unchanged.
#[derive(Debug, Error)]
pub enum TodoError {
    /// Title failed validation; nothing was created or edited
    #[error("invalid title: {0}")]
    Validation(#[from] ValidationError),

    /// No todo has the given id
    #[error("todo not found: {id}")]
    NotFound { id: String },

    /// Persisted state could not be parsed
    #[error("stored todos are corrupt: {0}")]
    StorageCorrupt(#[source] serde_json::Error),

    /// Undo requested with nothing pending
    #[error("no deletion is pending")]
    InvalidState,

    /// Reading or writing the storage backend failed
    #[error("storage failure: {0:#}")]
    Storage(eyre::Report),
}

/// Title validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title cannot be empty")]
    Empty,

    #[error("title too long: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },
}

impl TodoError {
    pub(crate) fn not_found(id: &str) -> Self {
        TodoError::NotFound { id: id.to_string() }
    }
}
