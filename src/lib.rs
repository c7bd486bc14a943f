// todostore - Persistent todo list with filtering and timed undo-delete

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod timer;
pub mod undo;

// Re-export main types for convenience
pub use config::Config;
pub use error::{TodoError, TodoResult, ValidationError};
pub use filter::Filter;
pub use models::{DEFAULT_PRIORITY, MAX_TITLE_LEN, Todo, now_ms};
pub use session::{EditCursor, Session};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{TODOS_KEY, TodoStore};
pub use timer::{CountdownTimer, TimerEvent, TimerId};
pub use undo::{DEFAULT_UNDO_SECONDS, DeleteUndoController, PendingDeletion, UndoView};
