use thiserror::Error;

use tickler_core::ReminderId;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Reminder text or channel link was empty after trimming.
    #[error("empty {field}")]
    Empty { field: &'static str },

    /// A stored row has columns that cannot be mapped to a reminder.
    #[error("reminder {id} is unreadable: {reason}")]
    Corrupt { id: ReminderId, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
