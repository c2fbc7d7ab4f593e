//! Flight store error types.

use std::io;

/// Flight store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error while opening or creating the store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for flight store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
