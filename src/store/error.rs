//! Store layer error types.

use thiserror::Error;

use crate::store::types::InvalidTableNameError;

/// Errors raised by the SQLite store adapter and the sync engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Any failure opening, reading, or writing the SQLite database.
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Filesystem-level failure (e.g. writing the blacklist log).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The logical table name failed validation.
    #[error("invalid table name: {0}")]
    InvalidTableName(#[from] InvalidTableNameError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
