//! Wordlist layer error types.

use thiserror::Error;

use crate::schema::SchemaError;

/// Errors raised by in-memory wordlist operations.
#[derive(Debug, Error)]
pub enum WordlistError {
    /// The row id is not present in the dataset.
    #[error("row not found: {0}")]
    RowNotFound(i64),

    /// No column matches the name, case-insensitively.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A row with this id already exists.
    #[error("row already exists: {0}")]
    DuplicateRow(i64),

    /// Row ids must be positive; 0 is reserved for the header.
    #[error("invalid row id: {0}")]
    InvalidRowId(i64),

    /// Raw tabular input without a header row (row 0).
    #[error("missing header row")]
    MissingHeader,

    /// A row's cell count does not match the header.
    #[error("row {id} has {found} cells, header has {expected}")]
    RowLength {
        id: i64,
        expected: usize,
        found: usize,
    },

    /// A required column (typically CONCEPT) is absent during a merge.
    #[error("schema conflict: missing required column {0}")]
    SchemaConflict(String),

    /// A merge source row that cannot be interpreted as tabular data.
    #[error("invalid merge source: {0}")]
    InvalidSource(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result alias for wordlist operations.
pub type WordlistResult<T> = Result<T, WordlistError>;
