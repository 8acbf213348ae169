//! Validated names for the store layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a table name was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidTableNameError {
    #[error("table name is empty")]
    Empty,

    #[error("table name is too long ({0} characters, max 64)")]
    TooLong(usize),

    #[error("table name must start with a letter or underscore, got '{0}'")]
    InvalidStart(char),

    #[error("invalid character '{0}' at position {1}")]
    InvalidChar(char, usize),

    #[error("'{0}' is a reserved table name")]
    Reserved(String),
}

/// A validated logical table name.
///
/// The name ends up interpolated into SQL text (SQLite cannot bind table
/// names), so it is restricted to identifier characters and may not shadow
/// the shared audit table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName(String);

impl TableName {
    const RESERVED: &'static [&'static str] = &["backup", "sqlite_master", "sqlite_sequence"];

    /// Create a table name, validating the input.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidTableNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), InvalidTableNameError> {
        if name.is_empty() {
            return Err(InvalidTableNameError::Empty);
        }
        if name.len() > 64 {
            return Err(InvalidTableNameError::TooLong(name.len()));
        }
        let first = name.chars().next().unwrap();
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(InvalidTableNameError::InvalidStart(first));
        }
        for (i, c) in name.chars().enumerate() {
            if !c.is_ascii_alphanumeric() && c != '_' {
                return Err(InvalidTableNameError::InvalidChar(c, i));
            }
        }
        if Self::RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            return Err(InvalidTableNameError::Reserved(name.to_string()));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
