//! Column descriptors and the ordered header.
//!
//! The header is an explicit ordered list of column definitions. Column
//! lookup is case-insensitive, but the canonical name written to the store
//! is always upper-cased.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::CellValue;

/// Schema-level errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
}

/// The value class of a column, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
}

impl ColumnType {
    /// Infer the type from a column name: names ending in `ID` (COGID,
    /// ETYMID, ...) hold integers, everything else holds text.
    pub fn infer(name: &str) -> Self {
        if name.to_ascii_uppercase().ends_with("ID") {
            ColumnType::Integer
        } else {
            ColumnType::Text
        }
    }

    /// The default value a row receives when it lacks this column.
    pub fn default_value(&self) -> CellValue {
        match self {
            ColumnType::Text => CellValue::Text(String::new()),
            ColumnType::Integer => CellValue::Int(0),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Integer => write!(f, "INTEGER"),
        }
    }
}

/// A single column: canonical (upper-cased) name plus its value class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    /// Create a column definition, canonicalizing the name and inferring
    /// the type from it.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref().to_ascii_uppercase();
        let column_type = ColumnType::infer(&name);
        Self { name, column_type }
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)
    }
}

/// The ordered list of columns of a wordlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    columns: Vec<ColumnDef>,
}

impl Header {
    /// Build a header from column names, rejecting duplicates
    /// (case-insensitively).
    pub fn from_names<I, S>(names: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut header = Header::default();
        for name in names {
            header.push(ColumnDef::new(name))?;
        }
        Ok(header)
    }

    /// Append a column, rejecting duplicates.
    pub fn push(&mut self, column: ColumnDef) -> Result<(), SchemaError> {
        if self.index_of(&column.name).is_some() {
            return Err(SchemaError::DuplicateColumn(column.name));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Position of a column by case-insensitive name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Canonical column names in header order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
