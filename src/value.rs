//! Cell values and their canonical string form.
//!
//! A cell in a wordlist holds either a scalar (text or integer) or a
//! sequence of scalars (e.g. a segmented IPA transcription). For storage
//! and for change detection every value is reduced to a single canonical
//! string, so the same function must be pure and locale-independent.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single cell of a wordlist row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// No value at all (distinct from the empty string).
    Null,
    /// Integer data, used for numeric columns such as cognate-set ids.
    Int(i64),
    /// Plain text.
    Text(String),
    /// A sequence of scalars, flattened to one space-joined string when
    /// stored.
    Seq(Vec<CellValue>),
}

impl CellValue {
    /// The canonical string form used for storage and comparison.
    ///
    /// `Null` renders as `"None"`, integers in plain decimal, sequences as
    /// their elements joined by a single space. Note that the sequence form
    /// is lossy: reading `"1 2"` back yields a single text cell, not the
    /// original sequence.
    pub fn canonical(&self) -> String {
        match self {
            CellValue::Null => "None".to_string(),
            CellValue::Int(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Seq(items) => items
                .iter()
                .map(|v| v.canonical())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Collapse a sequence into its canonical text form; scalars pass
    /// through unchanged.
    pub fn flattened(&self) -> CellValue {
        match self {
            CellValue::Seq(_) => CellValue::Text(self.canonical()),
            other => other.clone(),
        }
    }

    /// Convert a JSON value into a cell, the shape merge inputs arrive in.
    ///
    /// Objects are rejected: a cell is never a nested record.
    pub fn from_json(value: &Value) -> Option<CellValue> {
        match value {
            Value::Null => Some(CellValue::Null),
            Value::Number(n) => n.as_i64().map(CellValue::Int),
            Value::String(s) => Some(CellValue::Text(s.clone())),
            Value::Bool(b) => Some(CellValue::Text(b.to_string())),
            Value::Array(items) => items
                .iter()
                .map(CellValue::from_json)
                .collect::<Option<Vec<_>>>()
                .map(CellValue::Seq),
            Value::Object(_) => None,
        }
    }

    /// Parse a stored string back into a cell. Strings that look like
    /// integers only become `Int` when the column is integer-typed, which
    /// the caller knows and we do not.
    pub fn parse(raw: &str, as_integer: bool) -> CellValue {
        if as_integer {
            if let Ok(n) = raw.parse::<i64>() {
                return CellValue::Int(n);
            }
        }
        CellValue::Text(raw.to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<Vec<CellValue>> for CellValue {
    fn from(value: Vec<CellValue>) -> Self {
        CellValue::Seq(value)
    }
}
