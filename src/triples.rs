//! The triple codec: between the tabular view and flat
//! (id, column, value) facts.
//!
//! Triples are what the store persists. Encoding drops cells still holding
//! their column's default so the store only carries real data; decoding
//! refills missing cells with those defaults, which makes the two
//! directions inverse for scalar values. Sequence cells flatten to their
//! canonical string and do not survive a round trip as sequences.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{ColumnType, Header};
use crate::value::CellValue;
use crate::wordlist::{Wordlist, WordlistResult};

/// An atomic persisted fact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub id: i64,
    pub column: String,
    pub value: String,
}

impl Triple {
    pub fn new(id: i64, column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id,
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Errors reading or writing the `.triples` flat-file serialization.
#[derive(Debug, Error)]
pub enum TriplesError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed triple on line {line}: {content}")]
    Malformed { line: usize, content: String },
}

/// Emit one triple per cell holding a non-default value. Column names are
/// already canonical (upper-cased); sequences flatten to their canonical
/// string. Output order follows row order; callers needing a deterministic
/// total order sort the result.
pub fn rows_to_triples(wordlist: &Wordlist) -> Vec<Triple> {
    let defaults: Vec<String> = wordlist
        .header()
        .columns()
        .iter()
        .map(|c| c.column_type.default_value().canonical())
        .collect();

    let mut triples = Vec::new();
    for (id, row) in wordlist.iter() {
        for (idx, column) in wordlist.header().columns().iter().enumerate() {
            let value = row[idx].canonical();
            if value == defaults[idx] {
                continue;
            }
            triples.push(Triple::new(id, column.name.clone(), value));
        }
    }
    triples
}

/// Rebuild a wordlist from flat triples: the header is the sorted set of
/// distinct column names observed, absent cells get the column's default.
/// Later duplicates of the same (id, column) win.
pub fn triples_to_rows(triples: &[Triple]) -> WordlistResult<Wordlist> {
    let mut names = BTreeSet::new();
    for triple in triples {
        names.insert(triple.column.to_ascii_uppercase());
    }
    let header = Header::from_names(&names)?;

    let mut grouped: BTreeMap<i64, BTreeMap<String, &str>> = BTreeMap::new();
    for triple in triples {
        grouped
            .entry(triple.id)
            .or_default()
            .insert(triple.column.to_ascii_uppercase(), &triple.value);
    }

    let mut wordlist = Wordlist::new(header);
    for (id, cells) in grouped {
        let row: Vec<CellValue> = wordlist
            .header()
            .columns()
            .iter()
            .map(|column| match cells.get(&column.name) {
                Some(raw) => {
                    CellValue::parse(raw, column.column_type == ColumnType::Integer)
                }
                None => column.column_type.default_value(),
            })
            .collect();
        wordlist.insert_row(id, row)?;
    }
    Ok(wordlist)
}

/// Read triples from a tab-separated file: `id<TAB>column<TAB>value` per
/// line, empty lines skipped.
pub fn read_triples_file(path: impl AsRef<Path>) -> Result<Vec<Triple>, TriplesError> {
    let content = fs::read_to_string(path)?;
    let mut triples = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, '\t');
        let triple = match (parts.next(), parts.next(), parts.next()) {
            (Some(id), Some(column), Some(value)) => match id.parse::<i64>() {
                Ok(id) => Triple::new(id, column, value),
                Err(_) => {
                    return Err(TriplesError::Malformed {
                        line: number + 1,
                        content: line.to_string(),
                    })
                }
            },
            _ => {
                return Err(TriplesError::Malformed {
                    line: number + 1,
                    content: line.to_string(),
                })
            }
        };
        triples.push(triple);
    }
    Ok(triples)
}

/// Write triples as a tab-separated file, one per line.
pub fn write_triples_file(
    path: impl AsRef<Path>,
    triples: &[Triple],
) -> Result<(), TriplesError> {
    let mut out = String::new();
    for triple in triples {
        out.push_str(&format!("{}\t{}\t{}\n", triple.id, triple.column, triple.value));
    }
    fs::write(path, out)?;
    Ok(())
}
