//! Merging new rows and columns into a wordlist.
//!
//! Merge inputs are anything implementing [`TabularSource`]: column names
//! plus cell lookup by (row id, column name). [`RowTable`] is the plain
//! owned implementation, constructible from JSON objects.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

use crate::schema::ColumnType;
use crate::value::CellValue;
use crate::wordlist::error::{WordlistError, WordlistResult};
use crate::wordlist::{Wordlist, CONCEPT_COLUMN, DOCULECT_COLUMN};

/// The capability a merge input must expose: its column names and cell
/// lookup by row id and column name.
pub trait TabularSource {
    /// Canonical column names, in source order.
    fn columns(&self) -> Vec<String>;

    /// Row ids, in the order rows should be merged.
    fn row_ids(&self) -> Vec<i64>;

    /// The cell at (row, column), if present.
    fn value(&self, id: i64, column: &str) -> Option<CellValue>;
}

impl TabularSource for Wordlist {
    fn columns(&self) -> Vec<String> {
        self.header.names().iter().map(|s| s.to_string()).collect()
    }

    fn row_ids(&self) -> Vec<i64> {
        self.rows.keys().copied().collect()
    }

    fn value(&self, id: i64, column: &str) -> Option<CellValue> {
        self.get(id, column).ok().cloned()
    }
}

/// A simple owned [`TabularSource`]: an ordered column list plus one map
/// of cells per row.
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    columns: Vec<String>,
    rows: Vec<BTreeMap<String, CellValue>>,
}

impl RowTable {
    /// Create a table with a seed column order. Duplicate names are kept
    /// once.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = RowTable::default();
        for name in columns {
            table.add_column(name.as_ref());
        }
        table
    }

    fn add_column(&mut self, name: &str) {
        let canonical = name.to_ascii_uppercase();
        if !self.columns.iter().any(|c| *c == canonical) {
            self.columns.push(canonical);
        }
    }

    /// Append a row. Columns not seen before are appended to the column
    /// list in first-appearance order.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (S, CellValue)>,
        S: AsRef<str>,
    {
        let mut row = BTreeMap::new();
        for (name, value) in cells {
            let canonical = name.as_ref().to_ascii_uppercase();
            self.add_column(&canonical);
            row.insert(canonical, value);
        }
        self.rows.push(row);
    }

    /// Build a table from JSON objects, one object per row. Non-object
    /// values and nested objects are rejected.
    pub fn from_json(rows: &[Value]) -> WordlistResult<Self> {
        let mut table = RowTable::default();
        for value in rows {
            let object = value.as_object().ok_or_else(|| {
                WordlistError::InvalidSource(format!("expected a JSON object, got {value}"))
            })?;
            let mut cells = Vec::with_capacity(object.len());
            for (name, raw) in object {
                let cell = CellValue::from_json(raw).ok_or_else(|| {
                    WordlistError::InvalidSource(format!(
                        "column {name} holds a nested object"
                    ))
                })?;
                cells.push((name.clone(), cell));
            }
            table.push_row(cells);
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TabularSource for RowTable {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn row_ids(&self) -> Vec<i64> {
        (1..=self.rows.len() as i64).collect()
    }

    fn value(&self, id: i64, column: &str) -> Option<CellValue> {
        let canonical = column.to_ascii_uppercase();
        self.rows
            .get((id - 1) as usize)
            .and_then(|row| row.get(&canonical))
            .cloned()
    }
}

impl Wordlist {
    /// Merge rows from a tabular source into this wordlist.
    ///
    /// Columns present in the source but unknown here (minus
    /// `ignore_columns`) are created first and backfilled with their
    /// type-appropriate default for every existing row. Incoming rows then
    /// receive consecutive fresh ids starting at `max(existing) + 1` (or 1),
    /// preserving source order; sequence values are flattened. Returns the
    /// highest id assigned, or `None` when the source held no rows.
    pub fn add_data(
        &mut self,
        source: &dyn TabularSource,
        ignore_columns: &[&str],
    ) -> WordlistResult<Option<i64>> {
        let ignored: HashSet<String> = ignore_columns
            .iter()
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let kept: Vec<String> = source
            .columns()
            .into_iter()
            .map(|c| c.to_ascii_uppercase())
            .filter(|c| !ignored.contains(c))
            .collect();
        let new_columns: Vec<String> = kept
            .iter()
            .filter(|c| self.header.index_of(c).is_none())
            .cloned()
            .collect();

        // New columns are backfilled against the concept column, the join
        // key guaranteed to exist in wordlist data.
        if !new_columns.is_empty() && self.header.index_of(CONCEPT_COLUMN).is_none() {
            return Err(WordlistError::SchemaConflict(CONCEPT_COLUMN.to_string()));
        }
        for name in &new_columns {
            let default = ColumnType::infer(name).default_value();
            self.add_column(name, CONCEPT_COLUMN, |_| default.clone())?;
        }

        let source_ids = source.row_ids();
        if source_ids.is_empty() {
            return Ok(None);
        }

        let kept: HashSet<&str> = kept.iter().map(String::as_str).collect();
        let mut next_id = self.max_id().unwrap_or(0) + 1;
        let mut last_id = next_id;
        let added_rows = source_ids.len();
        for source_id in source_ids {
            let mut cells = Vec::with_capacity(self.header.len());
            for column in self.header.columns() {
                let cell = if kept.contains(column.name.as_str()) {
                    source
                        .value(source_id, &column.name)
                        .map(|v| v.flattened())
                        .unwrap_or_else(|| column.column_type.default_value())
                } else {
                    column.column_type.default_value()
                };
                cells.push(cell);
            }
            self.rows.insert(next_id, cells);
            last_id = next_id;
            next_id += 1;
        }
        tracing::info!(
            rows = added_rows,
            new_columns = new_columns.len(),
            "merged tabular data"
        );
        Ok(Some(last_id))
    }

    /// Add a template for a new doculect: one row per existing distinct
    /// concept, with each of `value_columns` initialized from the rows
    /// sharing that concept (later rows win on duplicates).
    pub fn add_doculect(
        &mut self,
        doculect: &str,
        value_columns: &[&str],
    ) -> WordlistResult<Option<i64>> {
        let concepts = self.concepts()?;

        // concept -> cell, per value column; later rows overwrite earlier
        let mut converter: Vec<HashMap<String, CellValue>> =
            vec![HashMap::new(); value_columns.len()];
        for id in self.rows.keys().copied().collect::<Vec<_>>() {
            let concept = self.get(id, CONCEPT_COLUMN)?.canonical();
            for (i, column) in value_columns.iter().enumerate() {
                let cell = self.get(id, column)?.clone();
                converter[i].insert(concept.clone(), cell);
            }
        }

        let mut table = RowTable::new(
            [DOCULECT_COLUMN, CONCEPT_COLUMN]
                .into_iter()
                .chain(value_columns.iter().copied()),
        );
        for concept in &concepts {
            let mut cells: Vec<(String, CellValue)> = vec![
                (DOCULECT_COLUMN.to_string(), CellValue::Text(doculect.into())),
                (CONCEPT_COLUMN.to_string(), CellValue::Text(concept.clone())),
            ];
            for (i, column) in value_columns.iter().enumerate() {
                if let Some(cell) = converter[i].get(concept) {
                    cells.push((column.to_ascii_uppercase(), cell.clone()));
                }
            }
            table.push_row(cells);
        }

        let added = self.add_data(&table, &[])?;
        tracing::info!(doculect, concepts = concepts.len(), "added doculect template");
        Ok(added)
    }
}
