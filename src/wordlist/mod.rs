//! The in-memory wordlist: an ordered header plus rows keyed by id,
//! with a pending-deletion set (the "blacklist").
//!
//! The wordlist is the source of truth during a session; the triple store
//! is the source of truth on disk. Edits happen here, and the sync engine
//! in [`crate::store`] writes only the resulting deltas.

mod error;
mod merge;

pub use error::{WordlistError, WordlistResult};
pub use merge::{RowTable, TabularSource};

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{ColumnDef, Header};
use crate::value::CellValue;

/// The join-key column every merge relies on.
pub const CONCEPT_COLUMN: &str = "CONCEPT";
/// The column naming the language variety a row belongs to.
pub const DOCULECT_COLUMN: &str = "DOCULECT";

/// Characters that count as filler when deciding whether a cell holds any
/// usable content.
const FILLER_CHARS: &str = " -?!0";

/// A tabular dataset of linguistic entries keyed by positive integer id.
#[derive(Debug, Clone, Default)]
pub struct Wordlist {
    pub(crate) header: Header,
    pub(crate) rows: BTreeMap<i64, Vec<CellValue>>,
    pub(crate) blacklist: BTreeSet<i64>,
}

impl Wordlist {
    /// Create an empty wordlist with the given header.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            rows: BTreeMap::new(),
            blacklist: BTreeSet::new(),
        }
    }

    /// Build a wordlist from raw tabular input where row 0 holds the
    /// column names and every other key is a row id.
    ///
    /// A leading `ID` column in the header is dropped: the id lives in the
    /// row key, not in the cells.
    pub fn from_rows(mut raw: BTreeMap<i64, Vec<CellValue>>) -> WordlistResult<Self> {
        let header_row = raw.remove(&0).ok_or(WordlistError::MissingHeader)?;
        let mut names: Vec<String> = header_row.iter().map(|c| c.canonical()).collect();
        if names.first().is_some_and(|n| n.eq_ignore_ascii_case("ID")) {
            names.remove(0);
        }
        let header = Header::from_names(names)?;

        let mut wordlist = Wordlist::new(header);
        for (id, values) in raw {
            wordlist.insert_row(id, values)?;
        }
        Ok(wordlist)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row ids in ascending order.
    pub fn row_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.keys().copied()
    }

    /// Rows in id order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &[CellValue])> {
        self.rows.iter().map(|(id, row)| (*id, row.as_slice()))
    }

    /// The highest row id, if any rows exist.
    pub fn max_id(&self) -> Option<i64> {
        self.rows.keys().next_back().copied()
    }

    /// Look up a single cell.
    pub fn get(&self, id: i64, column: &str) -> WordlistResult<&CellValue> {
        let idx = self
            .header
            .index_of(column)
            .ok_or_else(|| WordlistError::ColumnNotFound(column.to_string()))?;
        let row = self.rows.get(&id).ok_or(WordlistError::RowNotFound(id))?;
        Ok(&row[idx])
    }

    /// All cells of a row, in header order.
    pub fn row(&self, id: i64) -> WordlistResult<&[CellValue]> {
        self.rows
            .get(&id)
            .map(Vec::as_slice)
            .ok_or(WordlistError::RowNotFound(id))
    }

    /// Overwrite a single cell.
    pub fn set(&mut self, id: i64, column: &str, value: CellValue) -> WordlistResult<()> {
        let idx = self
            .header
            .index_of(column)
            .ok_or_else(|| WordlistError::ColumnNotFound(column.to_string()))?;
        let row = self.rows.get_mut(&id).ok_or(WordlistError::RowNotFound(id))?;
        row[idx] = value;
        Ok(())
    }

    /// Insert a row under an explicit id.
    pub fn insert_row(&mut self, id: i64, values: Vec<CellValue>) -> WordlistResult<()> {
        if id <= 0 {
            return Err(WordlistError::InvalidRowId(id));
        }
        if self.rows.contains_key(&id) {
            return Err(WordlistError::DuplicateRow(id));
        }
        if values.len() != self.header.len() {
            return Err(WordlistError::RowLength {
                id,
                expected: self.header.len(),
                found: values.len(),
            });
        }
        self.rows.insert(id, values);
        Ok(())
    }

    /// Append a row under the next free id and return that id.
    pub fn push_row(&mut self, values: Vec<CellValue>) -> WordlistResult<i64> {
        let id = self.max_id().unwrap_or(0) + 1;
        self.insert_row(id, values)?;
        Ok(id)
    }

    /// Compute a column for every row from an existing column.
    ///
    /// If the target column already exists its values are overwritten;
    /// otherwise it is appended to the header. Also used for default-filling
    /// when merging, with a constant `derive`.
    pub fn add_column<F>(&mut self, name: &str, source: &str, derive: F) -> WordlistResult<()>
    where
        F: Fn(&CellValue) -> CellValue,
    {
        let src_idx = self
            .header
            .index_of(source)
            .ok_or_else(|| WordlistError::ColumnNotFound(source.to_string()))?;
        match self.header.index_of(name) {
            Some(idx) => {
                for row in self.rows.values_mut() {
                    let derived = derive(&row[src_idx]);
                    row[idx] = derived;
                }
            }
            None => {
                self.header.push(ColumnDef::new(name))?;
                for row in self.rows.values_mut() {
                    let derived = derive(&row[src_idx]);
                    row.push(derived);
                }
            }
        }
        Ok(())
    }

    /// Mark a row for deletion at the next synchronization. The row itself
    /// is left untouched.
    pub fn mark_for_removal(&mut self, id: i64) {
        self.blacklist.insert(id);
    }

    /// Bulk variant of [`Wordlist::mark_for_removal`].
    pub fn mark_all_for_removal<I: IntoIterator<Item = i64>>(&mut self, ids: I) {
        self.blacklist.extend(ids);
    }

    /// Rows currently pending deletion. The set is sticky: synchronizing
    /// does not drain it, re-issued deletes are no-ops.
    pub fn blacklist(&self) -> &BTreeSet<i64> {
        &self.blacklist
    }

    /// Blacklist every row whose `column` cell equals `value` (by canonical
    /// form). Returns the newly blacklisted ids.
    pub fn remove_values(&mut self, value: &CellValue, column: &str) -> WordlistResult<Vec<i64>> {
        let idx = self
            .header
            .index_of(column)
            .ok_or_else(|| WordlistError::ColumnNotFound(column.to_string()))?;
        let target = value.canonical();
        let matched: Vec<i64> = self
            .rows
            .iter()
            .filter(|(_, row)| row[idx].canonical() == target)
            .map(|(id, _)| *id)
            .collect();
        self.blacklist.extend(&matched);
        tracing::info!(
            count = matched.len(),
            column,
            "expanded blacklist; rows are removed at the next synchronization"
        );
        Ok(matched)
    }

    /// Rewrite every cell in `column` equal to `source` (by canonical form)
    /// to `target`. Returns the number of rows touched.
    pub fn modify_value(
        &mut self,
        source: &CellValue,
        target: CellValue,
        column: &str,
    ) -> WordlistResult<usize> {
        let idx = self
            .header
            .index_of(column)
            .ok_or_else(|| WordlistError::ColumnNotFound(column.to_string()))?;
        let needle = source.canonical();
        let mut modified = 0;
        for row in self.rows.values_mut() {
            if row[idx].canonical() == needle {
                row[idx] = target.clone();
                modified += 1;
            }
        }
        tracing::info!(modified, column, "modified cell values");
        Ok(modified)
    }

    /// Blacklist rows of the given doculect whose `entries` columns contain
    /// no usable content (only whitespace and filler characters). Columns
    /// absent from the header are treated as empty.
    pub fn remove_empty_rows(
        &mut self,
        doculect: &str,
        entries: &[&str],
    ) -> WordlistResult<Vec<i64>> {
        let doc_idx = self
            .header
            .index_of(DOCULECT_COLUMN)
            .ok_or_else(|| WordlistError::SchemaConflict(DOCULECT_COLUMN.to_string()))?;
        let entry_idxs: Vec<usize> = entries
            .iter()
            .filter_map(|name| self.header.index_of(name))
            .collect();

        let mut matched = Vec::new();
        for (id, row) in &self.rows {
            if row[doc_idx].canonical() != doculect {
                continue;
            }
            let has_content = entry_idxs.iter().any(|&idx| {
                row[idx]
                    .canonical()
                    .chars()
                    .any(|c| !FILLER_CHARS.contains(c))
            });
            if !has_content {
                matched.push(*id);
            }
        }
        self.blacklist.extend(&matched);
        tracing::info!(count = matched.len(), doculect, "blacklisted empty rows");
        Ok(matched)
    }

    /// Distinct concept values in row order.
    pub fn concepts(&self) -> WordlistResult<Vec<String>> {
        let idx = self
            .header
            .index_of(CONCEPT_COLUMN)
            .ok_or_else(|| WordlistError::SchemaConflict(CONCEPT_COLUMN.to_string()))?;
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for row in self.rows.values() {
            let concept = row[idx].canonical();
            if seen.insert(concept.clone()) {
                out.push(concept);
            }
        }
        Ok(out)
    }
}
