//! High-level database API: a wordlist bound to its SQLite store.

use std::path::{Path, PathBuf};

use rusqlite::types::Value as SqlValue;
use thiserror::Error;

use crate::store::{StoreError, SyncIgnore, TableName, TripleStore};
use crate::triples::{self, TriplesError};
use crate::value::CellValue;
use crate::wordlist::{Wordlist, WordlistError};

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Top-level errors, aggregating the layer errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Wordlist(#[from] WordlistError),

    #[error(transparent)]
    Triples(#[from] TriplesError),
}

/// A wordlist database: the in-memory dataset plus the triple store and
/// logical table it synchronizes against.
#[derive(Debug)]
pub struct LexiDb {
    wordlist: Wordlist,
    store: TripleStore,
    table: TableName,
}

impl LexiDb {
    /// Open from raw tabular input (row 0 = header).
    pub fn from_rows(
        raw: std::collections::BTreeMap<i64, Vec<CellValue>>,
        path: impl Into<PathBuf>,
        table: TableName,
    ) -> DbResult<Self> {
        Ok(Self {
            wordlist: Wordlist::from_rows(raw)?,
            store: TripleStore::new(path),
            table,
        })
    }

    /// Open from a `.triples` flat file.
    pub fn from_triples_file(
        file: impl AsRef<Path>,
        path: impl Into<PathBuf>,
        table: TableName,
    ) -> DbResult<Self> {
        let triples = triples::read_triples_file(file)?;
        Ok(Self {
            wordlist: triples::triples_to_rows(&triples)?,
            store: TripleStore::new(path),
            table,
        })
    }

    /// Load the current state of a persisted table.
    pub fn from_store(path: impl Into<PathBuf>, table: TableName) -> DbResult<Self> {
        let store = TripleStore::new(path);
        let triples = store.read_triples(&table)?;
        Ok(Self {
            wordlist: triples::triples_to_rows(&triples)?,
            store,
            table,
        })
    }

    pub fn wordlist(&self) -> &Wordlist {
        &self.wordlist
    }

    pub fn wordlist_mut(&mut self) -> &mut Wordlist {
        &mut self.wordlist
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn store(&self) -> &TripleStore {
        &self.store
    }

    /// Synchronize the session's edits into the store; returns the number
    /// of modified cells.
    pub fn update(&self, ignore: &SyncIgnore) -> DbResult<usize> {
        Ok(self.store.synchronize(&self.wordlist, &self.table, ignore)?)
    }

    /// Recreate the table from scratch ("wipe then sync").
    pub fn create(&self, ignore: &SyncIgnore) -> DbResult<usize> {
        Ok(self.store.create(&self.wordlist, &self.table, ignore)?)
    }

    /// Run a read query against the store, returning raw rows.
    pub fn fetch_all(&self, sql: &str) -> DbResult<Vec<Vec<SqlValue>>> {
        Ok(self.store.fetch_all(sql, [])?)
    }

    /// Compact the store file.
    pub fn vacuum(&self) -> DbResult<()> {
        Ok(self.store.vacuum()?)
    }
}
