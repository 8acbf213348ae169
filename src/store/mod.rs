//! The SQLite store adapter and the synchronization engine.
//!
//! On disk a wordlist table is a flat triple relation `(ID, COL, VAL)`
//! plus one shared append-only audit table `backup`. This module owns the
//! scoped connection handling ([`scope`]), the schema, and the
//! reconciliation algorithm ([`sync`]).

mod error;
mod scope;
mod sync;
mod types;

pub use error::{StoreError, StoreResult};
pub use scope::StoreScope;
pub use sync::{AuditRecord, SyncIgnore, AUDIT_ACTOR};
pub use types::{InvalidTableNameError, TableName};

use std::path::{Path, PathBuf};

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Params};

use crate::triples::Triple;

/// Handle to a triple store on disk.
///
/// Holds only the path; every operation acquires its own [`StoreScope`],
/// so the database file is never kept open between calls.
#[derive(Debug, Clone)]
pub struct TripleStore {
    path: PathBuf,
}

impl TripleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Begin a new scope against this store.
    pub fn scope(&self) -> StoreResult<StoreScope> {
        StoreScope::open(&self.path)
    }

    /// Idempotently create the audit table and the named triple table.
    pub fn ensure_schema(&self, table: &TableName) -> StoreResult<()> {
        let scope = self.scope()?;
        scope.execute(
            "CREATE TABLE IF NOT EXISTS backup \
             (FILE text, ID int, COL text, VAL text, DATE text, USER text)",
            [],
        )?;
        scope.execute(
            &format!("CREATE TABLE IF NOT EXISTS {table} (ID int, COL text, VAL text)"),
            [],
        )?;
        scope.commit()
    }

    /// Run a read query in a fresh scope and return the raw result rows.
    pub fn fetch_all<P: Params>(&self, sql: &str, params: P) -> StoreResult<Vec<Vec<SqlValue>>> {
        let scope = self.scope()?;
        scope.fetch_all(sql, params, |row| {
            let count = row.as_ref().column_count();
            let mut cells = Vec::with_capacity(count);
            for idx in 0..count {
                cells.push(row.get::<_, SqlValue>(idx)?);
            }
            Ok(cells)
        })
    }

    /// All persisted triples of a table, ordered by id, column, value.
    pub fn read_triples(&self, table: &TableName) -> StoreResult<Vec<Triple>> {
        let scope = self.scope()?;
        scope.fetch_all(
            &format!("SELECT ID, COL, VAL FROM {table} ORDER BY ID, COL, VAL"),
            [],
            |row| {
                Ok(Triple {
                    id: row.get(0)?,
                    column: row.get(1)?,
                    value: stringify_sql(row.get(2)?),
                })
            },
        )
    }

    /// Reclaim space after bulk deletes or updates. Runs on its own
    /// connection: SQLite refuses VACUUM inside a transaction, and this
    /// also guarantees the mutating scope has committed first.
    pub fn vacuum(&self) -> StoreResult<()> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("VACUUM")?;
        Ok(())
    }
}

/// Stored values may carry any SQLite storage class (stores written by
/// older tooling bind integers directly); comparison happens on the
/// canonical string form.
fn stringify_sql(value: SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Integer(n) => n.to_string(),
        SqlValue::Real(r) => r.to_string(),
        SqlValue::Text(t) => t,
        SqlValue::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}
