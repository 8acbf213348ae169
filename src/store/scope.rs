//! Scoped access to the SQLite database.
//!
//! Every store interaction runs inside a [`StoreScope`]: a connection with
//! an open transaction that commits on [`StoreScope::commit`] and rolls
//! back when dropped without one. Statements execute immediately against
//! the connection, so the rollback is best-effort cleanup, not isolation.

use std::path::Path;

use rusqlite::{Connection, Params};

use crate::store::error::StoreResult;

/// A bounded store acquisition: connection plus open transaction.
pub struct StoreScope {
    conn: Connection,
    committed: bool,
}

impl StoreScope {
    /// Open the database at `path` and begin a transaction.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("BEGIN")?;
        Ok(Self {
            conn,
            committed: false,
        })
    }

    /// Execute a single statement, returning the affected row count.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> StoreResult<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Run a query and collect every result row through `map`.
    pub fn fetch_all<P, F, T>(&self, sql: &str, params: P, mut map: F) -> StoreResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| map(row))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Commit the transaction and release the connection.
    pub fn commit(mut self) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StoreScope {
    fn drop(&mut self) {
        if !self.committed {
            // rollback failures on a dying connection are unreportable
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scope.sqlite3");
        let scope = StoreScope::open(&path).unwrap();
        scope
            .execute("CREATE TABLE t (ID int, COL text, VAL text)", [])
            .unwrap();
        scope.commit().unwrap();
        (dir, path)
    }

    fn count(path: &Path) -> i64 {
        let scope = StoreScope::open(path).unwrap();
        scope
            .fetch_all("SELECT count(*) FROM t", [], |row| row.get(0))
            .unwrap()[0]
    }

    #[test]
    fn test_commit_persists() {
        let (_dir, path) = setup();
        let scope = StoreScope::open(&path).unwrap();
        scope
            .execute(
                "INSERT INTO t VALUES (?1, ?2, ?3)",
                rusqlite::params![1, "DOCULECT", "German"],
            )
            .unwrap();
        scope.commit().unwrap();
        assert_eq!(count(&path), 1);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let (_dir, path) = setup();
        {
            let scope = StoreScope::open(&path).unwrap();
            scope
                .execute(
                    "INSERT INTO t VALUES (?1, ?2, ?3)",
                    rusqlite::params![1, "DOCULECT", "German"],
                )
                .unwrap();
            // dropped here without commit
        }
        assert_eq!(count(&path), 0);
    }
}
