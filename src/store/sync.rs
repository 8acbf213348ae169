//! The synchronization engine: single-pass diff-and-write reconciliation
//! of an in-memory wordlist against its persisted triple table.
//!
//! Synchronizing is idempotent. A second run with no intervening edits
//! finds every triple unchanged and skips it; blacklist deletes re-issued
//! against already-deleted ids are no-ops.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::store::error::StoreResult;
use crate::store::types::TableName;
use crate::store::TripleStore;
use crate::triples::rows_to_triples;
use crate::wordlist::Wordlist;

/// The actor recorded for machine-made modifications in the shared audit
/// table format.
pub const AUDIT_ACTOR: &str = "lingpy";

/// Columns and row ids excluded from synchronization.
#[derive(Debug, Clone, Default)]
pub struct SyncIgnore {
    columns: Vec<String>,
    ids: Vec<i64>,
}

impl SyncIgnore {
    pub fn none() -> Self {
        Self::default()
    }

    /// Exclude columns by name (case-insensitive).
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| c.as_ref().to_lowercase()));
        self
    }

    /// Exclude whole rows by id.
    pub fn with_ids<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.ids.extend(ids);
        self
    }

    fn skips_column(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.columns.iter().any(|c| *c == name)
    }

    fn skips_id(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }
}

/// One appended audit row: the state of a cell *before* a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub table: String,
    pub id: i64,
    pub column: String,
    pub previous: String,
    pub timestamp: i64,
    pub actor: String,
}

impl TripleStore {
    /// Reconcile `wordlist` against the persisted triples of `table`,
    /// writing only the deltas.
    ///
    /// Per changed cell this appends one audit record holding the old
    /// value (empty string for inserts) and applies the write as UPDATE
    /// when the (id, column) pair pre-exists, INSERT otherwise. Rows on
    /// the wordlist's blacklist are deleted outright. Returns the number
    /// of modified cells.
    pub fn synchronize(
        &self,
        wordlist: &Wordlist,
        table: &TableName,
        ignore: &SyncIgnore,
    ) -> StoreResult<usize> {
        self.ensure_schema(table)?;
        let scope = self.scope()?;

        let mut reference: HashMap<(i64, String), String> = scope
            .fetch_all(
                &format!("SELECT ID, COL, VAL FROM {table} ORDER BY ID, COL, VAL"),
                [],
                |row| {
                    Ok((
                        (row.get(0)?, row.get(1)?),
                        super::stringify_sql(row.get(2)?),
                    ))
                },
            )?
            .into_iter()
            .collect();

        let mut triples = rows_to_triples(wordlist);
        triples.sort();

        let timestamp = Utc::now().timestamp();
        let mut modified = 0;
        for triple in triples {
            if ignore.skips_column(&triple.column)
                || ignore.skips_id(triple.id)
                || wordlist.blacklist().contains(&triple.id)
            {
                continue;
            }
            let key = (triple.id, triple.column.clone());
            let previous = reference.get(&key);
            let write_sql = match previous {
                // empty values are never newly inserted
                None if triple.value.is_empty() => continue,
                None => format!("INSERT INTO {table} (ID, COL, VAL) VALUES (?1, ?2, ?3)"),
                Some(old) if *old == triple.value => continue,
                Some(_) => format!("UPDATE {table} SET VAL = ?3 WHERE ID = ?1 AND COL = ?2"),
            };
            let old = previous.cloned().unwrap_or_default();
            scope.execute(
                "INSERT INTO backup (FILE, ID, COL, VAL, DATE, USER) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    table.as_str(),
                    triple.id,
                    triple.column,
                    old,
                    timestamp,
                    AUDIT_ACTOR
                ],
            )?;
            scope.execute(
                &write_sql,
                rusqlite::params![triple.id, triple.column, triple.value],
            )?;
            tracing::debug!(
                id = triple.id,
                column = %triple.column,
                value = %triple.value,
                "wrote cell"
            );
            reference.insert(key, triple.value);
            modified += 1;
        }

        for &id in wordlist.blacklist() {
            scope.execute(&format!("DELETE FROM {table} WHERE ID = ?1"), [id])?;
        }

        scope.commit()?;
        self.vacuum()?;
        tracing::info!(
            modified,
            removed = wordlist.blacklist().len(),
            table = %table,
            "synchronized wordlist"
        );
        Ok(modified)
    }

    /// Recreate `table` from scratch: write the blacklist diagnostic log,
    /// clear the table entirely, then synchronize to repopulate it.
    pub fn create(
        &self,
        wordlist: &Wordlist,
        table: &TableName,
        ignore: &SyncIgnore,
    ) -> StoreResult<usize> {
        self.ensure_schema(table)?;
        self.write_blacklist_log(wordlist)?;

        let scope = self.scope()?;
        scope.execute(&format!("DELETE FROM {table}"), [])?;
        scope.commit()?;

        self.synchronize(wordlist, table, ignore)
    }

    /// Audit records for a table, in append order.
    pub fn read_audit(&self, table: &TableName) -> StoreResult<Vec<AuditRecord>> {
        let scope = self.scope()?;
        scope.fetch_all(
            "SELECT FILE, ID, COL, VAL, DATE, USER FROM backup WHERE FILE = ?1 ORDER BY rowid",
            [table.as_str()],
            |row| {
                Ok(AuditRecord {
                    table: row.get(0)?,
                    id: row.get(1)?,
                    column: row.get(2)?,
                    previous: super::stringify_sql(row.get(3)?),
                    timestamp: super::stringify_sql(row.get(4)?).parse().unwrap_or(0),
                    actor: row.get(5)?,
                })
            },
        )
    }

    /// Write the tab-separated diagnostic log of blacklisted rows next to
    /// the database file, named `<timestamp>-blacklist.log`. Returns the
    /// log path.
    fn write_blacklist_log(&self, wordlist: &Wordlist) -> StoreResult<PathBuf> {
        let dir = self
            .path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = format!("{}-blacklist.log", Utc::now().format("%Y-%m-%d-%H%M%S"));
        let path = dir.join(name);

        let mut out = String::from("ID");
        for name in wordlist.header().names() {
            out.push('\t');
            out.push_str(name);
        }
        out.push('\n');
        for &id in wordlist.blacklist() {
            let Ok(row) = wordlist.row(id) else {
                continue;
            };
            out.push_str(&id.to_string());
            for cell in row {
                out.push('\t');
                out.push_str(&cell.canonical());
            }
            out.push('\n');
        }
        fs::write(&path, out)?;
        tracing::info!(path = %path.display(), "wrote blacklist log");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::TempDir;

    use super::*;
    use crate::value::CellValue;

    fn setup() -> (TempDir, TripleStore, TableName) {
        let dir = TempDir::new().unwrap();
        let store = TripleStore::new(dir.path().join("words.sqlite3"));
        let table = TableName::new("words").unwrap();
        (dir, store, table)
    }

    fn sample() -> Wordlist {
        let mut raw: BTreeMap<i64, Vec<CellValue>> = BTreeMap::new();
        raw.insert(
            0,
            vec!["ID".into(), "DOCULECT".into(), "CONCEPT".into(), "IPA".into()],
        );
        raw.insert(1, vec!["German".into(), "hand".into(), "hant".into()]);
        raw.insert(2, vec!["English".into(), "hand".into(), "hænd".into()]);
        Wordlist::from_rows(raw).unwrap()
    }

    fn stored_value(store: &TripleStore, table: &TableName, id: i64, column: &str) -> Option<String> {
        store
            .read_triples(table)
            .unwrap()
            .into_iter()
            .find(|t| t.id == id && t.column == column)
            .map(|t| t.value)
    }

    #[test]
    fn test_insert_records_empty_previous_value() {
        let (_dir, store, table) = setup();
        let wl = sample();
        let modified = store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();
        assert_eq!(modified, 6);

        let audit = store.read_audit(&table).unwrap();
        assert_eq!(audit.len(), 6);
        assert!(audit.iter().all(|rec| rec.previous.is_empty()));
        assert!(audit.iter().all(|rec| rec.actor == AUDIT_ACTOR));
    }

    #[test]
    fn test_update_records_prior_value() {
        let (_dir, store, table) = setup();
        let mut wl = sample();
        store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();

        wl.set(1, "IPA", "hand".into()).unwrap();
        let modified = store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();
        assert_eq!(modified, 1);
        assert_eq!(stored_value(&store, &table, 1, "IPA").unwrap(), "hand");

        let audit = store.read_audit(&table).unwrap();
        let last = audit.last().unwrap();
        assert_eq!(last.previous, "hant");
        assert_eq!(last.column, "IPA");
        assert_eq!(last.id, 1);
    }

    #[test]
    fn test_empty_values_overwrite_but_are_never_inserted() {
        let (_dir, store, table) = setup();
        let mut raw: BTreeMap<i64, Vec<CellValue>> = BTreeMap::new();
        raw.insert(0, vec!["ID".into(), "CONCEPT".into(), "COGID".into()]);
        raw.insert(1, vec!["hand".into(), CellValue::Text(String::new())]);
        let mut wl = Wordlist::from_rows(raw).unwrap();

        // an empty cell with no stored counterpart is skipped outright
        let modified = store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();
        assert_eq!(modified, 1);
        assert!(stored_value(&store, &table, 1, "COGID").is_none());

        // once a real value is stored, empty overwrites it
        wl.set(1, "COGID", CellValue::Int(7)).unwrap();
        store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();
        wl.set(1, "COGID", CellValue::Text(String::new())).unwrap();
        let modified = store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();
        assert_eq!(modified, 1);
        assert_eq!(stored_value(&store, &table, 1, "COGID").unwrap(), "");

        let audit = store.read_audit(&table).unwrap();
        let last = audit.last().unwrap();
        assert_eq!(last.column, "COGID");
        assert_eq!(last.previous, "7");
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let (_dir, store, table) = setup();
        let wl = sample();
        assert!(store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap() > 0);
        assert_eq!(store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap(), 0);
        assert_eq!(store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap(), 0);
    }

    #[test]
    fn test_ignored_columns_and_ids_are_skipped() {
        let (_dir, store, table) = setup();
        let wl = sample();
        let ignore = SyncIgnore::none().with_columns(["ipa"]).with_ids([2]);
        store.synchronize(&wl, &table, &ignore).unwrap();

        assert!(stored_value(&store, &table, 1, "IPA").is_none());
        assert!(stored_value(&store, &table, 2, "DOCULECT").is_none());
        assert_eq!(stored_value(&store, &table, 1, "DOCULECT").unwrap(), "German");
    }

    #[test]
    fn test_blacklisted_rows_are_deleted() {
        let (_dir, store, table) = setup();
        let mut wl = sample();
        store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();

        wl.mark_for_removal(1);
        store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();
        assert!(!store.read_triples(&table).unwrap().iter().any(|t| t.id == 1));

        // the blacklist is sticky, a second run re-deletes harmlessly
        let modified = store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();
        assert_eq!(modified, 0);
        assert!(!store.read_triples(&table).unwrap().iter().any(|t| t.id == 1));
    }

    #[test]
    fn test_create_wipes_then_repopulates() {
        let (_dir, store, table) = setup();
        let wl = sample();
        store.synchronize(&wl, &table, &SyncIgnore::none()).unwrap();

        // seed a stale triple that create() must wipe
        let scope = store.scope().unwrap();
        scope
            .execute(
                "INSERT INTO words VALUES (?1, ?2, ?3)",
                rusqlite::params![99, "CONCEPT", "stale"],
            )
            .unwrap();
        scope.commit().unwrap();

        store.create(&wl, &table, &SyncIgnore::none()).unwrap();
        let triples = store.read_triples(&table).unwrap();
        assert!(!triples.iter().any(|t| t.id == 99));
        assert_eq!(triples.len(), 6);
    }

    #[test]
    fn test_create_writes_blacklist_log() {
        let (dir, store, table) = setup();
        let mut wl = sample();
        wl.mark_for_removal(2);
        store.create(&wl, &table, &SyncIgnore::none()).unwrap();

        let log = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().ends_with("-blacklist.log"))
            .expect("blacklist log written");
        let content = std::fs::read_to_string(log.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "ID\tDOCULECT\tCONCEPT\tIPA");
        assert_eq!(lines.next().unwrap(), "2\tEnglish\thand\thænd");
    }
}
