//! End-to-end synchronization flows against a real SQLite file.

use std::collections::BTreeMap;

use tempfile::TempDir;

use lexidb::{
    CellValue, LexiDb, SyncIgnore, TableName, Triple, TripleStore, Wordlist,
};

fn spanish_hand() -> BTreeMap<i64, Vec<CellValue>> {
    let mut raw: BTreeMap<i64, Vec<CellValue>> = BTreeMap::new();
    raw.insert(
        0,
        vec!["ID".into(), "DOCULECT".into(), "CONCEPT".into(), "X".into()],
    );
    raw.insert(
        1,
        vec![
            "Spanish".into(),
            "hand".into(),
            CellValue::Seq(vec![CellValue::Int(1), CellValue::Int(2)]),
        ],
    );
    raw
}

#[test]
fn test_sequence_cell_flattens_and_audits_across_syncs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.sqlite3");
    let table = TableName::new("t").unwrap();
    let mut db = LexiDb::from_rows(spanish_hand(), &path, table.clone()).unwrap();

    db.update(&SyncIgnore::none()).unwrap();
    let store = TripleStore::new(&path);
    let triples = store.read_triples(&table).unwrap();
    assert!(triples.contains(&Triple::new(1, "X", "1 2")));

    let x_audit: Vec<_> = store
        .read_audit(&table)
        .unwrap()
        .into_iter()
        .filter(|rec| rec.column == "X")
        .collect();
    assert_eq!(x_audit.len(), 1);
    assert_eq!(x_audit[0].previous, "");

    db.wordlist_mut().set(1, "X", "xyz".into()).unwrap();
    assert_eq!(db.update(&SyncIgnore::none()).unwrap(), 1);

    let triples = store.read_triples(&table).unwrap();
    assert!(triples.contains(&Triple::new(1, "X", "xyz")));
    assert!(!triples.iter().any(|t| t.column == "X" && t.value == "1 2"));

    let x_audit: Vec<_> = store
        .read_audit(&table)
        .unwrap()
        .into_iter()
        .filter(|rec| rec.column == "X")
        .collect();
    assert_eq!(x_audit.len(), 2);
    assert_eq!(x_audit[1].previous, "1 2");
}

#[test]
fn test_update_is_idempotent_without_edits() {
    let dir = TempDir::new().unwrap();
    let db = LexiDb::from_rows(
        spanish_hand(),
        dir.path().join("t.sqlite3"),
        TableName::new("t").unwrap(),
    )
    .unwrap();

    assert!(db.update(&SyncIgnore::none()).unwrap() > 0);
    assert_eq!(db.update(&SyncIgnore::none()).unwrap(), 0);
}

fn germanic() -> BTreeMap<i64, Vec<CellValue>> {
    let mut raw: BTreeMap<i64, Vec<CellValue>> = BTreeMap::new();
    raw.insert(0, vec!["ID".into(), "DOCULECT".into(), "CONCEPT".into()]);
    raw.insert(1, vec!["German".into(), "hand".into()]);
    raw.insert(2, vec!["German".into(), "woman".into()]);
    raw.insert(3, vec!["English".into(), "hand".into()]);
    raw.insert(4, vec!["Dutch".into(), "hand".into()]);
    raw
}

#[test]
fn test_blacklisted_doculect_disappears_from_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("germanic.sqlite3");
    let table = TableName::new("germanic").unwrap();
    let mut db = LexiDb::from_rows(germanic(), &path, table.clone()).unwrap();
    db.create(&SyncIgnore::none()).unwrap();

    let store = TripleStore::new(&path);
    let before = store.read_triples(&table).unwrap().len();
    assert_eq!(before, 8);

    let removed = db
        .wordlist_mut()
        .remove_values(&CellValue::Text("German".into()), "DOCULECT")
        .unwrap();
    assert_eq!(removed.len(), 2);

    db.update(&SyncIgnore::none()).unwrap();
    let after = store.read_triples(&table).unwrap();
    // 2 rows x 2 stored cells are gone, nothing else moved
    assert_eq!(after.len(), before - 4);
    assert!(!after.iter().any(|t| t.id == 1 || t.id == 2));

    // re-running changes nothing, deletes of absent ids are no-ops
    assert_eq!(db.update(&SyncIgnore::none()).unwrap(), 0);
    assert_eq!(store.read_triples(&table).unwrap().len(), before - 4);
}

#[test]
fn test_create_recovers_from_manual_damage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.sqlite3");
    let table = TableName::new("t").unwrap();
    let db = LexiDb::from_rows(germanic(), &path, table.clone()).unwrap();
    db.create(&SyncIgnore::none()).unwrap();

    // corrupt the table behind the engine's back
    let store = TripleStore::new(&path);
    let scope = store.scope().unwrap();
    scope.execute("DELETE FROM t WHERE ID = 1", []).unwrap();
    scope
        .execute(
            "INSERT INTO t VALUES (?1, ?2, ?3)",
            rusqlite::params![500, "CONCEPT", "ghost"],
        )
        .unwrap();
    scope.commit().unwrap();

    db.create(&SyncIgnore::none()).unwrap();
    let triples = store.read_triples(&table).unwrap();
    assert_eq!(triples.len(), 8);
    assert!(triples.contains(&Triple::new(1, "DOCULECT", "German")));
    assert!(!triples.iter().any(|t| t.id == 500));
}

#[test]
fn test_reload_roundtrip_through_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.sqlite3");
    let table = TableName::new("t").unwrap();
    let db = LexiDb::from_rows(germanic(), &path, table.clone()).unwrap();
    db.create(&SyncIgnore::none()).unwrap();

    let reloaded = LexiDb::from_store(&path, table).unwrap();
    let original: &Wordlist = db.wordlist();
    assert_eq!(
        reloaded.wordlist().row_ids().collect::<Vec<_>>(),
        original.row_ids().collect::<Vec<_>>()
    );
    for (id, _) in original.iter() {
        for name in original.header().names() {
            assert_eq!(
                reloaded.wordlist().get(id, name).unwrap().canonical(),
                original.get(id, name).unwrap().canonical()
            );
        }
    }
}
