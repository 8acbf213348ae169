//! lexidb - wordlists backed by an SQLite triple store
//!
//! A wordlist is a tabular dataset of linguistic entries: rows keyed by a
//! positive integer id, named columns such as DOCULECT, CONCEPT, or IPA.
//! On disk each table is a flat relation of (id, column, value) triples;
//! in memory it is an ordered header plus rows. The synchronization engine
//! reconciles the two, writing only the deltas, auditing every changed
//! cell, and deleting rows marked for removal.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use lexidb::{CellValue, LexiDb, SyncIgnore, TableName};
//!
//! let mut raw: BTreeMap<i64, Vec<CellValue>> = BTreeMap::new();
//! raw.insert(0, vec!["ID".into(), "DOCULECT".into(), "CONCEPT".into()]);
//! raw.insert(1, vec!["German".into(), "hand".into()]);
//!
//! let mut db = LexiDb::from_rows(raw, "words.sqlite3", TableName::new("words")?)?;
//! db.create(&SyncIgnore::none())?;
//!
//! db.wordlist_mut().set(1, "CONCEPT", "hand/arm".into())?;
//! let modified = db.update(&SyncIgnore::none())?;
//! assert_eq!(modified, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

pub mod db;
pub mod schema;
pub mod store;
pub mod triples;
pub mod value;
pub mod wordlist;

pub use db::{DbError, DbResult, LexiDb};
pub use schema::{ColumnDef, ColumnType, Header, SchemaError};
pub use store::{
    AuditRecord, InvalidTableNameError, StoreError, StoreResult, StoreScope, SyncIgnore,
    TableName, TripleStore,
};
pub use triples::{rows_to_triples, triples_to_rows, Triple, TriplesError};
pub use value::CellValue;
pub use wordlist::{RowTable, TabularSource, Wordlist, WordlistError, WordlistResult};
