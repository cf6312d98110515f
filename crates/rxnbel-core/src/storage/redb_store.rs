//! # redb-backed Record Store
//!
//! A disk-backed [`EntityStore`] using the redb embedded database.
//!
//! Records are stored as JSON documents keyed by their numeric id, which
//! keeps every domain field intact for the resolver. A second table indexes
//! reaction-like records so batch conversion can enumerate them without a
//! full scan.
//!
//! Imports are ACID: one write transaction per import call.

use crate::store::{EntityStore, ReactionIndex, reaction_in_species};
use crate::types::{BelError, DbId, Record};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for records: dbId(u64) -> JSON bytes
const RECORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("records");

/// Table for reaction index: dbId(u64) -> schema class
const REACTIONS: TableDefinition<u64, &str> = TableDefinition::new("reactions");

fn io_err(e: impl std::fmt::Display) -> BelError {
    BelError::IoError(e.to_string())
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a record database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BelError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(RECORDS).map_err(io_err)?;
            let _ = write_txn.open_table(REACTIONS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// Insert or replace records. Returns how many were written.
    pub fn import(&self, records: impl IntoIterator<Item = Record>) -> Result<usize, BelError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let mut written = 0usize;
        {
            let mut records_table = write_txn.open_table(RECORDS).map_err(io_err)?;
            let mut reactions_table = write_txn.open_table(REACTIONS).map_err(io_err)?;

            for record in records {
                let bytes = serde_json::to_vec(&record)
                    .map_err(|e| BelError::SerializationError(e.to_string()))?;
                records_table
                    .insert(record.db_id.0, bytes.as_slice())
                    .map_err(io_err)?;
                if record.is_reaction_like() {
                    reactions_table
                        .insert(record.db_id.0, record.schema_class.as_str())
                        .map_err(io_err)?;
                } else {
                    reactions_table.remove(record.db_id.0).map_err(io_err)?;
                }
                written = written.saturating_add(1);
            }
        }
        write_txn.commit().map_err(io_err)?;
        Ok(written)
    }

    /// Total number of stored records.
    pub fn record_count(&self) -> Result<u64, BelError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(RECORDS).map_err(io_err)?;
        table.len().map_err(io_err)
    }

    /// Number of indexed reaction-like records.
    pub fn reaction_count(&self) -> Result<u64, BelError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(REACTIONS).map_err(io_err)?;
        table.len().map_err(io_err)
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), BelError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }
}

impl EntityStore for RedbStore {
    fn get(&self, id: DbId) -> Result<Option<Record>, BelError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(RECORDS).map_err(io_err)?;
        let Some(bytes) = table.get(id.0).map_err(io_err)? else {
            return Ok(None);
        };
        serde_json::from_slice(bytes.value())
            .map(Some)
            .map_err(|e| BelError::SerializationError(format!("record {}: {}", id, e)))
    }
}

impl ReactionIndex for RedbStore {
    fn reaction_ids(&self, species: Option<&str>) -> Result<Vec<DbId>, BelError> {
        let ids: Vec<DbId> = {
            let read_txn = self.db.begin_read().map_err(io_err)?;
            let table = read_txn.open_table(REACTIONS).map_err(io_err)?;
            let mut ids = Vec::new();
            for entry in table.iter().map_err(io_err)? {
                let (key, _) = entry.map_err(io_err)?;
                ids.push(DbId(key.value()));
            }
            ids
        };

        let Some(species) = species else {
            return Ok(ids);
        };

        let mut filtered = Vec::new();
        for id in ids {
            if let Some(record) = self.get(id)? {
                if reaction_in_species(self, &record, species)? {
                    filtered.push(id);
                }
            }
        }
        Ok(filtered)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture() -> Vec<Record> {
        Record::parse_many(
            r#"[
                {"dbId": 10, "schemaClass": "Reaction", "stIdVersion": "R-HSA-10.1", "species": 30},
                {"dbId": 11, "schemaClass": "BlackBoxEvent", "species": 31},
                {"dbId": 20, "className": "Protein", "schemaClass": "EntityWithAccessionedSequence", "name": ["AKT1"]},
                {"dbId": 30, "displayName": "Homo sapiens", "taxId": "9606"},
                {"dbId": 31, "displayName": "Mus musculus", "taxId": "10090"}
            ]"#,
        )
        .expect("fixture")
    }

    #[test]
    fn import_and_get_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let store = RedbStore::open(dir.path().join("records.db")).expect("open");

        assert_eq!(store.import(fixture()).expect("import"), 5);
        assert_eq!(store.record_count().expect("count"), 5);
        assert_eq!(store.reaction_count().expect("count"), 2);

        let protein = store.get(DbId(20)).expect("get").expect("present");
        assert_eq!(protein.class_name, "Protein");
        assert_eq!(protein.first_name(), Some("AKT1"));
        assert!(store.get(DbId(99)).expect("get").is_none());
    }

    #[test]
    fn reaction_ids_filter_by_species() {
        let dir = tempdir().expect("tempdir");
        let store = RedbStore::open(dir.path().join("records.db")).expect("open");
        store.import(fixture()).expect("import");

        assert_eq!(store.reaction_ids(None).expect("ids"), vec![DbId(10), DbId(11)]);
        assert_eq!(
            store.reaction_ids(Some("Mus musculus")).expect("ids"),
            vec![DbId(11)]
        );
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("records.db");
        {
            let store = RedbStore::open(&path).expect("open");
            store.import(fixture()).expect("import");
        }
        let reopened = RedbStore::open(&path).expect("reopen");
        assert_eq!(reopened.record_count().expect("count"), 5);
        assert_eq!(
            reopened.get(DbId(10)).expect("get").map(|r| r.st_id_version),
            Some("R-HSA-10.1".to_string())
        );
    }
}
