//! The persistence capability: keyed put/get-all within named collections.
//!
//! Production backend is one JSON file per collection under the saves
//! directory, written atomically (write `.tmp`, then `rename()`) for crash
//! safety. Each persistence operation is an independent asynchronous unit
//! of work; snapshot ids are freshly minted per write, so no two writes
//! ever target the same id concurrently.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, warn};

use super::StoreError;
use super::snapshot::SaveSnapshot;

/// Keyed collection storage consumed by the save state store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert the record, replacing any record with the same id in full.
    async fn put_record(&self, collection: &str, record: SaveSnapshot) -> Result<(), StoreError>;

    /// All records in the collection, in unspecified order.
    async fn get_all_records(&self, collection: &str) -> Result<Vec<SaveSnapshot>, StoreError>;
}

/// JSON-file-backed record store. `<dir>/<collection>.json` holds the full
/// record list for that collection.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (creating the directory if needed). A failure here means the
    /// persistence capability is unavailable for the whole session.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(StoreError::Io)?;
        debug!("Record store opened at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    fn read_collection(&self, collection: &str) -> Result<Vec<SaveSnapshot>, StoreError> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&path).map_err(StoreError::Io)?;
        serde_json::from_str(&json).map_err(|e| {
            warn!("Corrupt collection file {}: {e}", path.display());
            StoreError::InvalidFormat(e.to_string())
        })
    }

    /// Atomically write `records` as JSON (via `.tmp` + rename).
    fn write_collection(
        &self,
        collection: &str,
        records: &[SaveSnapshot],
    ) -> Result<(), StoreError> {
        let path = self.collection_path(collection);
        let tmp_path = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::InvalidFormat(e.to_string()))?;
        fs::write(&tmp_path, json).map_err(StoreError::Io)?;
        fs::rename(&tmp_path, &path).map_err(StoreError::Io)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn put_record(&self, collection: &str, record: SaveSnapshot) -> Result<(), StoreError> {
        let mut records = self.read_collection(collection)?;
        records.retain(|r| r.id != record.id);
        debug!(
            "put_record: {} -> {} ({} records)",
            record.id,
            collection,
            records.len() + 1
        );
        records.push(record);
        self.write_collection(collection, &records)
    }

    async fn get_all_records(&self, collection: &str) -> Result<Vec<SaveSnapshot>, StoreError> {
        self.read_collection(collection)
    }
}
