//! # Save State Store
//!
//! Persistence façade over a keyed record collection: create snapshots,
//! fetch the most recent one for a game version, and serialize/deserialize
//! snapshots for export and import.
//!
//! The store never deletes anything automatically, and a `save` never
//! overwrites an existing snapshot: every write gets a freshly minted id.
//! "Most recent" is deterministic: latest timestamp, ties broken by id
//! ordering (which embeds creation order).

pub mod backend;
pub mod snapshot;

use std::fmt;
use std::io;
use std::sync::Arc;

use log::{debug, info};

pub use backend::{JsonFileStore, RecordStore};
pub use snapshot::SaveSnapshot;

/// Errors from save/load/export/import operations. None of these corrupt
/// state; each is reported to the user at the operation boundary.
#[derive(Debug)]
pub enum StoreError {
    /// The persistence capability was never successfully acquired.
    /// Save/load/export/import stay disabled for the whole session.
    Unavailable,
    /// The operation requires a running session.
    NotRunning,
    /// No snapshot exists for the requested game version.
    NotFound(String),
    /// An import (or a stored collection) is missing required fields or is
    /// not valid JSON.
    InvalidFormat(String),
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "save storage is unavailable"),
            StoreError::NotRunning => write!(f, "no game is running"),
            StoreError::NotFound(version) => {
                write!(f, "no saved game for version {version}")
            }
            StoreError::InvalidFormat(msg) => write!(f, "invalid save data: {msg}"),
            StoreError::Io(e) => write!(f, "save storage I/O error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Collection name all snapshots live in.
const COLLECTION: &str = "saves";

/// The save state store. Holds the persistence capability if acquisition
/// succeeded; otherwise every operation fails `Unavailable` (non-fatal to
/// gameplay).
pub struct SaveStore {
    backend: Option<Arc<dyn RecordStore>>,
}

impl SaveStore {
    pub fn new(backend: Arc<dyn RecordStore>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A store whose persistence capability could not be acquired.
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> Result<&Arc<dyn RecordStore>, StoreError> {
        self.backend.as_ref().ok_or(StoreError::Unavailable)
    }

    /// Write a new snapshot under a fresh id. Never overwrites.
    pub async fn save(
        &self,
        game_version: &str,
        payload: serde_json::Value,
    ) -> Result<SaveSnapshot, StoreError> {
        let backend = self.backend()?;
        let snapshot = SaveSnapshot::new(game_version, payload);
        backend.put_record(COLLECTION, snapshot.clone()).await?;
        info!("Saved snapshot {} for {}", snapshot.id, game_version);
        Ok(snapshot)
    }

    /// The snapshot for `game_version` with the latest timestamp (ties
    /// broken by id order).
    pub async fn load_most_recent(&self, game_version: &str) -> Result<SaveSnapshot, StoreError> {
        let backend = self.backend()?;
        let all = backend.get_all_records(COLLECTION).await?;
        let found = all
            .into_iter()
            .filter(|s| s.game_version == game_version)
            .max_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.id.cmp(&b.id))
            });
        match found {
            Some(snapshot) => {
                debug!("Most recent snapshot for {game_version}: {}", snapshot.id);
                Ok(snapshot)
            }
            None => Err(StoreError::NotFound(game_version.to_string())),
        }
    }

    /// Serialize the most recent snapshot for the version, all fields
    /// verbatim, for the user to extract outside the system.
    pub async fn export_most_recent(&self, game_version: &str) -> Result<String, StoreError> {
        let snapshot = self.load_most_recent(game_version).await?;
        serde_json::to_string_pretty(&snapshot).map_err(|e| StoreError::InvalidFormat(e.to_string()))
    }

    /// Import an external representation. Required fields: `id`,
    /// `gameVersion`, `timestamp`; `payload` defaults to null. The stored
    /// snapshot gets a fresh id so imports never collide with local saves.
    pub async fn import(&self, serialized: &str) -> Result<SaveSnapshot, StoreError> {
        let backend = self.backend()?;
        let parsed: SaveSnapshot = serde_json::from_str(serialized)
            .map_err(|e| StoreError::InvalidFormat(e.to_string()))?;
        let snapshot = parsed.with_fresh_id();
        backend.put_record(COLLECTION, snapshot.clone()).await?;
        info!(
            "Imported snapshot as {} for {}",
            snapshot.id, snapshot.game_version
        );
        Ok(snapshot)
    }
}
