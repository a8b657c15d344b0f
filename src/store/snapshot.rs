//! Save snapshots and their portable external representation.
//!
//! The serialized form (also the export file format) is a JSON object with
//! camelCase fields: `id`, `gameVersion`, `timestamp` (RFC 3339), and an
//! opaque `payload`. Snapshots are immutable once written except for full
//! replacement under the same id.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted, versioned record of game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    /// Unique, lexicographically creation-ordered identifier.
    pub id: String,
    pub game_version: String,
    pub timestamp: DateTime<Utc>,
    /// Opaque, capability-specific state. Imports may omit it.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl SaveSnapshot {
    /// Create a snapshot with a freshly minted id and the current instant.
    pub fn new(game_version: &str, payload: serde_json::Value) -> Self {
        let timestamp = Utc::now();
        Self {
            id: mint_id(game_version, timestamp),
            game_version: game_version.to_string(),
            timestamp,
            payload,
        }
    }

    /// Re-key with a fresh id, keeping version, timestamp, and payload.
    /// Imported snapshots go through this so they never collide with (or
    /// silently overwrite) local ones.
    pub fn with_fresh_id(mut self) -> Self {
        self.id = mint_id(&self.game_version, Utc::now());
        self
    }
}

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Mint a snapshot id from the game version and a creation instant:
/// `<version>-<zero-padded millis>-<sequence>-<random suffix>`. The padded
/// millis and process-local sequence make id order embed creation order;
/// the random suffix keeps ids unique across processes without
/// coordination.
pub fn mint_id(game_version: &str, at: DateTime<Utc>) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{game_version}-{:016}-{seq:06}-{}",
        at.timestamp_millis().max(0),
        &suffix[..8]
    )
}
