//! Snapshot persistence for the visible notification list.
//!
//! The store only ever saves, loads or clears a whole snapshot. Backends
//! treat the serialized snapshot as an opaque blob.

mod file;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::notification::Notification;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

/// Errors raised by snapshot backends.
///
/// The store logs and discards these; they never reach its callers.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to access snapshot file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Snapshot backend unavailable: {0}")]
    Unavailable(String),
}

/// Persisted form of the visible list.
///
/// Timestamps serialize as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

impl Snapshot {
    pub fn encode(&self) -> Result<String, PersistenceError> {
        serde_json::to_string(self).map_err(PersistenceError::Encode)
    }

    pub fn decode(raw: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(raw).map_err(PersistenceError::Decode)
    }
}

/// Blob storage for snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Overwrite the stored snapshot.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    /// Last saved snapshot, or `None` if nothing was ever saved.
    async fn load(&self) -> Result<Option<Snapshot>, PersistenceError>;

    /// Remove the stored snapshot entirely.
    async fn clear(&self) -> Result<(), PersistenceError>;

    async fn has_snapshot(&self) -> Result<bool, PersistenceError> {
        Ok(self.load().await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::fixtures;
    use chrono::Utc;

    #[test]
    fn test_snapshot_wire_shape() {
        let notifications = fixtures::seed(Utc::now());
        let snapshot = Snapshot {
            unread_count: 2,
            notifications,
        };

        let value: serde_json::Value = serde_json::from_str(&snapshot.encode().unwrap()).unwrap();
        assert_eq!(value["unreadCount"], 2);
        assert_eq!(value["notifications"].as_array().unwrap().len(), 4);
        assert!(value["notifications"][0]["timestamp"].is_string());
    }

    #[test]
    fn test_snapshot_decode_restores_timestamps() {
        let notifications = fixtures::seed(Utc::now());
        let snapshot = Snapshot {
            unread_count: 2,
            notifications,
        };

        let decoded = Snapshot::decode(&snapshot.encode().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            Snapshot::decode("{ not json"),
            Err(PersistenceError::Decode(_))
        ));
    }
}
