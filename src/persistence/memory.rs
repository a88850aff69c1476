use async_trait::async_trait;
use parking_lot::Mutex;

use super::{PersistenceError, Snapshot, SnapshotStore};

/// Keeps the encoded snapshot in memory.
///
/// Goes through the same JSON encoding as the file store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    blob: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a snapshot already stored.
    pub fn with_snapshot(snapshot: &Snapshot) -> Result<Self, PersistenceError> {
        Ok(Self {
            blob: Mutex::new(Some(snapshot.encode()?)),
        })
    }

    /// The raw stored blob, if any.
    pub fn raw(&self) -> Option<String> {
        self.blob.lock().clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let raw = snapshot.encode()?;
        *self.blob.lock() = Some(raw);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        let raw = self.blob.lock().clone();
        raw.map(|raw| Snapshot::decode(&raw)).transpose()
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        *self.blob.lock() = None;
        Ok(())
    }

    async fn has_snapshot(&self) -> Result<bool, PersistenceError> {
        Ok(self.blob.lock().is_some())
    }
}
