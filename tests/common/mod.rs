//! Shared test utilities and fake adapters.

#![allow(dead_code, unused_imports)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notistore::delivery::{
    DeliveryAdapter, DeliveryError, InboundNotification, PresentedNotification,
};
use notistore::notification::{NewNotification, NotificationType, Payload, Priority};
use notistore::persistence::{MemorySnapshotStore, PersistenceError, Snapshot, SnapshotStore};
use notistore::store::{NotificationStore, StorePolicy, StoreView};
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Policy that never starts anything in the background on its own.
pub fn quiet_policy() -> StorePolicy {
    StorePolicy {
        reconcile_delay: Duration::from_secs(3600),
        auto_start_timers: false,
        ..StorePolicy::default()
    }
}

/// Store backed by an in-memory snapshot, plus the snapshot store itself.
pub fn memory_store() -> (NotificationStore, Arc<MemorySnapshotStore>) {
    let snapshots = Arc::new(MemorySnapshotStore::new());
    let store = NotificationStore::new(quiet_policy()).with_persistence(snapshots.clone());
    (store, snapshots)
}

pub fn decode(snapshots: &MemorySnapshotStore) -> Option<Snapshot> {
    snapshots
        .raw()
        .map(|raw| Snapshot::decode(&raw).expect("stored snapshot decodes"))
}

pub fn input(title: &str) -> NewNotification {
    NewNotification::new(title, "body", NotificationType::System, Priority::Medium)
}

pub fn with_identifier(title: &str, identifier: &str) -> NewNotification {
    input(title).with_data(Payload {
        identifier: Some(identifier.to_string()),
        ..Payload::default()
    })
}

pub fn presented(title: &str, identifier: Option<&str>, date: DateTime<Utc>) -> PresentedNotification {
    PresentedNotification {
        request_identifier: uuid::Uuid::new_v4().to_string(),
        title: Some(title.to_string()),
        body: Some("presented body".to_string()),
        data: Payload {
            identifier: identifier.map(str::to_string),
            ..Payload::default()
        },
        date,
    }
}

/// Unread count matches the list.
pub fn assert_unread_invariant(view: &StoreView) {
    let actual = view.notifications.iter().filter(|n| !n.is_read).count();
    assert_eq!(view.unread_count, actual, "unread count out of sync");
}

/// Wait until the store state satisfies `condition`.
pub async fn wait_for(store: &NotificationStore, condition: impl FnMut(&StoreView) -> bool) -> StoreView {
    let mut updates = store.subscribe();
    let view = tokio::time::timeout(Duration::from_secs(5), updates.wait_for(condition))
        .await
        .expect("Timed out waiting for store state")
        .expect("Store dropped while waiting")
        .clone();
    view
}

/// Snapshot store where every call fails.
#[derive(Default)]
pub struct FailingSnapshotStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SnapshotStore for FailingSnapshotStore {
    async fn save(&self, _snapshot: &Snapshot) -> Result<(), PersistenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PersistenceError::Unavailable("disk full".to_string()))
    }

    async fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PersistenceError::Unavailable("disk unreadable".to_string()))
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PersistenceError::Unavailable("disk read-only".to_string()))
    }
}

/// Delivery adapter with a scripted tray and independent failure switches.
pub struct FakeDelivery {
    sender: broadcast::Sender<InboundNotification>,
    pub tray: Mutex<Vec<PresentedNotification>>,
    pub fail_query: AtomicBool,
    pub fail_dismiss: AtomicBool,
    pub dismiss_calls: AtomicUsize,
}

impl FakeDelivery {
    pub fn new(tray: Vec<PresentedNotification>) -> Arc<Self> {
        let (sender, _) = broadcast::channel(16);
        Arc::new(Self {
            sender,
            tray: Mutex::new(tray),
            fail_query: AtomicBool::new(false),
            fail_dismiss: AtomicBool::new(false),
            dismiss_calls: AtomicUsize::new(0),
        })
    }

    pub fn dismissed(&self) -> usize {
        self.dismiss_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryAdapter for FakeDelivery {
    fn subscribe(&self) -> broadcast::Receiver<InboundNotification> {
        self.sender.subscribe()
    }

    async fn presented(&self) -> Result<Vec<PresentedNotification>, DeliveryError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(DeliveryError::Unavailable("query refused".to_string()));
        }
        Ok(self.tray.lock().clone())
    }

    async fn dismiss_all(&self) -> Result<(), DeliveryError> {
        self.dismiss_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_dismiss.load(Ordering::SeqCst) {
            return Err(DeliveryError::Closed);
        }
        self.tray.lock().clear();
        Ok(())
    }
}
