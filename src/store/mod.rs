//! The notification store.
//!
//! [`NotificationStore`] is a cloneable handle over shared state. Every
//! mutation goes through [`NotificationReducer`] under one write lock, and
//! the resulting state is published on a watch channel. Persistence and
//! platform queries run outside the lock and their failures are logged and
//! swallowed; no store operation returns an error.

mod state;
mod timers;

use std::fmt::Display;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::delivery::{DeliveryAdapter, InboundNotification, PresentedNotification};
use crate::mvi::Reducer;
use crate::notification::fixtures::{self, DEFAULT_TITLE};
use crate::notification::{NewNotification, Notification};
use crate::persistence::{Snapshot, SnapshotStore};

pub use state::{MatchKey, MissedNotification, NotificationReducer, NotificationState, StoreIntent};

use state::count_unread;
use timers::PeriodicTask;

/// Read-only copy of the store state handed to observers.
pub type StoreView = NotificationState;

/// Timing knobs for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StorePolicy {
    /// Period of the "new notifications available" check.
    pub auto_check_interval: Duration,
    /// Period of the simulated server notification generator.
    pub auto_generate_interval: Duration,
    /// Delay between `load()` and the startup reconciliation pass.
    pub reconcile_delay: Duration,
    /// Title matches closer than this count as the same notification.
    pub dedup_window: Duration,
    /// Start both timers after the startup reconciliation pass.
    pub auto_start_timers: bool,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            auto_check_interval: Duration::from_secs(10),
            auto_generate_interval: Duration::from_secs(15),
            reconcile_delay: Duration::from_millis(1000),
            dedup_window: Duration::from_millis(3000),
            auto_start_timers: true,
        }
    }
}

#[derive(Default)]
struct Tasks {
    auto_check: Option<PeriodicTask>,
    auto_generate: Option<PeriodicTask>,
    startup: Option<JoinHandle<()>>,
}

impl Drop for Tasks {
    fn drop(&mut self) {
        if let Some(startup) = self.startup.take() {
            startup.abort();
        }
    }
}

struct Inner {
    state: RwLock<NotificationState>,
    policy: StorePolicy,
    persistence: Option<Arc<dyn SnapshotStore>>,
    delivery: Option<Arc<dyn DeliveryAdapter>>,
    tasks: Mutex<Tasks>,
    updates: watch::Sender<NotificationState>,
}

impl Inner {
    fn build(
        state: NotificationState,
        policy: StorePolicy,
        persistence: Option<Arc<dyn SnapshotStore>>,
        delivery: Option<Arc<dyn DeliveryAdapter>>,
    ) -> Arc<Self> {
        let (updates, _) = watch::channel(state.clone());
        Arc::new(Self {
            state: RwLock::new(state),
            policy,
            persistence,
            delivery,
            tasks: Mutex::new(Tasks::default()),
            updates,
        })
    }
}

/// Shared handle to the notification store.
///
/// Clones share the same state. Background tasks only hold a weak
/// reference, so dropping the last handle stops them.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<Inner>,
}

impl NotificationStore {
    pub fn new(policy: StorePolicy) -> Self {
        Self {
            inner: Inner::build(NotificationState::default(), policy, None, None),
        }
    }

    /// Attach a snapshot backend. Meant for construction time: handles
    /// cloned earlier keep pointing at the store without it.
    pub fn with_persistence(self, persistence: Arc<dyn SnapshotStore>) -> Self {
        let state = self.view();
        let delivery = self.inner.delivery.clone();
        Self {
            inner: Inner::build(state, self.inner.policy.clone(), Some(persistence), delivery),
        }
    }

    /// Attach a delivery adapter, used for reconciliation. Same caveat as
    /// [`NotificationStore::with_persistence`].
    pub fn with_delivery(self, delivery: Arc<dyn DeliveryAdapter>) -> Self {
        let state = self.view();
        let persistence = self.inner.persistence.clone();
        Self {
            inner: Inner::build(state, self.inner.policy.clone(), persistence, Some(delivery)),
        }
    }

    pub fn policy(&self) -> &StorePolicy {
        &self.inner.policy
    }

    pub fn view(&self) -> StoreView {
        self.inner.state.read().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.state.read().notifications.clone()
    }

    pub fn pending(&self) -> Vec<Notification> {
        self.inner.state.read().pending_server_notifications.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.inner.state.read().unread_count
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.state.read().is_loaded
    }

    pub fn has_new_notifications_available(&self) -> bool {
        self.inner.state.read().has_new_notifications_available
    }

    pub fn last_refresh_time(&self) -> Option<DateTime<Utc>> {
        self.inner.state.read().last_refresh_time
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.inner.state.read().find(id).cloned()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreView> {
        self.inner.updates.subscribe()
    }

    pub fn is_auto_checking(&self) -> bool {
        is_running(&self.inner.tasks.lock().auto_check)
    }

    pub fn is_auto_generating(&self) -> bool {
        is_running(&self.inner.tasks.lock().auto_generate)
    }


    /// Populate the store from the snapshot backend, or from the seed list
    /// when there is no snapshot. Does nothing once loaded.
    ///
    /// Schedules the startup reconciliation pass (and the timers, if the
    /// policy says so) without waiting for it.
    pub async fn load(&self) {
        if self.is_loaded() {
            return;
        }

        let restored = match &self.inner.persistence {
            Some(persistence) => swallow("load snapshot", persistence.load().await).flatten(),
            None => None,
        };

        let now = Utc::now();
        let (notifications, seeded) = match restored {
            Some(snapshot) => {
                let actual = count_unread(&snapshot.notifications);
                if actual != snapshot.unread_count {
                    tracing::warn!(
                        stored = snapshot.unread_count,
                        actual,
                        "Snapshot unread count out of sync, recomputed"
                    );
                }
                (snapshot.notifications, false)
            }
            None => (fixtures::seed(now), true),
        };

        let (before, after) = self.dispatch(StoreIntent::Loaded {
            notifications,
            at: now,
        });
        if before.is_loaded {
            // Another caller got there first.
            return;
        }

        tracing::info!(
            count = after.notifications.len(),
            unread = after.unread_count,
            seeded,
            "Notification store loaded"
        );

        if seeded {
            self.persist().await;
        }
        self.schedule_startup();
    }

    fn schedule_startup(&self) {
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.policy.reconcile_delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(store) = upgrade(&weak) else {
                return;
            };
            store.reconcile_missed().await;
            if store.inner.policy.auto_start_timers {
                store.start_auto_checking();
                store.start_auto_notifications();
            }
        });

        if let Some(previous) = self.inner.tasks.lock().startup.replace(handle) {
            previous.abort();
        }
    }

    /// Stop both timers and cancel a pending startup pass.
    pub fn dispose(&self) {
        self.stop_auto_checking();
        self.stop_auto_notifications();
        if let Some(startup) = self.inner.tasks.lock().startup.take() {
            startup.abort();
        }
        tracing::debug!("Notification store disposed");
    }


    pub async fn add_notification(&self, input: NewNotification) -> Notification {
        let notification = Notification::create(input, Utc::now());
        self.dispatch(StoreIntent::Add(notification.clone()));
        tracing::info!(id = %notification.id, kind = %notification.kind, "Notification added");
        self.persist().await;
        notification
    }

    /// Stage a programmed notification in the pending list.
    ///
    /// Returns `None` when its identifier is already known in either list.
    pub fn add_programmed_notification(&self, input: NewNotification) -> Option<Notification> {
        let timestamp = input.data.backdated_timestamp().unwrap_or_else(Utc::now);
        let notification = Notification::create(input, timestamp);

        let (before, after) = self.dispatch(StoreIntent::AddProgrammed(notification.clone()));
        if after.pending_server_notifications.len() == before.pending_server_notifications.len() {
            tracing::debug!(
                identifier = notification.identifier().unwrap_or_default(),
                "Programmed notification already known, ignored"
            );
            return None;
        }

        tracing::info!(id = %notification.id, "Programmed notification staged");
        Some(notification)
    }

    /// Returns `true` if an unread entry was flipped.
    pub async fn mark_as_read(&self, id: &str) -> bool {
        let (before, after) = self.dispatch(StoreIntent::MarkAsRead(id.to_string()));
        let changed = before.unread_count != after.unread_count;
        if changed {
            tracing::debug!(id, "Notification marked as read");
            self.persist().await;
        }
        changed
    }

    pub async fn mark_all_as_read(&self) {
        let (before, _) = self.dispatch(StoreIntent::MarkAllAsRead);
        tracing::info!(marked = before.unread_count, "All notifications marked as read");
        self.persist().await;
    }

    /// Returns `true` if the entry existed.
    pub async fn delete_notification(&self, id: &str) -> bool {
        let (before, after) = self.dispatch(StoreIntent::Delete(id.to_string()));
        let changed = before.notifications.len() != after.notifications.len();
        if changed {
            tracing::info!(id, "Notification deleted");
            self.persist().await;
        }
        changed
    }

    /// Empty the main list and remove the stored snapshot.
    pub async fn clear_all_notifications(&self) {
        let (before, _) = self.dispatch(StoreIntent::ClearAll);
        tracing::info!(removed = before.notifications.len(), "All notifications cleared");
        if let Some(persistence) = &self.inner.persistence {
            swallow("clear snapshot", persistence.clear().await);
        }
    }

    /// Import notifications the platform presented while nobody was
    /// listening, then ask the platform to dismiss them.
    ///
    /// Returns how many were added.
    pub async fn reconcile_missed(&self) -> usize {
        let Some(delivery) = self.inner.delivery.clone() else {
            return 0;
        };
        let Some(presented) = swallow("query presented notifications", delivery.presented().await)
        else {
            return 0;
        };
        if presented.is_empty() {
            return 0;
        }

        let seen = presented.len();
        let missed = presented.into_iter().map(missed_from_presented).collect();
        let window = chrono::Duration::from_std(self.inner.policy.dedup_window)
            .unwrap_or_else(|_| chrono::Duration::zero());

        let (before, after) = self.dispatch(StoreIntent::ImportMissed { missed, window });
        let added = after.notifications.len() - before.notifications.len();
        tracing::info!(seen, added, "Reconciled presented notifications");

        if added > 0 {
            self.persist().await;
        }
        swallow("dismiss presented notifications", delivery.dismiss_all().await);
        added
    }

    /// Raise the availability flag if pending entries are waiting.
    ///
    /// Returns `true` only when the flag went from down to up.
    pub fn check_for_new_notifications(&self) -> bool {
        let (before, after) = self.dispatch(StoreIntent::CheckForNew);
        let raised = !before.has_new_notifications_available && after.has_new_notifications_available;
        if raised {
            tracing::debug!(
                pending = after.pending_server_notifications.len(),
                "New notifications available"
            );
        }
        raised
    }

    /// Promote every pending entry to the main list.
    pub async fn refresh_notifications(&self) -> usize {
        let (before, _) = self.dispatch(StoreIntent::Refresh { at: Utc::now() });
        let promoted = before.pending_server_notifications.len();
        tracing::info!(promoted, "Notifications refreshed");
        if promoted > 0 {
            self.persist().await;
        }
        promoted
    }

    pub fn dismiss_new_notifications_banner(&self) {
        self.dispatch(StoreIntent::DismissBanner);
    }

    /// Fabricate a random server notification and stage it.
    pub fn simulate_server_notification(&self) -> Notification {
        let input = fixtures::random_server_notification(&mut rand::thread_rng());
        let notification = Notification::create(input, Utc::now());
        self.dispatch(StoreIntent::StageServer(notification.clone()));
        tracing::debug!(id = %notification.id, kind = %notification.kind, "Server notification simulated");
        notification
    }


    pub fn start_auto_checking(&self) {
        let mut tasks = self.inner.tasks.lock();
        if is_running(&tasks.auto_check) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        tasks.auto_check = Some(PeriodicTask::spawn(
            "auto-check",
            self.inner.policy.auto_check_interval,
            move || {
                let store = upgrade(&weak);
                async move {
                    match store {
                        Some(store) => {
                            store.check_for_new_notifications();
                            true
                        }
                        None => false,
                    }
                }
            },
        ));
    }

    pub fn stop_auto_checking(&self) {
        let task = self.inner.tasks.lock().auto_check.take();
        if let Some(task) = task {
            task.stop();
        }
    }

    pub fn start_auto_notifications(&self) {
        let mut tasks = self.inner.tasks.lock();
        if is_running(&tasks.auto_generate) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        tasks.auto_generate = Some(PeriodicTask::spawn(
            "auto-generate",
            self.inner.policy.auto_generate_interval,
            move || {
                let store = upgrade(&weak);
                async move {
                    match store {
                        Some(store) => {
                            store.simulate_server_notification();
                            true
                        }
                        None => false,
                    }
                }
            },
        ));
    }

    pub fn stop_auto_notifications(&self) {
        let task = self.inner.tasks.lock().auto_generate.take();
        if let Some(task) = task {
            task.stop();
        }
    }


    /// Apply one intent atomically and publish the result.
    fn dispatch(&self, intent: StoreIntent) -> (NotificationState, NotificationState) {
        let mut state = self.inner.state.write();
        let before = state.clone();
        let after = NotificationReducer::reduce(before.clone(), intent);
        *state = after.clone();
        if before != after {
            self.inner.updates.send_replace(after.clone());
        }
        (before, after)
    }

    async fn persist(&self) {
        let Some(persistence) = &self.inner.persistence else {
            return;
        };
        let snapshot = {
            let state = self.inner.state.read();
            Snapshot {
                notifications: state.notifications.clone(),
                unread_count: state.unread_count,
            }
        };
        swallow("save snapshot", persistence.save(&snapshot).await);
    }
}

fn upgrade(weak: &Weak<Inner>) -> Option<NotificationStore> {
    weak.upgrade().map(|inner| NotificationStore { inner })
}

fn is_running(task: &Option<PeriodicTask>) -> bool {
    task.as_ref().is_some_and(|task| !task.is_finished())
}

/// Log an adapter failure and carry on.
fn swallow<T, E: Display>(operation: &'static str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(operation, error = %e, "Adapter call failed, continuing");
            None
        }
    }
}

fn missed_from_presented(presented: PresentedNotification) -> MissedNotification {
    let PresentedNotification {
        request_identifier,
        title,
        body,
        mut data,
        date,
    } = presented;

    let key = match &data.identifier {
        Some(identifier) => MatchKey::Identifier(identifier.clone()),
        None => MatchKey::TitleAt {
            title: title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            at: date,
        },
    };
    if data.identifier.is_none() {
        data.identifier = Some(request_identifier);
    }

    let input = InboundNotification { title, body, data }.into_new_notification();
    MissedNotification {
        key,
        record: Notification::create(input, date),
    }
}
