//! Notification state and the reducer that owns every transition.

use chrono::{DateTime, Duration, Utc};

use crate::mvi::{Intent, Reducer, State};
use crate::notification::Notification;

/// Everything the store holds, as observed by consumers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationState {
    /// Visible list, newest insertion first.
    pub notifications: Vec<Notification>,
    /// Cached count of unread entries in `notifications`.
    pub unread_count: usize,
    /// Server notifications waiting for a refresh, oldest first.
    pub pending_server_notifications: Vec<Notification>,
    pub has_new_notifications_available: bool,
    pub is_loaded: bool,
    pub last_refresh_time: Option<DateTime<Utc>>,
}

impl State for NotificationState {}

impl NotificationState {
    pub fn find(&self, id: &str) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// True if any entry in either list carries `identifier`.
    pub fn contains_identifier(&self, identifier: &str) -> bool {
        self.all().any(|n| n.identifier() == Some(identifier))
    }

    fn all(&self) -> impl Iterator<Item = &Notification> {
        self.notifications
            .iter()
            .chain(self.pending_server_notifications.iter())
    }

    fn matches(&self, key: &MatchKey, window: Duration) -> bool {
        self.all().any(|n| key.matches(n, window))
    }

    fn recount(&mut self) {
        self.unread_count = count_unread(&self.notifications);
    }
}

pub(crate) fn count_unread(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

/// How a platform-presented notification is compared against known ones.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchKey {
    /// Payload identifier; equal identifiers match.
    Identifier(String),
    /// No identifier: equal titles within the tolerance window match.
    TitleAt { title: String, at: DateTime<Utc> },
}

impl MatchKey {
    fn matches(&self, candidate: &Notification, window: Duration) -> bool {
        match self {
            MatchKey::Identifier(id) => candidate.identifier() == Some(id.as_str()),
            MatchKey::TitleAt { title, at } => {
                candidate.title == *title && (candidate.timestamp - *at).abs() < window
            }
        }
    }
}

/// A notification the platform presented while the store wasn't looking.
#[derive(Debug, Clone, PartialEq)]
pub struct MissedNotification {
    pub key: MatchKey,
    pub record: Notification,
}

#[derive(Debug, Clone)]
pub enum StoreIntent {
    /// Initial population, from a snapshot or the seed list.
    Loaded {
        notifications: Vec<Notification>,
        at: DateTime<Utc>,
    },
    Add(Notification),
    /// Stage a programmed arrival unless its identifier is already known.
    AddProgrammed(Notification),
    /// Stage a fabricated server notification.
    StageServer(Notification),
    MarkAsRead(String),
    MarkAllAsRead,
    Delete(String),
    ClearAll,
    ImportMissed {
        missed: Vec<MissedNotification>,
        window: Duration,
    },
    /// Raise the availability flag if pending entries are waiting.
    CheckForNew,
    Refresh { at: DateTime<Utc> },
    DismissBanner,
}

impl Intent for StoreIntent {}

pub struct NotificationReducer;

impl Reducer for NotificationReducer {
    type State = NotificationState;
    type Intent = StoreIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            StoreIntent::Loaded { notifications, at } => {
                if state.is_loaded {
                    return state;
                }
                state.notifications = notifications;
                state.recount();
                state.is_loaded = true;
                state.last_refresh_time = Some(at);
            }
            StoreIntent::Add(notification) => {
                if !notification.is_read {
                    state.unread_count += 1;
                }
                state.notifications.insert(0, notification);
            }
            StoreIntent::AddProgrammed(notification) => {
                let duplicate = notification
                    .identifier()
                    .is_some_and(|id| state.contains_identifier(id));
                if !duplicate {
                    stage(&mut state, notification);
                }
            }
            StoreIntent::StageServer(notification) => stage(&mut state, notification),
            StoreIntent::MarkAsRead(id) => {
                if let Some(entry) = state
                    .notifications
                    .iter_mut()
                    .find(|n| n.id == id && !n.is_read)
                {
                    *entry = Notification {
                        is_read: true,
                        ..entry.clone()
                    };
                    state.unread_count = state.unread_count.saturating_sub(1);
                }
            }
            StoreIntent::MarkAllAsRead => {
                state.notifications = state
                    .notifications
                    .into_iter()
                    .map(|n| Notification { is_read: true, ..n })
                    .collect();
                state.unread_count = 0;
            }
            StoreIntent::Delete(id) => {
                state.notifications.retain(|n| n.id != id);
                state.recount();
            }
            StoreIntent::ClearAll => {
                state.notifications.clear();
                state.unread_count = 0;
            }
            StoreIntent::ImportMissed { missed, window } => {
                for MissedNotification { key, record } in missed {
                    // Earlier imports from the same pass count as known too.
                    if state.matches(&key, window) {
                        continue;
                    }
                    state.notifications.insert(0, record);
                    state.unread_count += 1;
                }
            }
            StoreIntent::CheckForNew => {
                if !state.pending_server_notifications.is_empty() {
                    state.has_new_notifications_available = true;
                }
            }
            StoreIntent::Refresh { at } => {
                let promoted = std::mem::take(&mut state.pending_server_notifications);
                state.unread_count += promoted.len();
                if !promoted.is_empty() {
                    let rest = std::mem::take(&mut state.notifications);
                    state.notifications = promoted.into_iter().chain(rest).collect();
                }
                state.has_new_notifications_available = false;
                state.last_refresh_time = Some(at);
            }
            StoreIntent::DismissBanner => {
                state.has_new_notifications_available = false;
            }
        }
        state
    }
}

fn stage(state: &mut NotificationState, notification: Notification) {
    state.pending_server_notifications.push(Notification {
        is_read: false,
        ..notification
    });
    state.has_new_notifications_available = true;
}
