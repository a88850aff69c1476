use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::{DeliveryAdapter, InboundNotification};
use crate::notification::{Notification, Payload};
use crate::store::NotificationStore;

/// Where an inbound notification ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Added straight to the visible list.
    Visible(Notification),
    /// Staged in the pending list until the next refresh.
    Pending(Notification),
    /// Programmed notification already known by identifier.
    Duplicate,
}

/// Route one inbound notification into the store.
///
/// Programmed notifications are staged; everything else is shown directly.
pub async fn route_inbound(store: &NotificationStore, inbound: InboundNotification) -> Routed {
    if inbound.data.is_programmed {
        let mut new = inbound.into_new_notification();
        new.data = Payload {
            original_timestamp: Some(Utc::now().timestamp_millis()),
            ..new.data
        };
        match store.add_programmed_notification(new) {
            Some(notification) => Routed::Pending(notification),
            None => Routed::Duplicate,
        }
    } else {
        Routed::Visible(store.add_notification(inbound.into_new_notification()).await)
    }
}

/// Connects a delivery adapter's subscription to a store.
///
/// The listener runs until the bridge is detached or dropped, or until the
/// adapter closes its channel.
pub struct DeliveryBridge {
    store: NotificationStore,
    listener: JoinHandle<()>,
}

impl DeliveryBridge {
    pub fn attach(store: NotificationStore, adapter: &dyn DeliveryAdapter) -> Self {
        let mut inbound = adapter.subscribe();
        let target = store.clone();

        let listener = tokio::spawn(async move {
            loop {
                match inbound.recv().await {
                    Ok(notification) => {
                        let routed = route_inbound(&target, notification).await;
                        tracing::debug!(routed = routed_label(&routed), "Inbound notification routed");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Delivery listener lagged, notifications dropped");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Delivery channel closed, listener exiting");
                        break;
                    }
                }
            }
        });

        Self { store, listener }
    }

    /// The app came back to the foreground: pick up anything the platform
    /// presented meanwhile. Does nothing before the store is loaded.
    pub async fn app_became_active(&self) -> usize {
        if !self.store.is_loaded() {
            return 0;
        }
        self.store.reconcile_missed().await
    }

    pub fn is_listening(&self) -> bool {
        !self.listener.is_finished()
    }

    pub fn detach(self) {
        // Drop aborts the listener.
    }
}

impl Drop for DeliveryBridge {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn routed_label(routed: &Routed) -> &'static str {
    match routed {
        Routed::Visible(_) => "visible",
        Routed::Pending(_) => "pending",
        Routed::Duplicate => "duplicate",
    }
}
