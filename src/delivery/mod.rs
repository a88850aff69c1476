//! Platform notification delivery.
//!
//! The platform pushes inbound notifications through a subscription and can
//! report (and dismiss) the notifications it is currently presenting. The
//! store never hands the adapter mutable access; [`DeliveryBridge`] feeds
//! arrivals in through the store's own operations.

mod bridge;
mod simulated;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::notification::fixtures::{DEFAULT_DESCRIPTION, DEFAULT_TITLE};
use crate::notification::{NewNotification, NotificationType, Payload, Priority};

pub use bridge::{route_inbound, DeliveryBridge, Routed};
pub use simulated::SimulatedPlatform;

#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("Notification platform unavailable: {0}")]
    Unavailable(String),

    #[error("Notification platform closed")]
    Closed,
}

/// A notification as it arrives from the platform.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InboundNotification {
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: Payload,
}

impl InboundNotification {
    /// Fill in defaults for anything the platform left out.
    pub fn into_new_notification(self) -> NewNotification {
        let kind = NotificationType::from_payload(self.data.text("type"));
        let priority = Priority::from_payload(self.data.text("priority"));
        NewNotification {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: self.body.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            kind,
            priority,
            data: self.data,
        }
    }
}

/// A notification currently shown by the platform (tray, lock screen).
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedNotification {
    /// Platform-assigned request identifier.
    pub request_identifier: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: Payload,
    /// When the platform presented it.
    pub date: DateTime<Utc>,
}

#[async_trait]
pub trait DeliveryAdapter: Send + Sync {
    /// New receiver for inbound notifications.
    fn subscribe(&self) -> broadcast::Receiver<InboundNotification>;

    /// Notifications the platform is presenting right now.
    async fn presented(&self) -> Result<Vec<PresentedNotification>, DeliveryError>;

    /// Dismiss everything the platform is presenting.
    async fn dismiss_all(&self) -> Result<(), DeliveryError>;
}
