use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::{DeliveryAdapter, DeliveryError, InboundNotification, PresentedNotification};
use crate::notification::{NotificationType, Payload, Priority};

const CHANNEL_CAPACITY: usize = 64;

/// In-memory stand-in for a device's notification platform.
///
/// Delivered notifications are both broadcast to subscribers and kept in
/// the "tray" until dismissed, like a real device would.
pub struct SimulatedPlatform {
    sender: broadcast::Sender<InboundNotification>,
    tray: Mutex<Vec<PresentedNotification>>,
    failing: AtomicBool,
}

impl SimulatedPlatform {
    pub fn new() -> Arc<Self> {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Arc::new(Self {
            sender,
            tray: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    /// Put a notification in the tray without delivering it, as if it had
    /// arrived while nobody was listening.
    pub fn present(&self, notification: PresentedNotification) {
        self.tray.lock().push(notification);
    }

    /// Deliver a notification to subscribers and present it.
    pub fn deliver(&self, inbound: InboundNotification) -> PresentedNotification {
        let presented = PresentedNotification {
            request_identifier: uuid::Uuid::new_v4().to_string(),
            title: inbound.title.clone(),
            body: inbound.body.clone(),
            data: inbound.data.clone(),
            date: Utc::now(),
        };
        self.tray.lock().push(presented.clone());

        if self.sender.send(inbound).is_err() {
            tracing::debug!("Notification delivered with no subscribers");
        }
        presented
    }

    /// Schedule a programmed notification `delay` from now.
    ///
    /// Returns the identifier carried in the payload, which the store uses
    /// to drop repeat arrivals.
    pub fn schedule_notification(
        self: &Arc<Self>,
        title: impl Into<String>,
        body: impl Into<String>,
        kind: NotificationType,
        priority: Priority,
        delay: Duration,
    ) -> String {
        let identifier = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp_millis();
        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);

        let inbound = InboundNotification {
            title: Some(title.into()),
            body: Some(body.into()),
            data: Payload {
                identifier: Some(identifier.clone()),
                scheduled_for: Some(now.saturating_add(delay_ms)),
                is_programmed: true,
                ..Payload::default()
            }
            .with("type", kind.as_str())
            .with("priority", priority.as_str())
            .with("timestamp", now),
        };

        let platform = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            platform.deliver(inbound);
        });

        tracing::debug!(identifier = %identifier, delay_ms, "Notification scheduled");
        identifier
    }

    /// Make `presented` and `dismiss_all` fail until switched back.
    pub fn fail_queries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn tray_len(&self) -> usize {
        self.tray.lock().len()
    }

    fn check_available(&self) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Unavailable(
                "simulated platform failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DeliveryAdapter for SimulatedPlatform {
    fn subscribe(&self) -> broadcast::Receiver<InboundNotification> {
        self.sender.subscribe()
    }

    async fn presented(&self) -> Result<Vec<PresentedNotification>, DeliveryError> {
        self.check_available()?;
        Ok(self.tray.lock().clone())
    }

    async fn dismiss_all(&self) -> Result<(), DeliveryError> {
        self.check_available()?;
        self.tray.lock().clear();
        Ok(())
    }
}
