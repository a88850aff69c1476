//! Notification records, payloads and demo fixtures.

pub mod fixtures;
mod model;

pub use model::{NewNotification, Notification, NotificationType, Payload, PayloadValue, Priority};
