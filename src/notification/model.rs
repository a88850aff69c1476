//! Notification records and their payload.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Security,
    Transaction,
    System,
    Promotion,
    Urgent,
}

impl NotificationType {
    pub const ALL: [NotificationType; 5] = [
        NotificationType::Security,
        NotificationType::Transaction,
        NotificationType::Promotion,
        NotificationType::System,
        NotificationType::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Security => "security",
            NotificationType::Transaction => "transaction",
            NotificationType::System => "system",
            NotificationType::Promotion => "promotion",
            NotificationType::Urgent => "urgent",
        }
    }

    /// Parse a payload value, falling back to `System` for anything unknown.
    pub fn from_payload(value: Option<&str>) -> Self {
        value.and_then(|s| s.parse().ok()).unwrap_or(NotificationType::System)
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "security" => Ok(NotificationType::Security),
            "transaction" => Ok(NotificationType::Transaction),
            "system" => Ok(NotificationType::System),
            "promotion" => Ok(NotificationType::Promotion),
            "urgent" => Ok(NotificationType::Urgent),
            other => Err(format!("unknown notification type '{}'", other)),
        }
    }
}

/// Display priority of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse a payload value, falling back to `Medium` for anything unknown.
    pub fn from_payload(value: Option<&str>) -> Self {
        value.and_then(|s| s.parse().ok()).unwrap_or(Priority::Medium)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// A free-form payload value. Only scalars are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl PayloadValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PayloadValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::Text(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::Text(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Number(value.into())
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Flag(value)
    }
}

/// Metadata attached to a notification.
///
/// The fields the store reads are named; everything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Stable identifier used for deduplication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// When a programmed notification was due, in epoch millis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<i64>,
    /// When a programmed notification actually arrived, in epoch millis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_programmed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub from_server: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, PayloadValue>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Payload {
    pub fn with(mut self, key: &str, value: impl Into<PayloadValue>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(PayloadValue::as_str)
    }

    /// Timestamp a programmed notification should carry: the scheduled time,
    /// then the arrival time, if either is present and representable.
    pub fn backdated_timestamp(&self) -> Option<DateTime<Utc>> {
        self.scheduled_for
            .or(self.original_timestamp)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

/// A notification record.
///
/// Records are replaced wholesale by store operations, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    #[serde(default)]
    pub data: Payload,
}

impl Notification {
    /// Build a fresh unread record with a new unique id.
    pub fn create(input: NewNotification, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            kind: input.kind,
            priority: input.priority,
            timestamp,
            is_read: false,
            data: input.data,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.data.identifier.as_deref()
    }
}

/// Caller-supplied fields for a new notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub description: String,
    pub kind: NotificationType,
    pub priority: Priority,
    pub data: Payload,
}

impl NewNotification {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        kind: NotificationType,
        priority: Priority,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind,
            priority,
            data: Payload::default(),
        }
    }

    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = data;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_serialization() {
        let serialized = serde_json::to_string(&NotificationType::Promotion).unwrap();
        assert_eq!(serialized, "\"promotion\"");

        let deserialized: NotificationType = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(deserialized, NotificationType::Urgent);
    }

    #[test]
    fn test_unknown_payload_strings_fall_back() {
        assert_eq!(
            NotificationType::from_payload(Some("weather")),
            NotificationType::System
        );
        assert_eq!(NotificationType::from_payload(None), NotificationType::System);
        assert_eq!(
            NotificationType::from_payload(Some("Security")),
            NotificationType::Security
        );
        assert_eq!(Priority::from_payload(Some("extreme")), Priority::Medium);
        assert_eq!(Priority::from_payload(Some("high")), Priority::High);
    }

    #[test]
    fn test_notification_wire_shape() {
        let notification = Notification {
            id: "n-1".to_string(),
            title: "Transfer sent".to_string(),
            description: "45,000 ARS to Maria".to_string(),
            kind: NotificationType::Transaction,
            priority: Priority::Medium,
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            is_read: false,
            data: Payload::default().with("amount", 45000i64),
        };

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], "transaction");
        assert_eq!(value["isRead"], false);
        assert_eq!(value["timestamp"], "2023-11-14T22:13:20Z");
        assert_eq!(value["data"]["amount"], 45000);
    }

    #[test]
    fn test_payload_named_fields_are_camel_case() {
        let json = r#"{
            "identifier": "abc",
            "scheduledFor": 1700000000000,
            "isProgrammed": true,
            "type": "security",
            "amount": 12.5
        }"#;
        let payload: Payload = serde_json::from_str(json).unwrap();

        assert_eq!(payload.identifier.as_deref(), Some("abc"));
        assert_eq!(payload.scheduled_for, Some(1_700_000_000_000));
        assert!(payload.is_programmed);
        assert!(!payload.from_server);
        assert_eq!(payload.text("type"), Some("security"));
        assert!(matches!(payload.extra.get("amount"), Some(PayloadValue::Number(_))));
    }

    #[test]
    fn test_payload_rejects_nested_values() {
        let json = r#"{ "nested": { "a": 1 } }"#;
        assert!(serde_json::from_str::<Payload>(json).is_err());
    }

    #[test]
    fn test_backdated_timestamp_prefers_scheduled_time() {
        let payload = Payload {
            scheduled_for: Some(2_000),
            original_timestamp: Some(1_000),
            ..Payload::default()
        };
        assert_eq!(payload.backdated_timestamp().unwrap().timestamp_millis(), 2_000);

        let payload = Payload {
            original_timestamp: Some(1_000),
            ..Payload::default()
        };
        assert_eq!(payload.backdated_timestamp().unwrap().timestamp_millis(), 1_000);

        assert!(Payload::default().backdated_timestamp().is_none());
    }

    #[test]
    fn test_create_generates_unique_unread_records() {
        let input = NewNotification::new("a", "b", NotificationType::System, Priority::Low);
        let first = Notification::create(input.clone(), Utc::now());
        let second = Notification::create(input, Utc::now());

        assert_ne!(first.id, second.id);
        assert!(!first.is_read);
    }
}
