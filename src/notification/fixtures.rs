//! Canned notifications used by the demo: the seed list, the server
//! templates and the local simulator templates.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use super::model::{NewNotification, Notification, NotificationType, Payload, Priority};

/// Placeholder title for inbound notifications that arrive without one.
pub const DEFAULT_TITLE: &str = "New notification";
/// Placeholder body for inbound notifications that arrive without one.
pub const DEFAULT_DESCRIPTION: &str = "You have received a new notification";

/// The four notifications a fresh install starts with, timestamped relative
/// to `now`. Two are unread.
pub fn seed(now: DateTime<Utc>) -> Vec<Notification> {
    vec![
        Notification {
            id: "1".to_string(),
            title: "Security alert".to_string(),
            description: "A sign-in from a new device was detected in Buenos Aires. \
                          If it wasn't you, review your account right away."
                .to_string(),
            kind: NotificationType::Security,
            priority: Priority::High,
            timestamp: now - Duration::minutes(15),
            is_read: false,
            data: Payload::default()
                .with("location", "Buenos Aires")
                .with("device", "iPhone 14"),
        },
        Notification {
            id: "2".to_string(),
            title: "Transfer completed".to_string(),
            description: "Your transfer of $45,000 ARS to María García was processed."
                .to_string(),
            kind: NotificationType::Transaction,
            priority: Priority::Medium,
            timestamp: now - Duration::hours(2),
            is_read: false,
            data: Payload::default()
                .with("amount", 45000i64)
                .with("recipient", "María García")
                .with("reference", "TXN-2024-001"),
        },
        Notification {
            id: "3".to_string(),
            title: "New promotion".to_string(),
            description: "Get up to 5% off every transfer during January!".to_string(),
            kind: NotificationType::Promotion,
            priority: Priority::Medium,
            timestamp: now - Duration::hours(4),
            is_read: true,
            data: Payload::default()
                .with("discount", 5i64)
                .with("validUntil", "2024-01-31"),
        },
        Notification {
            id: "4".to_string(),
            title: "Scheduled maintenance".to_string(),
            description: "The system will be down for maintenance on Sunday 14/01 \
                          from 2:00 to 4:00 AM."
                .to_string(),
            kind: NotificationType::System,
            priority: Priority::Low,
            timestamp: now - Duration::days(1),
            is_read: true,
            data: Payload::default()
                .with("maintenanceDate", "2024-01-14")
                .with("startTime", "02:00")
                .with("endTime", "04:00"),
        },
    ]
}

/// A fabricated "server" notification of a random type.
pub fn random_server_notification<R: Rng>(rng: &mut R) -> NewNotification {
    let kind = *NotificationType::ALL
        .choose(rng)
        .unwrap_or(&NotificationType::System);
    server_template(kind, rng)
}

pub fn server_template<R: Rng>(kind: NotificationType, rng: &mut R) -> NewNotification {
    let (title, description, priority) = match kind {
        NotificationType::Security => (
            "Server alert",
            "A new security alert was raised by the server.".to_string(),
            Priority::High,
        ),
        NotificationType::Transaction => {
            let amount: u32 = rng.gen_range(5_000..55_000);
            (
                "Server transaction",
                format!("New transaction processed: ${} ARS.", amount),
                Priority::Medium,
            )
        }
        NotificationType::Promotion => (
            "Server promotion",
            "A new special offer is available from the server.".to_string(),
            Priority::Medium,
        ),
        NotificationType::System => (
            "Server update",
            "A new system update is available.".to_string(),
            Priority::Low,
        ),
        NotificationType::Urgent => (
            "Urgent from server",
            "Urgent notification that needs immediate attention.".to_string(),
            Priority::High,
        ),
    };

    let data = Payload {
        from_server: true,
        ..Payload::default()
    }
    .with("timestamp", Utc::now().timestamp_millis());

    NewNotification::new(title, description, kind, priority).with_data(data)
}

/// Templates behind the simulator screen's "send now" buttons.
pub fn local_template(kind: NotificationType) -> NewNotification {
    let (title, description, priority) = match kind {
        NotificationType::Security => (
            "Security alert",
            "Access detected from a new device. Please verify your account.",
            Priority::High,
        ),
        NotificationType::Transaction => (
            "Transaction completed",
            "A transfer of $15,000 ARS has been processed.",
            Priority::Medium,
        ),
        NotificationType::System => (
            "Scheduled maintenance",
            "The system will be under maintenance on Sunday from 2:00 to 4:00 AM.",
            Priority::Low,
        ),
        NotificationType::Promotion => (
            "New promotion",
            "Get up to 3% off on all your transfers!",
            Priority::Medium,
        ),
        NotificationType::Urgent => (
            "Action required",
            "Your session will expire in 5 minutes. Confirm your identity.",
            Priority::High,
        ),
    };

    let data = Payload::default()
        .with("simulated", true)
        .with("timestamp", Utc::now().timestamp_millis());

    NewNotification::new(title, description, kind, priority).with_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_four_entries_two_unread() {
        let seed = seed(Utc::now());
        assert_eq!(seed.len(), 4);
        assert_eq!(seed.iter().filter(|n| !n.is_read).count(), 2);
    }

    #[test]
    fn server_templates_are_tagged() {
        let mut rng = rand::thread_rng();
        for kind in NotificationType::ALL {
            let input = server_template(kind, &mut rng);
            assert_eq!(input.kind, kind);
            assert!(input.data.from_server);
        }
    }

    #[test]
    fn transaction_amount_stays_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let input = server_template(NotificationType::Transaction, &mut rng);
            let amount: u32 = input
                .description
                .trim_start_matches("New transaction processed: $")
                .trim_end_matches(" ARS.")
                .parse()
                .unwrap();
            assert!((5_000..55_000).contains(&amount));
        }
    }

    #[test]
    fn urgent_and_security_are_high_priority() {
        assert_eq!(local_template(NotificationType::Urgent).priority, Priority::High);
        assert_eq!(local_template(NotificationType::Security).priority, Priority::High);
        assert_eq!(local_template(NotificationType::System).priority, Priority::Low);
    }
}
