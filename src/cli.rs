//! Command-line driver for the store.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;

use notistore::config::Config;
use notistore::delivery::{DeliveryBridge, SimulatedPlatform};
use notistore::notification::fixtures;
use notistore::notification::{NewNotification, Notification, NotificationType, Priority};
use notistore::persistence::FileSnapshotStore;
use notistore::store::NotificationStore;

#[derive(Parser)]
#[command(name = "notistore", about = "Local notification store", version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List stored notifications
    List {
        /// Show the pending server list instead
        #[arg(long)]
        pending: bool,
    },
    /// Add a notification
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "system")]
        kind: NotificationType,
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
    /// Mark one notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll,
    /// Delete one notification
    Delete { id: String },
    /// Delete every notification and the stored snapshot
    Clear,
    /// Add a notification from a local template
    Simulate {
        /// Template type (default: random)
        #[arg(long)]
        kind: Option<NotificationType>,
    },
    /// Run a live session with timers and a simulated platform
    Run {
        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(long)]
        duration_secs: Option<u64>,
        /// Promote pending notifications this often
        #[arg(long, default_value = "20")]
        refresh_every_secs: u64,
    },
}

pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let mut store = NotificationStore::new(config.store_policy());
    if let Some(path) = config.snapshot_path() {
        tracing::debug!(path = %path.display(), "Using snapshot file");
        store = store.with_persistence(Arc::new(FileSnapshotStore::new(path)));
    }

    match cli.command {
        Command::Run {
            duration_secs,
            refresh_every_secs,
        } => {
            let platform = SimulatedPlatform::new();
            let store = store.with_delivery(platform.clone());
            run_session(
                store,
                platform,
                duration_secs.map(Duration::from_secs),
                Duration::from_secs(refresh_every_secs.max(1)),
            )
            .await
        }
        command => {
            store.load().await;
            let result = run_once(&store, command).await;
            store.dispose();
            result
        }
    }
}

async fn run_once(store: &NotificationStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List { pending } => {
            let list = if pending {
                store.pending()
            } else {
                store.notifications()
            };
            for notification in &list {
                println!("{}", format_line(notification));
            }
            println!("{} notifications, {} unread", list.len(), store.unread_count());
        }
        Command::Add {
            title,
            description,
            kind,
            priority,
        } => {
            let notification = store
                .add_notification(NewNotification::new(title, description, kind, priority))
                .await;
            println!("{}", notification.id);
        }
        Command::Read { id } => {
            if !store.mark_as_read(&id).await {
                anyhow::bail!("No unread notification with id '{}'", id);
            }
        }
        Command::ReadAll => store.mark_all_as_read().await,
        Command::Delete { id } => {
            if !store.delete_notification(&id).await {
                anyhow::bail!("No notification with id '{}'", id);
            }
        }
        Command::Clear => store.clear_all_notifications().await,
        Command::Simulate { kind } => {
            let kind = match kind {
                Some(kind) => kind,
                None => *NotificationType::ALL
                    .choose(&mut rand::thread_rng())
                    .unwrap_or(&NotificationType::System),
            };
            let notification = store.add_notification(fixtures::local_template(kind)).await;
            println!("{}", format_line(&notification));
        }
        Command::Run { .. } => anyhow::bail!("run is a session command"),
    }
    Ok(())
}

async fn run_session(
    store: NotificationStore,
    platform: Arc<SimulatedPlatform>,
    duration: Option<Duration>,
    refresh_every: Duration,
) -> anyhow::Result<()> {
    let bridge = DeliveryBridge::attach(store.clone(), platform.as_ref());
    store.load().await;

    platform.schedule_notification(
        "Payment reminder",
        "Your card payment is due tomorrow",
        NotificationType::Transaction,
        Priority::High,
        Duration::from_secs(5),
    );

    let mut updates = store.subscribe();
    let mut refresh = tokio::time::interval_at(tokio::time::Instant::now() + refresh_every, refresh_every);
    let deadline = async move {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(deadline, ctrl_c);

    tracing::info!("Session running, press Ctrl-C to stop");
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Received Ctrl-C, stopping");
                break;
            }
            _ = &mut deadline => {
                tracing::info!("Session duration elapsed");
                break;
            }
            _ = refresh.tick() => {
                store.refresh_notifications().await;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                tracing::info!(
                    total = view.notifications.len(),
                    unread = view.unread_count,
                    pending = view.pending_server_notifications.len(),
                    new_available = view.has_new_notifications_available,
                    "Store updated"
                );
            }
        }
    }

    if !bridge.is_listening() {
        tracing::warn!("Delivery listener had already stopped");
    }
    bridge.detach();
    store.dispose();
    Ok(())
}

fn format_line(notification: &Notification) -> String {
    format!(
        "{} {} [{}/{}] {} - {} ({})",
        if notification.is_read { " " } else { "*" },
        notification.id,
        notification.kind,
        notification.priority,
        notification.title,
        notification.description,
        notification.timestamp.to_rfc3339(),
    )
}
