use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// User-facing notification sink. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Error,
}

/// A message delivered to UI subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Notifier that writes user messages to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        warn!(target: "shopcart_rs::notifications", notification = %message, "User notification");
    }
}

/// Notifier that fans messages out to every subscribed UI component
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// Create a notifier buffering up to `capacity` undelivered messages per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}

impl Notifier for BroadcastNotifier {
    fn error(&self, message: &str) {
        let notification = Notification {
            level: NotificationLevel::Error,
            message: message.to_string(),
            timestamp: Utc::now(),
        };
        if self.sender.send(notification).is_err() {
            debug!("No notification subscribers, dropping message: {}", message);
        }
    }
}
