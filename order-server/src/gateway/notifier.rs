//! Notification seam.
//!
//! Fire-and-forget: a broadcast failure is the caller's to log and
//! swallow, it must never roll back or fail the state transition that
//! produced the event.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

/// New order waiting for the merchant to accept.
pub const KIND_NEW_ORDER: i32 = 1;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("No active subscribers")]
    NoSubscribers,
}

/// Event payload pushed to merchant-facing clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: uuid::Uuid,
    pub kind: i32,
    pub order_id: i64,
    pub order_number: String,
    pub content: String,
    pub created_at: i64,
}

impl NotificationEvent {
    pub fn new_order(order_id: i64, order_number: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            kind: KIND_NEW_ORDER,
            order_id,
            order_number: order_number.to_string(),
            content: format!("order number: {}", order_number),
            created_at: shared::util::now_millis(),
        }
    }
}

pub trait Notifier: Send + Sync {
    /// Broadcast an event to all subscribers; returns how many
    /// subscribers received it.
    fn broadcast(&self, event: NotificationEvent) -> Result<usize, NotifyError>;
}

// =============================================================================
// In-process broadcast notifier
// =============================================================================

/// Notifier backed by a tokio broadcast channel. Push-transport
/// plumbing (websocket fan-out and the like) subscribes on the other
/// side and is out of scope here.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<NotificationEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn broadcast(&self, event: NotificationEvent) -> Result<usize, NotifyError> {
        self.tx.send(event).map_err(|_| NotifyError::NoSubscribers)
    }
}
