//! Object-finalize notifications.
//!
//! Hosted blob stores push a notification when an object is
//! finalized; locally the stores publish the same payload onto an
//! in-process bus. Delivery is at-least-once: a slow subscriber can
//! observe duplicates after a lag, and the transform pipeline is
//! expected to tolerate them.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Payload of a finalize notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeEvent {
    pub bucket: String,
    /// Object key, e.g. `original/42/cat.jpg`.
    pub name: String,
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
}

impl FinalizeEvent {
    pub fn new(
        bucket: impl Into<String>,
        name: impl Into<String>,
        content_type: Option<&str>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
            content_type: content_type.map(|s| s.to_string()),
        }
    }
}

/// Fan-out bus for finalize notifications.
///
/// Publishing never blocks; events published while nobody is
/// subscribed are dropped, matching hosted stores where the
/// subscription is configured before any upload happens.
#[derive(Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<FinalizeEvent>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: FinalizeEvent) {
        // Err means no live subscribers; that is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FinalizeEvent> {
        self.tx.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = NotificationBus::default();
        let mut rx = bus.subscribe();

        bus.publish(FinalizeEvent::new(
            "pixgate-media",
            "original/42/cat.jpg",
            Some("image/jpeg"),
        ));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, "original/42/cat.jpg");
        assert_eq!(event.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let bus = NotificationBus::default();
        bus.publish(FinalizeEvent::new("pixgate-media", "original/x.png", None));
    }
}
