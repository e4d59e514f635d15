//! Outbound notification channel.

use badgegate_core::OutboundNotification;
use badgegate_core::constants::DEFAULT_NOTIFICATION_CAPACITY;
use tokio::sync::broadcast;
use tracing::trace;

/// Fire-and-forget publisher for UI notifications.
///
/// Backed by a tokio broadcast channel: every connected subscriber receives
/// each notification at most once, in publish order. There is no replay for
/// late subscribers, and publishing with no subscribers is not an error. A
/// subscriber that falls more than `capacity` notifications behind skips the
/// oldest ones; the publisher is never slowed down.
///
/// ```
/// use badgegate_core::{CardId, OutboundNotification};
/// use badgegate_session::EventSink;
///
/// let sink = EventSink::new(8);
/// let mut rx = sink.subscribe();
///
/// sink.publish(OutboundNotification::SessionOpened { card_id: CardId::new("A1").unwrap() });
/// assert_eq!(rx.try_recv().unwrap().event_name(), "request_pin");
/// ```
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<OutboundNotification>,
}

impl EventSink {
    /// Create a sink buffering up to `capacity` notifications per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a notification. Never blocks and never fails.
    pub fn publish(&self, notification: OutboundNotification) {
        let event = notification.event_name();
        match self.tx.send(notification) {
            Ok(receivers) => trace!(event, receivers, "Notification published"),
            Err(_) => trace!(event, "Notification dropped, no subscribers"),
        }
    }

    /// Subscribe to notifications published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundNotification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}
