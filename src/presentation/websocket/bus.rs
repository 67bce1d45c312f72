//! Live Event Bus
//!
//! A single named channel of events decoupling the durable-write path from
//! the push path: the HTTP handlers publish here after a successful write
//! and never learn whether, or to whom, anything was delivered.
//!
//! Publishing is fire-and-forget with no persistence and no replay; a
//! subscriber registered after a publish never sees that event. Each
//! subscriber owns its receiver, so one failed or lagging subscriber cannot
//! affect another.

use tokio::sync::broadcast;

use super::registry::PresenceChange;
use crate::domain::MessageWithAuthor;

/// Capacity of the underlying broadcast channel. Receivers that fall this
/// far behind skip events (RecvError::Lagged) instead of blocking publishers.
const BUS_CAPACITY: usize = 4096;

/// Events carried by the bus, one variant per concern.
#[derive(Debug, Clone)]
pub enum BusEvent {
    /// A message was durably persisted and is ready for room fan-out
    MessageCreated(MessageWithAuthor),

    /// A user's presence changed and should be announced process-wide
    PresenceChanged(PresenceChange),
}

/// The process-wide event bus. Cheap to clone; hand a copy to anything that
/// needs to publish.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Never fails: with no
    /// subscribers the event simply vanishes, and the caller's
    /// request/response cycle is never disturbed.
    pub fn publish(&self, event: BusEvent) {
        let _ = self.sender.send(event);
    }

    /// Register a new subscriber. Only events published after this call are
    /// observed.
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn presence_event() -> BusEvent {
        BusEvent::PresenceChanged(PresenceChange {
            user_id: Uuid::new_v4(),
            online: true,
            connections: 1,
        })
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(presence_event());

        assert!(matches!(rx.recv().await, Ok(BusEvent::PresenceChanged(_))));
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();

        // Keep one receiver alive so the publish has somewhere to go
        let _early = bus.subscribe();
        bus.publish(presence_event());

        let mut late = bus.subscribe();
        assert!(matches!(
            late.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        // Must not panic or error
        bus.publish(presence_event());
    }

    #[tokio::test]
    async fn each_subscriber_gets_its_own_copy() {
        let bus = EventBus::new();
        let mut rx_a = bus.subscribe();
        let rx_b = bus.subscribe();

        // One subscriber going away does not starve the other
        drop(rx_b);
        bus.publish(presence_event());

        assert!(matches!(rx_a.recv().await, Ok(BusEvent::PresenceChanged(_))));
    }
}
