//! Presence Aggregator
//!
//! Republishes Session Registry transitions to the Live Event Bus as
//! process-wide presence announcements. Presence is deliberately global,
//! not room-scoped: in a small-team chat everyone sees who is online.
//!
//! The aggregator holds no state of its own; if the registry were rebuilt,
//! this layer's view rebuilds with it.

use super::bus::{BusEvent, EventBus};
use super::registry::PresenceChange;

/// Stateless bridge from registry transitions to the event bus.
#[derive(Debug, Clone)]
pub struct PresenceAggregator {
    bus: EventBus,
}

impl PresenceAggregator {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Announce one presence transition.
    pub fn record(&self, change: PresenceChange) {
        tracing::debug!(
            user_id = %change.user_id,
            online = change.online,
            connections = change.connections,
            "Presence transition"
        );
        self.bus.publish(BusEvent::PresenceChanged(change));
    }

    /// Announce a batch of transitions in order (identify can produce two:
    /// the previous identity's and the new one's).
    pub fn record_all(&self, changes: impl IntoIterator<Item = PresenceChange>) {
        for change in changes {
            self.record(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn record_publishes_to_the_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let aggregator = PresenceAggregator::new(bus);

        let user_id = Uuid::new_v4();
        aggregator.record(PresenceChange {
            user_id,
            online: true,
            connections: 1,
        });

        match rx.recv().await {
            Ok(BusEvent::PresenceChanged(change)) => {
                assert_eq!(change.user_id, user_id);
                assert!(change.online);
                assert_eq!(change.connections, 1);
            }
            other => panic!("unexpected bus event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn record_all_preserves_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let aggregator = PresenceAggregator::new(bus);

        let first = PresenceChange {
            user_id: Uuid::new_v4(),
            online: false,
            connections: 0,
        };
        let second = PresenceChange {
            user_id: Uuid::new_v4(),
            online: true,
            connections: 1,
        };
        aggregator.record_all([first, second]);

        match rx.recv().await {
            Ok(BusEvent::PresenceChanged(change)) => assert_eq!(change.user_id, first.user_id),
            other => panic!("unexpected bus event: {:?}", other),
        }
        match rx.recv().await {
            Ok(BusEvent::PresenceChanged(change)) => assert_eq!(change.user_id, second.user_id),
            other => panic!("unexpected bus event: {:?}", other),
        }
    }
}
