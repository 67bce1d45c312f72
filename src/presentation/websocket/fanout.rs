//! Broadcast Fan-out Bridge
//!
//! The bus subscriber that turns published events into socket deliveries:
//! persisted messages go to their channel's room (sender included — the
//! echo back to the author confirms the durable write), presence updates go
//! to every connection.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::bus::{BusEvent, EventBus};
use super::events::ServerEvent;
use super::rooms::RoomRouter;

/// Subscribe to the bus and route events to rooms until the bus closes.
///
/// Spawned once at startup. A lagging subscription logs the number of
/// skipped events and keeps going; live push is best-effort and durable
/// history is the fallback path.
pub fn spawn_fanout(bus: &EventBus, router: Arc<RoomRouter>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(BusEvent::MessageCreated(message)) => {
                    let room_id = message.message.channel_id;
                    let delivered =
                        router.broadcast(room_id, ServerEvent::MessageNew { message }, None);
                    tracing::trace!(
                        room_id = %room_id,
                        delivered,
                        "Fanned out new message"
                    );
                }
                Ok(BusEvent::PresenceChanged(change)) => {
                    router.broadcast_all(ServerEvent::PresenceUpdate {
                        user_id: change.user_id,
                        online: change.online,
                        connections: change.connections,
                    });
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Fan-out receiver lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Event bus closed, stopping fan-out");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio::time::timeout;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{Message, MessageAuthor, MessageWithAuthor};
    use crate::presentation::websocket::registry::PresenceChange;

    const RECV_TIMEOUT: Duration = Duration::from_secs(1);

    fn peer(router: &RoomRouter) -> (Uuid, UnboundedReceiver<ServerEvent>) {
        let connection_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        router.register(connection_id, tx);
        (connection_id, rx)
    }

    fn stored_message(channel_id: Uuid, content: &str) -> MessageWithAuthor {
        let author_id = Uuid::new_v4();
        MessageWithAuthor {
            message: Message {
                id: Uuid::now_v7(),
                channel_id,
                author_id,
                content: content.into(),
                created_at: Utc::now(),
            },
            author: MessageAuthor {
                id: author_id,
                username: "alice".into(),
            },
        }
    }

    async fn expect_event(rx: &mut UnboundedReceiver<ServerEvent>) -> ServerEvent {
        timeout(RECV_TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("sender closed")
    }

    #[tokio::test]
    async fn persisted_message_reaches_the_room_including_the_sender() {
        let router = Arc::new(RoomRouter::new());
        let bus = EventBus::new();
        let _bridge = spawn_fanout(&bus, router.clone());

        let room = Uuid::new_v4();
        let (sender_conn, mut rx_sender) = peer(&router);
        let (other_conn, mut rx_other) = peer(&router);
        router.join(sender_conn, room);
        router.join(other_conn, room);

        bus.publish(BusEvent::MessageCreated(stored_message(room, "hello")));

        // Both room members get the message; the author's echo confirms
        // the durable write
        for rx in [&mut rx_sender, &mut rx_other] {
            match expect_event(rx).await {
                ServerEvent::MessageNew { message } => {
                    assert_eq!(message.message.content, "hello");
                    assert_eq!(message.author.username, "alice");
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn message_does_not_leak_to_other_rooms() {
        let router = Arc::new(RoomRouter::new());
        let bus = EventBus::new();
        let _bridge = spawn_fanout(&bus, router.clone());

        let room = Uuid::new_v4();
        let (member, mut rx_member) = peer(&router);
        let (outsider, mut rx_outsider) = peer(&router);
        router.join(member, room);
        router.join(outsider, Uuid::new_v4());

        bus.publish(BusEvent::MessageCreated(stored_message(room, "secret")));

        assert!(matches!(
            expect_event(&mut rx_member).await,
            ServerEvent::MessageNew { .. }
        ));
        assert!(rx_outsider.try_recv().is_err());
    }

    #[tokio::test]
    async fn presence_reaches_every_connection() {
        let router = Arc::new(RoomRouter::new());
        let bus = EventBus::new();
        let _bridge = spawn_fanout(&bus, router.clone());

        // Neither connection joined any room; presence is global
        let (_a, mut rx_a) = peer(&router);
        let (_b, mut rx_b) = peer(&router);

        let user_id = Uuid::new_v4();
        bus.publish(BusEvent::PresenceChanged(PresenceChange {
            user_id,
            online: true,
            connections: 2,
        }));

        for rx in [&mut rx_a, &mut rx_b] {
            match expect_event(rx).await {
                ServerEvent::PresenceUpdate {
                    user_id: got,
                    online,
                    connections,
                } => {
                    assert_eq!(got, user_id);
                    assert!(online);
                    assert_eq!(connections, 2);
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }
}
