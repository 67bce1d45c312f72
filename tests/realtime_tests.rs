//! Realtime Integration Scenarios
//!
//! Drives the registry, room router, presence aggregator, event bus, and
//! fan-out bridge together through the library API, the same way the
//! connection handler and the message write path do. No sockets and no
//! database are involved; connections are plain channels.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;
use uuid::Uuid;

use huddle_server::domain::{Message, MessageAuthor, MessageWithAuthor};
use huddle_server::presentation::websocket::{
    spawn_fanout, BusEvent, EventBus, PresenceAggregator, RoomRouter, ServerEvent, SessionRegistry,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// The realtime components wired together as in `Application::build`.
struct Harness {
    registry: Arc<SessionRegistry>,
    rooms: Arc<RoomRouter>,
    presence: PresenceAggregator,
    bus: EventBus,
}

impl Harness {
    fn new() -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let rooms = Arc::new(RoomRouter::new());
        let bus = EventBus::new();
        let presence = PresenceAggregator::new(bus.clone());
        spawn_fanout(&bus, rooms.clone());

        Self {
            registry,
            rooms,
            presence,
            bus,
        }
    }

    /// Open a connection: register its outbound channel, as the gateway
    /// does on upgrade.
    fn connect(&self) -> (Uuid, UnboundedReceiver<ServerEvent>) {
        let connection_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms.register(connection_id, tx);
        (connection_id, rx)
    }

    /// The gateway's identify path: registry mutation plus presence emit.
    fn identify(&self, connection_id: Uuid, user_id: Uuid) {
        let changes = self.registry.identify(connection_id, user_id);
        self.presence.record_all(changes);
    }

    /// The gateway's disconnect path: exhaustive, in order.
    fn disconnect(&self, connection_id: Uuid) {
        self.rooms.leave_all(connection_id);
        self.rooms.unregister(connection_id);
        if let Some(change) = self.registry.forget(connection_id) {
            self.presence.record(change);
        }
    }

    /// The HTTP write path after a successful insert.
    fn persist_and_publish(&self, channel_id: Uuid, author: &str, content: &str) {
        let author_id = Uuid::new_v4();
        self.bus.publish(BusEvent::MessageCreated(MessageWithAuthor {
            message: Message {
                id: Uuid::now_v7(),
                channel_id,
                author_id,
                content: content.into(),
                created_at: Utc::now(),
            },
            author: MessageAuthor {
                id: author_id,
                username: author.into(),
            },
        }));
    }
}

async fn next_event(rx: &mut UnboundedReceiver<ServerEvent>) -> ServerEvent {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("connection channel closed")
}

/// Wait for the next `message:new`, skipping presence noise.
async fn next_message(rx: &mut UnboundedReceiver<ServerEvent>) -> MessageWithAuthor {
    loop {
        if let ServerEvent::MessageNew { message } = next_event(rx).await {
            return message;
        }
    }
}

/// Wait for the next `presence:update`, skipping other events.
async fn next_presence(rx: &mut UnboundedReceiver<ServerEvent>) -> (Uuid, bool, usize) {
    loop {
        if let ServerEvent::PresenceUpdate {
            user_id,
            online,
            connections,
        } = next_event(rx).await
        {
            return (user_id, online, connections);
        }
    }
}

#[tokio::test]
async fn message_in_general_reaches_both_members_including_the_sender() {
    let harness = Harness::new();
    let general = Uuid::new_v4();

    let (conn_a, mut rx_a) = harness.connect();
    let (conn_b, mut rx_b) = harness.connect();
    harness.identify(conn_a, Uuid::new_v4());
    harness.identify(conn_b, Uuid::new_v4());
    harness.rooms.join(conn_a, general);
    harness.rooms.join(conn_b, general);

    // A's message goes through the durable write path, then the bus
    harness.persist_and_publish(general, "alice", "hello");

    let received_b = next_message(&mut rx_b).await;
    assert_eq!(received_b.message.content, "hello");
    assert_eq!(received_b.author.username, "alice");

    // A receives its own message back: confirmation of the durable write
    let received_a = next_message(&mut rx_a).await;
    assert_eq!(received_a.message.content, "hello");
}

#[tokio::test]
async fn two_tabs_one_user_presence_counts() {
    let harness = Harness::new();
    let u1 = Uuid::new_v4();

    // A third party watches presence without joining anything
    let (_observer, mut rx_observer) = harness.connect();

    let (tab_a, _rx_a) = harness.connect();
    harness.identify(tab_a, u1);
    assert_eq!(next_presence(&mut rx_observer).await, (u1, true, 1));

    let (tab_b, _rx_b) = harness.connect();
    harness.identify(tab_b, u1);
    assert_eq!(next_presence(&mut rx_observer).await, (u1, true, 2));

    // Closing one tab keeps the user online with one connection left
    harness.disconnect(tab_b);
    assert_eq!(next_presence(&mut rx_observer).await, (u1, true, 1));
    assert!(harness.registry.is_online(u1));

    // Closing the last tab is the offline transition
    harness.disconnect(tab_a);
    assert_eq!(next_presence(&mut rx_observer).await, (u1, false, 0));
    assert!(!harness.registry.is_online(u1));
}

#[tokio::test]
async fn typing_indicator_skips_the_sender() {
    let harness = Harness::new();
    let room = Uuid::new_v4();

    let (typist, mut rx_typist) = harness.connect();
    let (reader, mut rx_reader) = harness.connect();
    harness.rooms.join(typist, room);
    harness.rooms.join(reader, room);

    // The gateway forwards typing directly to the room, excluding self
    harness.rooms.broadcast(
        room,
        ServerEvent::Typing {
            username: "alice".into(),
        },
        Some(typist),
    );

    match next_event(&mut rx_reader).await {
        ServerEvent::Typing { username } => assert_eq!(username, "alice"),
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(rx_typist.try_recv().is_err());
}

#[tokio::test]
async fn disconnect_cleanup_is_exhaustive() {
    let harness = Harness::new();
    let rooms: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

    let (conn, mut rx) = harness.connect();
    let user = Uuid::new_v4();
    harness.identify(conn, user);
    // Drain the connection's own presence announcement
    assert_eq!(next_presence(&mut rx).await, (user, true, 1));

    // A witness stays behind in every room
    let (witness, mut rx_witness) = harness.connect();
    for &room in &rooms {
        harness.rooms.join(conn, room);
        harness.rooms.join(witness, room);
    }

    harness.disconnect(conn);

    // The witness still gets room traffic; the gone connection never does
    for &room in &rooms {
        harness.persist_and_publish(room, "alice", "anyone there?");
    }
    for _ in &rooms {
        next_message(&mut rx_witness).await;
    }
    assert!(rx.try_recv().is_err());
    assert!(!harness.registry.is_online(user));
    assert_eq!(harness.registry.connection_count(user), 0);
}

#[tokio::test]
async fn anonymous_connections_receive_room_broadcasts() {
    let harness = Harness::new();
    let room = Uuid::new_v4();

    // Never identifies; joins anyway (deliberately permitted, see DESIGN.md)
    let (lurker, mut rx) = harness.connect();
    harness.rooms.join(lurker, room);

    harness.persist_and_publish(room, "alice", "hello?");

    let message = next_message(&mut rx).await;
    assert_eq!(message.message.content, "hello?");
}
