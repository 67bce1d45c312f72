//! Room Membership Router
//!
//! Maps connections to the channel rooms they currently observe and fans
//! events out to room members. Rooms are ephemeral: they exist only as the
//! set of joined connections, and an emptied room's entry is removed.
//!
//! The router owns the room-to-connections mapping and the per-connection
//! outbound senders. Delivery is an unbounded channel send, so no broadcast
//! ever blocks on a slow peer while membership is being read.

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;

/// Room membership and delivery table.
///
/// Sharded maps give per-key exclusivity: joins and broadcasts on unrelated
/// rooms proceed without contention.
#[derive(Debug, Default)]
pub struct RoomRouter {
    /// Room id -> member connections. Entries are removed when emptied.
    rooms: DashMap<Uuid, HashSet<Uuid>>,
    /// Connection -> rooms it has joined, for exhaustive disconnect cleanup.
    memberships: DashMap<Uuid, HashSet<Uuid>>,
    /// Connection -> outbound event sender.
    peers: DashMap<Uuid, mpsc::UnboundedSender<ServerEvent>>,
}

impl RoomRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound sender. Must be called before the
    /// connection can receive any broadcast.
    pub fn register(&self, connection_id: Uuid, sender: mpsc::UnboundedSender<ServerEvent>) {
        self.peers.insert(connection_id, sender);
    }

    /// Drop a connection's outbound sender.
    pub fn unregister(&self, connection_id: Uuid) {
        self.peers.remove(&connection_id);
    }

    /// Add a connection to a room. Idempotent.
    pub fn join(&self, connection_id: Uuid, room_id: Uuid) {
        self.rooms.entry(room_id).or_default().insert(connection_id);
        self.memberships
            .entry(connection_id)
            .or_default()
            .insert(room_id);

        tracing::debug!(connection_id = %connection_id, room_id = %room_id, "Joined room");
    }

    /// Remove a connection from a room. Leaving a room you are not in is a
    /// silent no-op.
    pub fn leave(&self, connection_id: Uuid, room_id: Uuid) {
        self.remove_from_room(connection_id, room_id);

        if let Some(mut rooms) = self.memberships.get_mut(&connection_id) {
            rooms.remove(&room_id);
        }
        self.memberships
            .remove_if(&connection_id, |_, rooms| rooms.is_empty());
    }

    /// Remove a connection from every room it belongs to. Called once on
    /// disconnect; afterwards no room may still hold the connection.
    pub fn leave_all(&self, connection_id: Uuid) {
        let Some((_, rooms)) = self.memberships.remove(&connection_id) else {
            return;
        };

        for room_id in rooms {
            self.remove_from_room(connection_id, room_id);
        }

        tracing::debug!(connection_id = %connection_id, "Left all rooms");
    }

    /// Deliver an event to every current member of a room, optionally
    /// excluding one connection (e.g. the typing sender).
    ///
    /// The member set is snapshotted first; joins and leaves racing with an
    /// in-flight broadcast may or may not be observed but never see torn
    /// state. A closed peer is skipped and logged, and never aborts
    /// delivery to the rest. Returns the number of successful deliveries.
    pub fn broadcast(&self, room_id: Uuid, event: ServerEvent, except: Option<Uuid>) -> usize {
        let members: Vec<Uuid> = match self.rooms.get(&room_id) {
            Some(members) => members.iter().copied().collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for member in members {
            if Some(member) == except {
                continue;
            }
            if self.send_to(member, event.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Deliver an event to every registered connection, room membership
    /// notwithstanding (presence updates are global).
    pub fn broadcast_all(&self, event: ServerEvent) -> usize {
        let peers: Vec<Uuid> = self.peers.iter().map(|entry| *entry.key()).collect();

        let mut delivered = 0;
        for peer in peers {
            if self.send_to(peer, event.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Check whether a connection is currently a member of a room.
    pub fn is_member(&self, connection_id: Uuid, room_id: Uuid) -> bool {
        self.rooms
            .get(&room_id)
            .map(|members| members.contains(&connection_id))
            .unwrap_or(false)
    }

    /// Number of connections currently observing a room.
    pub fn member_count(&self, room_id: Uuid) -> usize {
        self.rooms
            .get(&room_id)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    fn remove_from_room(&self, connection_id: Uuid, room_id: Uuid) {
        if let Some(mut members) = self.rooms.get_mut(&room_id) {
            members.remove(&connection_id);
        }
        // An empty room ceases to exist
        self.rooms.remove_if(&room_id, |_, members| members.is_empty());
    }

    fn send_to(&self, connection_id: Uuid, event: ServerEvent) -> bool {
        let Some(sender) = self.peers.get(&connection_id) else {
            return false;
        };

        if sender.send(event).is_err() {
            tracing::debug!(
                connection_id = %connection_id,
                "Dropping delivery to closed connection"
            );
            return false;
        }
        true
    }
}
