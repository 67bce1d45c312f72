//! Gateway Wire Events
//!
//! JSON event formats exchanged with connected peers, tagged by `type`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::MessageWithAuthor;

/// Events accepted from a peer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Bind this connection to a user identity
    #[serde(rename = "identify")]
    Identify { user_id: Uuid },

    /// Start observing a channel for live broadcasts
    #[serde(rename = "join:channel")]
    JoinChannel { channel_id: Uuid },

    /// Stop observing a channel
    #[serde(rename = "leave:channel")]
    LeaveChannel { channel_id: Uuid },

    /// Typing indicator, forwarded to the rest of the room
    #[serde(rename = "typing")]
    Typing { channel_id: Uuid, username: String },
}

/// Events pushed to a peer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A user's live connection count changed (sent to every connection)
    #[serde(rename = "presence:update")]
    PresenceUpdate {
        user_id: Uuid,
        online: bool,
        connections: usize,
    },

    /// A message was durably stored (sent to the room, sender included)
    #[serde(rename = "message:new")]
    MessageNew { message: MessageWithAuthor },

    /// Someone else in the room is typing
    #[serde(rename = "typing")]
    Typing { username: String },
}
