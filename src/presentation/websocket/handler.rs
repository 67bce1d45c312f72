//! WebSocket Connection Handler
//!
//! Drives one connection through its lifecycle: anonymous on connect,
//! identified once the peer says who it is, then exhaustive cleanup on
//! disconnect. Peer events feed the Session Registry and Room Membership
//! Router; deliveries arrive on the connection's own outbound channel and
//! are forwarded to the socket by a dedicated task.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::{ClientEvent, ServerEvent};
use crate::startup::AppState;

/// Per-connection lifecycle state. A connection is anonymous until the
/// peer identifies; disconnect is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Anonymous,
    Identified(Uuid),
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let ws = ws
        .max_message_size(state.settings.websocket.max_message_size)
        .max_frame_size(state.settings.websocket.max_frame_size);

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    let mut connection_state = ConnectionState::Anonymous;

    tracing::debug!(connection_id = %connection_id, "WebSocket connection opened");

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Outbound channel; the router delivers broadcasts here
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Forward outbound events to the socket
    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive broadcasts from this point on; joining rooms and presence
    // both work for anonymous connections
    state.rooms.register(connection_id, tx);

    // Main receive loop
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        handle_client_event(event, connection_id, &mut connection_state, &state)
                    }
                    Err(e) => {
                        // A malformed frame is the peer's problem, not a
                        // reason to drop the connection
                        tracing::debug!(
                            connection_id = %connection_id,
                            error = %e,
                            "Ignoring malformed event"
                        );
                    }
                }
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Connection closed by peer");
                break;
            }
            Ok(_) => {
                // Ping/Pong handled by axum, binary frames ignored
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Disconnect cleanup must be exhaustive regardless of how we got here:
    // rooms first, then the peer table, then presence
    state.rooms.leave_all(connection_id);
    state.rooms.unregister(connection_id);
    if let Some(change) = state.registry.forget(connection_id) {
        state.presence.record(change);
    }
    sender_task.abort();

    match connection_state {
        ConnectionState::Identified(user_id) => {
            tracing::info!(
                connection_id = %connection_id,
                user_id = %user_id,
                "User disconnected"
            );
        }
        ConnectionState::Anonymous => {
            tracing::debug!(connection_id = %connection_id, "Anonymous connection closed");
        }
    }
}

/// Apply one peer event to the realtime components.
fn handle_client_event(
    event: ClientEvent,
    connection_id: Uuid,
    connection_state: &mut ConnectionState,
    state: &AppState,
) {
    match event {
        ClientEvent::Identify { user_id } => {
            // Re-identification simply re-runs identify; reconnects that
            // reuse a socket rely on this being idempotent
            let changes = state.registry.identify(connection_id, user_id);
            state.presence.record_all(changes);
            *connection_state = ConnectionState::Identified(user_id);

            tracing::info!(
                connection_id = %connection_id,
                user_id = %user_id,
                "Connection identified"
            );
        }

        ClientEvent::JoinChannel { channel_id } => {
            // Permitted while anonymous as well; see DESIGN.md
            state.rooms.join(connection_id, channel_id);
        }

        ClientEvent::LeaveChannel { channel_id } => {
            state.rooms.leave(connection_id, channel_id);
        }

        ClientEvent::Typing {
            channel_id,
            username,
        } => {
            // Forward to everyone else in the room; the sender knows they
            // are typing
            state
                .rooms
                .broadcast(channel_id, ServerEvent::Typing { username }, Some(connection_id));
        }
    }
}
