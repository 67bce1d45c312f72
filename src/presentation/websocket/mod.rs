//! Realtime Gateway
//!
//! The live fan-out and session/presence layer:
//!
//! - [`registry::SessionRegistry`] — user identity -> live connections
//! - [`rooms::RoomRouter`] — channel rooms and scoped broadcast
//! - [`presence::PresenceAggregator`] — registry transitions -> global announcements
//! - [`bus::EventBus`] — decouples the durable write path from socket push
//! - [`fanout`] — the bus subscriber that drives room delivery
//! - [`handler`] — per-connection WebSocket protocol handling

pub mod bus;
pub mod events;
pub mod fanout;
pub mod handler;
pub mod presence;
pub mod registry;
pub mod rooms;

pub use bus::{BusEvent, EventBus};
pub use events::{ClientEvent, ServerEvent};
pub use fanout::spawn_fanout;
pub use handler::ws_handler;
pub use presence::PresenceAggregator;
pub use registry::{PresenceChange, SessionRegistry};
pub use rooms::RoomRouter;
