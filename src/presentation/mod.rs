//! Presentation Layer
//!
//! HTTP routes and the realtime WebSocket gateway.

pub mod http;
pub mod middleware;
pub mod websocket;
