//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::presentation::middleware::auth_middleware;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(state.clone()))
        // WebSocket gateway endpoint
        .route("/ws", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/db", get(handlers::health::health_db))
        .with_state(state)
}

/// API routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public routes
        .nest("/auth", auth_routes())
        // Protected routes (require authentication)
        .nest("/channels", channel_routes(state.clone()))
        .nest("/messages", message_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh_token))
        .route("/logout", post(handlers::auth::logout))
}

/// Channel routes (protected)
fn channel_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::channel::list_channels))
        .route("/", post(handlers::channel::create_channel))
        .route("/{channel_id}/join", post(handlers::channel::join_channel))
        .route("/{channel_id}/leave", post(handlers::channel::leave_channel))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Message routes (protected)
fn message_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/{channel_id}", get(handlers::message::get_messages))
        .route("/{channel_id}", post(handlers::message::send_message))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
