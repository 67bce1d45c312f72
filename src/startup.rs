//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::infrastructure::database;
use crate::presentation::http::routes;
use crate::presentation::middleware::create_cors_layer;
use crate::presentation::websocket::{
    spawn_fanout, EventBus, PresenceAggregator, RoomRouter, SessionRegistry,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub settings: Arc<Settings>,
    /// User identity -> live connections
    pub registry: Arc<SessionRegistry>,
    /// Channel rooms and per-connection delivery
    pub rooms: Arc<RoomRouter>,
    /// Registry transitions -> bus announcements
    pub presence: PresenceAggregator,
    /// Decouples durable writes from socket push
    pub bus: EventBus,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        database::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        // Realtime components
        let registry = Arc::new(SessionRegistry::new());
        let rooms = Arc::new(RoomRouter::new());
        let bus = EventBus::new();
        let presence = PresenceAggregator::new(bus.clone());

        // Bridge the bus to room delivery for the lifetime of the process
        spawn_fanout(&bus, rooms.clone());

        // Create app state
        let state = AppState {
            db,
            settings: Arc::new(settings.clone()),
            registry,
            rooms,
            presence,
            bus,
        };

        // Build router with middleware
        let router = routes::create_router(state)
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&settings.cors));

        // Bind to address
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
