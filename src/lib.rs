//! # Huddle Server Library
//!
//! This crate provides a real-time team chat server with:
//! - RESTful HTTP API endpoints
//! - WebSocket gateway for live messages, typing, and presence
//! - PostgreSQL for persistent storage
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities and repository traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Database implementations
//! - **Presentation Layer**: HTTP handlers and the realtime gateway
//!
//! ## Module Structure
//!
//! ```text
//! huddle_server/
//! +-- config/        Configuration management
//! +-- domain/        Domain entities and repository traits
//! +-- application/   Application services and DTOs
//! +-- infrastructure/ Database implementations
//! +-- presentation/  HTTP routes and the WebSocket gateway
//! +-- shared/        Common utilities (errors, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
