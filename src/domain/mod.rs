//! # Domain Layer
//!
//! The domain layer contains the core business logic of the chat server.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (User, Channel, Message, RefreshToken)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Entities encapsulate domain behavior

pub mod entities;

// Re-export commonly used types
pub use entities::*;
