//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! This module provides concrete implementations of the repository traits
//! defined in the domain layer. Each repository handles data access for
//! a specific entity type.
//!
//! ## Available Repositories
//!
//! - **UserRepository** - User account management
//! - **ChannelRepository** - Channel and channel membership management
//! - **MessageRepository** - Message creation and cursor pagination
//! - **RefreshTokenRepository** - Stored refresh token hashes

mod channel_repository;
mod message_repository;
mod refresh_token_repository;
mod user_repository;

pub use channel_repository::PgChannelRepository;
pub use message_repository::PgMessageRepository;
pub use refresh_token_repository::PgRefreshTokenRepository;
pub use user_repository::PgUserRepository;
