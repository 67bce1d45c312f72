//! # Domain Entities
//!
//! Core domain entities representing the main business objects in the chat
//! server. All entities map directly to their corresponding database tables.
//!
//! ## Core Entities
//!
//! - **User**: User account with authentication data
//! - **Channel**: A named communication space with explicit membership
//! - **Message**: A text message sent in a channel
//! - **RefreshToken**: Stored refresh token hashes for session renewal
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access
//! operations. These traits are implemented in the infrastructure layer,
//! following the dependency inversion principle.

mod channel;
mod message;
mod refresh_token;
mod user;

// Re-export User entity and related types
pub use user::{User, UserRepository};

// Re-export Channel entity and related types
pub use channel::{Channel, ChannelMember, ChannelRepository};

// Re-export Message entity and related types
pub use message::{Message, MessageAuthor, MessageRepository, MessageWithAuthor};

// Re-export RefreshToken entity and related types
pub use refresh_token::{RefreshToken, RefreshTokenRepository};
