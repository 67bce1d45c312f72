//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Authentication, JWT tokens, password management
//! - **ChannelService**: Channel listing, creation, and membership
//! - **MessageService**: Message history pagination and the durable write path

pub mod auth_service;
pub mod channel_service;
pub mod message_service;

// Re-export auth service types
pub use auth_service::{AuthError, AuthService, AuthServiceImpl, AuthTokens, Claims};

// Re-export channel service types
pub use channel_service::{
    ChannelError, ChannelService, ChannelServiceImpl, CreateChannelDto, JoinOutcome,
};

// Re-export message service types
pub use message_service::{
    MessageError, MessagePage, MessageQueryDto, MessageService, MessageServiceImpl,
};
