//! Response DTOs
//!
//! Data structures for API response bodies.

use serde::Serialize;
use uuid::Uuid;

use crate::application::services::{AuthTokens, JoinOutcome};
use crate::domain::{Channel, MessageWithAuthor, User};

/// Authentication tokens response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: User, include_email: bool) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: if include_email { Some(user.email) } else { None },
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Registration response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
}

/// Channel response
#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub id: Uuid,
    pub name: String,
    pub is_private: bool,
    pub created_by: Uuid,
    pub created_at: String,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            name: channel.name,
            is_private: channel.is_private,
            created_by: channel.created_by,
            created_at: channel.created_at.to_rfc3339(),
        }
    }
}

/// Channel list response
#[derive(Debug, Serialize)]
pub struct ChannelListResponse {
    pub channels: Vec<ChannelResponse>,
}

/// Join channel response
#[derive(Debug, Serialize)]
pub struct JoinChannelResponse {
    pub joined: bool,
    pub already_member: bool,
}

impl From<JoinOutcome> for JoinChannelResponse {
    fn from(outcome: JoinOutcome) -> Self {
        Self {
            joined: outcome.joined,
            already_member: outcome.already_member,
        }
    }
}

/// Leave channel response
#[derive(Debug, Serialize)]
pub struct LeaveChannelResponse {
    pub left: bool,
}

/// One page of channel history.
///
/// Messages are serialized exactly as the store returns them
/// (`MessageWithAuthor`), ordered oldest to newest.
#[derive(Debug, Serialize)]
pub struct MessagePageResponse {
    pub messages: Vec<MessageWithAuthor>,
    pub next_cursor: Option<Uuid>,
}

/// Single message response (message send)
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: MessageWithAuthor,
}
