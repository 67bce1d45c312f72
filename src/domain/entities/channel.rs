//! Channel entity and repository trait.
//!
//! Maps to the `channels` and `channel_members` tables in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Represents a channel in the chat system.
///
/// Maps to the `channels` table:
/// - id: UUID PRIMARY KEY
/// - name: VARCHAR(100) NOT NULL UNIQUE
/// - is_private: BOOLEAN NOT NULL DEFAULT FALSE
/// - created_by: UUID REFERENCES users(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Primary key
    pub id: Uuid,

    /// Channel name, always stored with a leading `#`
    pub name: String,

    /// Whether the channel is private (invite-only)
    pub is_private: bool,

    /// User who created the channel
    pub created_by: Uuid,

    /// Channel creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Channel {
    /// Normalize a user-supplied channel name: trim whitespace and ensure
    /// the leading `#`. Returns None for names that are empty after trimming.
    pub fn normalize_name(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "#" {
            return None;
        }
        if trimmed.starts_with('#') {
            Some(trimmed.to_string())
        } else {
            Some(format!("#{}", trimmed))
        }
    }
}

/// A user's membership in a channel.
///
/// Maps to the `channel_members` table (composite primary key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMember {
    pub channel_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

/// Repository trait for Channel data access operations.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Create a channel. The creator automatically becomes a member;
    /// both writes happen in a single transaction.
    async fn create(&self, channel: &Channel) -> Result<Channel, AppError>;

    /// Find a channel by its ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Channel>, AppError>;

    /// List all channels, oldest first.
    async fn list_all(&self) -> Result<Vec<Channel>, AppError>;

    /// Add a user to a channel. Returns false if the user was already a
    /// member (not an error).
    async fn add_member(&self, channel_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// Remove a user from a channel. Removing a non-member is a no-op.
    async fn remove_member(&self, channel_id: Uuid, user_id: Uuid) -> Result<(), AppError>;

    /// Check whether a user is a member of a channel.
    async fn is_member(&self, channel_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::Channel;

    #[test_case("general", Some("#general") ; "bare name gets prefixed")]
    #[test_case("#general", Some("#general") ; "prefixed name kept")]
    #[test_case("  random  ", Some("#random") ; "whitespace trimmed")]
    #[test_case("", None ; "empty rejected")]
    #[test_case("   ", None ; "blank rejected")]
    #[test_case("#", None ; "lone hash rejected")]
    fn normalize_name(raw: &str, expected: Option<&str>) {
        assert_eq!(Channel::normalize_name(raw).as_deref(), expected);
    }
}
