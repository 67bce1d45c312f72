//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Represents a text message sent in a channel.
///
/// Maps to the `messages` table:
/// - id: UUID PRIMARY KEY (UUIDv7, time-ordered)
/// - channel_id: UUID REFERENCES channels(id)
/// - author_id: UUID REFERENCES users(id)
/// - content: TEXT NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Primary key (UUIDv7)
    pub id: Uuid,

    /// Channel the message was sent to
    pub channel_id: Uuid,

    /// Author of the message
    pub author_id: Uuid,

    /// Message text (1-2000 characters, stored trimmed)
    pub content: String,

    /// Creation timestamp; also the pagination cursor key
    pub created_at: DateTime<Utc>,
}

/// The author fields joined onto a message when it is read or created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub id: Uuid,
    pub username: String,
}

/// A message together with its author, exactly as the store returns it.
/// This is the unit the live push path broadcasts, unreshaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageWithAuthor {
    #[serde(flatten)]
    pub message: Message,
    pub author: MessageAuthor,
}

/// Repository trait for Message data access operations.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message and return it joined with its author.
    async fn create(&self, message: &Message) -> Result<MessageWithAuthor, AppError>;

    /// Find a message by its ID (used to resolve pagination cursors).
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, AppError>;

    /// List messages in a channel strictly older than `before`, newest
    /// first, limited to `limit` rows. Callers reverse the page for
    /// oldest-first display.
    async fn list_before(
        &self,
        channel_id: Uuid,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<MessageWithAuthor>, AppError>;
}
