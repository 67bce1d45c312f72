//! Message Repository Implementation
//!
//! PostgreSQL implementation of message operations with cursor-based
//! pagination for chat history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Message, MessageAuthor, MessageRepository, MessageWithAuthor};
use crate::shared::error::AppError;

/// Internal row type for message queries joined with the author.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    channel_id: Uuid,
    author_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    author_username: String,
}

impl MessageRow {
    /// Convert database row to the joined domain representation.
    fn into_message(self) -> MessageWithAuthor {
        MessageWithAuthor {
            author: MessageAuthor {
                id: self.author_id,
                username: self.author_username,
            },
            message: Message {
                id: self.id,
                channel_id: self.channel_id,
                author_id: self.author_id,
                content: self.content,
                created_at: self.created_at,
            },
        }
    }
}

/// Internal row type for bare message lookups (cursor resolution).
#[derive(Debug, sqlx::FromRow)]
struct BareMessageRow {
    id: Uuid,
    channel_id: Uuid,
    author_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

/// PostgreSQL message repository implementation.
///
/// Provides message storage and retrieval with timestamp-keyed cursor
/// pagination for infinite scroll.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    /// Persist a message and return it joined with its author, in one
    /// round trip. The broadcast path forwards this value untouched.
    async fn create(&self, message: &Message) -> Result<MessageWithAuthor, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            WITH inserted AS (
                INSERT INTO messages (id, channel_id, author_id, content)
                VALUES ($1, $2, $3, $4)
                RETURNING id, channel_id, author_id, content, created_at
            )
            SELECT i.id, i.channel_id, i.author_id, i.content, i.created_at,
                   u.username AS author_username
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(message.id)
        .bind(message.channel_id)
        .bind(message.author_id)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, AppError> {
        let row = sqlx::query_as::<_, BareMessageRow>(
            r#"
            SELECT id, channel_id, author_id, content, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Message {
            id: r.id,
            channel_id: r.channel_id,
            author_id: r.author_id,
            content: r.content,
            created_at: r.created_at,
        }))
    }

    /// Keyset pagination on created_at: the page is strictly older than
    /// `before`, newest first.
    async fn list_before(
        &self,
        channel_id: Uuid,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<MessageWithAuthor>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.channel_id, m.author_id, m.content, m.created_at,
                   u.username AS author_username
            FROM messages m
            JOIN users u ON u.id = m.author_id
            WHERE m.channel_id = $1 AND m.created_at < $2
            ORDER BY m.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(channel_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }
}
