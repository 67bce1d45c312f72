//! Channel Repository Implementation
//!
//! PostgreSQL implementation of channel and channel membership operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Channel, ChannelRepository};
use crate::shared::error::AppError;

/// Internal row type matching the channels table schema.
#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: Uuid,
    name: String,
    is_private: bool,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl ChannelRow {
    /// Convert database row to domain Channel entity.
    fn into_channel(self) -> Channel {
        Channel {
            id: self.id,
            name: self.name,
            is_private: self.is_private,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL channel repository implementation.
#[derive(Clone)]
pub struct PgChannelRepository {
    pool: PgPool,
}

impl PgChannelRepository {
    /// Creates a new PgChannelRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelRepository for PgChannelRepository {
    /// Create a channel and enroll its creator as the first member.
    /// Both writes commit atomically.
    async fn create(&self, channel: &Channel) -> Result<Channel, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            INSERT INTO channels (id, name, is_private, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, is_private, created_by, created_at
            "#,
        )
        .bind(channel.id)
        .bind(&channel.name)
        .bind(channel.is_private)
        .bind(channel.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO channel_members (channel_id, user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(channel.id)
        .bind(channel.created_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into_channel())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, name, is_private, created_by, created_at
            FROM channels
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_channel()))
    }

    async fn list_all(&self) -> Result<Vec<Channel>, AppError> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, name, is_private, created_by, created_at
            FROM channels
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_channel()).collect())
    }

    /// Idempotent insert; `ON CONFLICT DO NOTHING` makes re-joins silent.
    async fn add_member(&self, channel_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO channel_members (channel_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (channel_id, user_id) DO NOTHING
            "#,
        )
        .bind(channel_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(&self, channel_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM channel_members
            WHERE channel_id = $1 AND user_id = $2
            "#,
        )
        .bind(channel_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_member(&self, channel_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM channel_members
                WHERE channel_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(channel_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }
}
