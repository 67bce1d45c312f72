//! Refresh Token Repository Implementation
//!
//! PostgreSQL implementation of the RefreshTokenRepository trait.
//! Stores only SHA-256 hashes of refresh tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{RefreshToken, RefreshTokenRepository};
use crate::shared::error::AppError;

/// Internal row type matching the refresh_tokens table schema.
#[derive(Debug, sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn into_token(self) -> RefreshToken {
        RefreshToken {
            id: self.id,
            user_id: self.user_id,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL refresh token repository implementation.
#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    /// Creates a new PgRefreshTokenRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, AppError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_token())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, AppError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_token()))
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
