//! RefreshToken entity and repository trait.
//!
//! Maps to the `refresh_tokens` table. Only the SHA-256 hash of a refresh
//! token is stored; the opaque token itself never touches the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::shared::error::AppError;

/// A stored refresh token hash.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Primary key
    pub id: Uuid,

    /// Owner of the token
    pub user_id: Uuid,

    /// SHA-256 hex digest of the opaque refresh token
    pub token_hash: String,

    /// Expiry timestamp; expired rows are treated as absent
    pub expires_at: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Check whether the token is expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Repository trait for RefreshToken data access operations.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Store a new refresh token hash.
    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, AppError>;

    /// Find a stored token by its hash.
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, AppError>;

    /// Delete a stored token by its hash. Unknown hashes are a no-op.
    async fn delete_by_hash(&self, token_hash: &str) -> Result<(), AppError>;
}
