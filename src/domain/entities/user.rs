//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Represents a user account in the chat system.
///
/// Maps to the `users` table:
/// - id: UUID PRIMARY KEY
/// - username: VARCHAR(32) NOT NULL UNIQUE
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    pub id: Uuid,

    /// Username (2-32 characters, unique)
    pub username: String,

    /// Email address (unique)
    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Repository trait for User data access operations.
///
/// Implementations of this trait handle the actual database interactions.
/// The trait is defined in the domain layer to maintain dependency inversion.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user.
    async fn create(&self, user: &User) -> Result<User, AppError>;

    /// Find a user by its ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Find a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Check whether an email address is already registered.
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Check whether a username is already taken.
    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;
}
