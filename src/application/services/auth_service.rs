//! Authentication Service
//!
//! Handles user registration, credential verification, and JWT/refresh
//! token management.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::domain::{RefreshToken, RefreshTokenRepository, User, UserRepository};

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user. Does not log the user in.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError>;

    /// Authenticate user with credentials
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens, AuthError>;

    /// Exchange a refresh token for a new token pair (rotates the refresh token)
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;

    /// Revoke refresh token (logout)
    async fn revoke_token(&self, refresh_token: &str) -> Result<(), AuthError>;
}

/// Authentication tokens response
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Email already exists")]
    EmailExists,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Refresh token not found or revoked")]
    SessionNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// AuthService implementation
pub struct AuthServiceImpl<U, R>
where
    U: UserRepository,
    R: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<R>,
    jwt_settings: JwtSettings,
}

impl<U, R> AuthServiceImpl<U, R>
where
    U: UserRepository,
    R: RefreshTokenRepository,
{
    /// Create a new AuthServiceImpl
    pub fn new(user_repo: Arc<U>, token_repo: Arc<R>, jwt_settings: JwtSettings) -> Self {
        Self {
            user_repo,
            token_repo,
            jwt_settings,
        }
    }

    /// Hash a password using Argon2id
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Generate access and refresh tokens
    fn generate_tokens(&self, user_id: Uuid) -> Result<AuthTokens, AuthError> {
        let now = Utc::now();
        let access_expiry = now + Duration::minutes(self.jwt_settings.access_token_expiry_minutes);

        let access_claims = Claims {
            sub: user_id.to_string(),
            exp: access_expiry.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        // Opaque refresh token, never decoded: random_uuid.random_uuid
        let refresh_token = format!("{}.{}", Uuid::new_v4(), Uuid::new_v4());

        Ok(AuthTokens {
            access_token,
            refresh_token,
            expires_in: self.jwt_settings.access_token_expiry_minutes * 60,
            token_type: "Bearer".to_string(),
        })
    }

    /// Hash refresh token for storage
    fn hash_refresh_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Store the hash of a freshly issued refresh token
    async fn store_refresh_token(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AuthError> {
        let token = RefreshToken {
            id: Uuid::new_v4(),
            user_id,
            token_hash: self.hash_refresh_token(refresh_token),
            expires_at: Utc::now() + Duration::days(self.jwt_settings.refresh_token_expiry_days),
            created_at: Utc::now(),
        };

        self.token_repo
            .create(&token)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(())
    }

    /// Decode and validate access token
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl<U, R> AuthService for AuthServiceImpl<U, R>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
{
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        if self
            .user_repo
            .email_exists(email)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            return Err(AuthError::EmailExists);
        }

        if self
            .user_repo
            .username_exists(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            return Err(AuthError::UsernameExists);
        }

        let password_hash = self.hash_password(password)?;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: Utc::now(),
        };

        let created_user = self
            .user_repo
            .create(&user)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(created_user)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens, AuthError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.generate_tokens(user.id)?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        Ok(tokens)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let token_hash = self.hash_refresh_token(refresh_token);

        let stored = self
            .token_repo
            .find_by_hash(&token_hash)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::SessionNotFound)?;

        if stored.is_expired() {
            // Expired rows are useless; drop them on sight
            let _ = self.token_repo.delete_by_hash(&token_hash).await;
            return Err(AuthError::TokenExpired);
        }

        // Rotate: the presented token is consumed, a new pair is issued
        self.token_repo
            .delete_by_hash(&token_hash)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let tokens = self.generate_tokens(stored.user_id)?;
        self.store_refresh_token(stored.user_id, &tokens.refresh_token)
            .await?;

        Ok(tokens)
    }

    async fn revoke_token(&self, refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = self.hash_refresh_token(refresh_token);

        self.token_repo
            .delete_by_hash(&token_hash)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(())
    }
}
