//! Authentication Handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::application::dto::request::{LoginRequest, RefreshTokenRequest, RegisterRequest};
use crate::application::dto::response::{RegisterResponse, TokenResponse, UserResponse};
use crate::application::services::{AuthError, AuthService, AuthServiceImpl};
use crate::infrastructure::repositories::{PgRefreshTokenRepository, PgUserRepository};
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn auth_service(state: &AppState) -> AuthServiceImpl<PgUserRepository, PgRefreshTokenRepository> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let token_repo = Arc::new(PgRefreshTokenRepository::new(state.db.clone()));
    AuthServiceImpl::new(user_repo, token_repo, state.settings.jwt.clone())
}

/// Register a new user. Registration does not log the user in; the client
/// follows up with a login call.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    body.validate()
        .map_err(validation_error)?;

    let user = auth_service(&state)
        .register(&body.username, &body.email, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::EmailExists => AppError::Conflict("Email already exists".into()),
            AuthError::UsernameExists => AppError::Conflict("Username already exists".into()),
            e => AppError::Internal(e.to_string()),
        })?;

    let response = RegisterResponse {
        user: UserResponse::from_user(user, true),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with credentials
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    body.validate()
        .map_err(validation_error)?;

    let tokens = auth_service(&state)
        .authenticate(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(TokenResponse::from(tokens)))
}

/// Refresh access token (rotates the refresh token)
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = auth_service(&state)
        .refresh_token(&body.refresh_token)
        .await
        .map_err(|e| match e {
            AuthError::SessionNotFound => {
                AppError::Unauthorized("Invalid or expired refresh token".into())
            }
            AuthError::TokenExpired => AppError::Unauthorized("Refresh token expired".into()),
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(TokenResponse::from(tokens)))
}

/// Logout (revoke refresh token)
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<StatusCode, AppError> {
    // Revoke token (ignore errors for logout)
    let _ = auth_service(&state).revoke_token(&body.refresh_token).await;

    Ok(StatusCode::NO_CONTENT)
}
