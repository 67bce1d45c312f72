//! Channel Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::CreateChannelRequest;
use crate::application::dto::response::{
    ChannelListResponse, ChannelResponse, JoinChannelResponse, LeaveChannelResponse,
};
use crate::application::services::{
    ChannelError, ChannelService, ChannelServiceImpl, CreateChannelDto,
};
use crate::infrastructure::repositories::PgChannelRepository;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn channel_service(state: &AppState) -> ChannelServiceImpl<PgChannelRepository> {
    ChannelServiceImpl::new(Arc::new(PgChannelRepository::new(state.db.clone())))
}

/// List all channels
pub async fn list_channels(
    State(state): State<AppState>,
) -> Result<Json<ChannelListResponse>, AppError> {
    let channels = channel_service(&state)
        .list_channels()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ChannelListResponse {
        channels: channels.into_iter().map(ChannelResponse::from).collect(),
    }))
}

/// Create a new channel
pub async fn create_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<ChannelResponse>), AppError> {
    body.validate()
        .map_err(validation_error)?;

    let request = CreateChannelDto {
        name: body.name,
        is_private: body.is_private,
    };

    let channel = channel_service(&state)
        .create_channel(auth.user_id, request)
        .await
        .map_err(|e| match e {
            ChannelError::InvalidName => AppError::BadRequest("Channel name is required".into()),
            ChannelError::NameTaken => AppError::Conflict("Channel name already exists".into()),
            e => AppError::Internal(e.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(ChannelResponse::from(channel))))
}

/// Join a channel. Re-joining reports `already_member` instead of failing.
pub async fn join_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<Uuid>,
) -> Result<(StatusCode, Json<JoinChannelResponse>), AppError> {
    let outcome = channel_service(&state)
        .join_channel(channel_id, auth.user_id)
        .await
        .map_err(|e| match e {
            ChannelError::NotFound => AppError::NotFound("Channel not found".into()),
            e => AppError::Internal(e.to_string()),
        })?;

    let status = if outcome.already_member {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(JoinChannelResponse::from(outcome))))
}

/// Leave a channel. Leaving a channel you are not in is a no-op.
pub async fn leave_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<Uuid>,
) -> Result<Json<LeaveChannelResponse>, AppError> {
    channel_service(&state)
        .leave_channel(channel_id, auth.user_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(LeaveChannelResponse { left: true }))
}
