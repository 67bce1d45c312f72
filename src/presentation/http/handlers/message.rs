//! Message Handlers
//!
//! The durable write path lives here: a message is persisted first, and
//! only a successful write is published to the live event bus. Broadcast
//! outcome is invisible to the HTTP caller.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::{MessageQueryParams, SendMessageRequest};
use crate::application::dto::response::{MessagePageResponse, MessageResponse};
use crate::application::services::{
    MessageError, MessageQueryDto, MessageService, MessageServiceImpl,
};
use crate::infrastructure::repositories::{PgChannelRepository, PgMessageRepository};
use crate::presentation::middleware::AuthUser;
use crate::presentation::websocket::BusEvent;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn message_service(
    state: &AppState,
) -> MessageServiceImpl<PgMessageRepository, PgChannelRepository> {
    let message_repo = Arc::new(PgMessageRepository::new(state.db.clone()));
    let channel_repo = Arc::new(PgChannelRepository::new(state.db.clone()));
    MessageServiceImpl::new(message_repo, channel_repo)
}

/// Fetch paginated messages for a channel.
///
/// Query params:
/// - `limit`: page size (default 20, max 50)
/// - `cursor`: message id; load messages older than this one
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<Uuid>,
    Query(query): Query<MessageQueryParams>,
) -> Result<Json<MessagePageResponse>, AppError> {
    let query_dto = MessageQueryDto {
        // A cursor that is not a valid id is treated like no cursor
        cursor: query.cursor.and_then(|s| s.parse().ok()),
        limit: query.limit,
    };

    let page = message_service(&state)
        .list_messages(channel_id, auth.user_id, query_dto)
        .await
        .map_err(|e| match e {
            MessageError::NotAMember => {
                AppError::Forbidden("You are not a member of this channel".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(MessagePageResponse {
        messages: page.messages,
        next_cursor: page.next_cursor,
    }))
}

/// Send a message into a channel
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    body.validate()
        .map_err(validation_error)?;

    let message = message_service(&state)
        .send_message(channel_id, auth.user_id, &body.content)
        .await
        .map_err(|e| match e {
            MessageError::NotAMember => {
                AppError::Forbidden("You are not a member of this channel".into())
            }
            MessageError::EmptyContent => {
                AppError::BadRequest("Message content is required".into())
            }
            MessageError::ContentTooLong => {
                AppError::BadRequest("Message content too long (max 2000 characters)".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    // The write is durable; let the realtime layer know. Fire-and-forget:
    // delivery cannot fail this request.
    state.bus.publish(BusEvent::MessageCreated(message.clone()));

    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}
