//! Channel Service
//!
//! Channel listing, creation, and membership management.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Channel, ChannelRepository};
use crate::shared::error::AppError;

/// Channel service trait
#[async_trait]
pub trait ChannelService: Send + Sync {
    /// List all channels, oldest first
    async fn list_channels(&self) -> Result<Vec<Channel>, ChannelError>;

    /// Create a channel; the creator becomes its first member
    async fn create_channel(
        &self,
        creator_id: Uuid,
        request: CreateChannelDto,
    ) -> Result<Channel, ChannelError>;

    /// Join a channel. Joining twice is reported, not rejected.
    async fn join_channel(&self, channel_id: Uuid, user_id: Uuid)
        -> Result<JoinOutcome, ChannelError>;

    /// Leave a channel. Leaving a channel you are not in is a no-op.
    async fn leave_channel(&self, channel_id: Uuid, user_id: Uuid) -> Result<(), ChannelError>;
}

/// Create channel request
#[derive(Debug, Clone)]
pub struct CreateChannelDto {
    pub name: String,
    pub is_private: bool,
}

/// Result of a join operation
#[derive(Debug, Clone, Copy)]
pub struct JoinOutcome {
    pub joined: bool,
    pub already_member: bool,
}

/// Channel service errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel not found")]
    NotFound,

    #[error("Channel name is required")]
    InvalidName,

    #[error("Channel name already exists")]
    NameTaken,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// ChannelService implementation
pub struct ChannelServiceImpl<C>
where
    C: ChannelRepository,
{
    channel_repo: Arc<C>,
}

impl<C> ChannelServiceImpl<C>
where
    C: ChannelRepository,
{
    pub fn new(channel_repo: Arc<C>) -> Self {
        Self { channel_repo }
    }
}

#[async_trait]
impl<C> ChannelService for ChannelServiceImpl<C>
where
    C: ChannelRepository + 'static,
{
    async fn list_channels(&self) -> Result<Vec<Channel>, ChannelError> {
        self.channel_repo
            .list_all()
            .await
            .map_err(|e| ChannelError::Internal(e.to_string()))
    }

    async fn create_channel(
        &self,
        creator_id: Uuid,
        request: CreateChannelDto,
    ) -> Result<Channel, ChannelError> {
        let name = Channel::normalize_name(&request.name).ok_or(ChannelError::InvalidName)?;

        let channel = Channel {
            id: Uuid::new_v4(),
            name,
            is_private: request.is_private,
            created_by: creator_id,
            created_at: Utc::now(),
        };

        self.channel_repo.create(&channel).await.map_err(|e| match &e {
            AppError::Database(db) if is_unique_violation(db) => ChannelError::NameTaken,
            _ => ChannelError::Internal(e.to_string()),
        })
    }

    async fn join_channel(
        &self,
        channel_id: Uuid,
        user_id: Uuid,
    ) -> Result<JoinOutcome, ChannelError> {
        self.channel_repo
            .find_by_id(channel_id)
            .await
            .map_err(|e| ChannelError::Internal(e.to_string()))?
            .ok_or(ChannelError::NotFound)?;

        let newly_added = self
            .channel_repo
            .add_member(channel_id, user_id)
            .await
            .map_err(|e| ChannelError::Internal(e.to_string()))?;

        Ok(JoinOutcome {
            joined: true,
            already_member: !newly_added,
        })
    }

    async fn leave_channel(&self, channel_id: Uuid, user_id: Uuid) -> Result<(), ChannelError> {
        self.channel_repo
            .remove_member(channel_id, user_id)
            .await
            .map_err(|e| ChannelError::Internal(e.to_string()))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
