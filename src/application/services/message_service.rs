//! Message Service
//!
//! The durable write path for messages and cursor-paginated history reads.
//! Membership is checked here, before any message row is touched; the live
//! broadcast layer downstream assumes pre-validated writes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{ChannelRepository, Message, MessageRepository, MessageWithAuthor};

/// Default page size when the client does not pass a limit
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Hard cap on page size
const MAX_PAGE_SIZE: i64 = 50;

/// Maximum message content length in characters
const MAX_CONTENT_LENGTH: usize = 2000;

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Fetch a page of channel history for a member, newest page first,
    /// returned oldest-to-newest for display.
    async fn list_messages(
        &self,
        channel_id: Uuid,
        user_id: Uuid,
        query: MessageQueryDto,
    ) -> Result<MessagePage, MessageError>;

    /// Persist a message for a member of the channel. The returned value is
    /// what the store wrote, joined with the author; the caller publishes it
    /// to the live push path only after this succeeds.
    async fn send_message(
        &self,
        channel_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<MessageWithAuthor, MessageError>;
}

/// Message history query parameters
#[derive(Debug, Clone, Default)]
pub struct MessageQueryDto {
    /// Message id cursor; the page is strictly older than this message.
    /// An unknown cursor falls back to "now" rather than failing.
    pub cursor: Option<Uuid>,
    pub limit: Option<i32>,
}

/// One page of channel history
#[derive(Debug, Clone)]
pub struct MessagePage {
    /// Messages ordered oldest to newest
    pub messages: Vec<MessageWithAuthor>,
    /// Cursor for the next (older) page; None when exhausted
    pub next_cursor: Option<Uuid>,
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Not a member of this channel")]
    NotAMember,

    #[error("Message content is required")]
    EmptyContent,

    #[error("Message too long")]
    ContentTooLong,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// MessageService implementation
pub struct MessageServiceImpl<M, C>
where
    M: MessageRepository,
    C: ChannelRepository,
{
    message_repo: Arc<M>,
    channel_repo: Arc<C>,
}

impl<M, C> MessageServiceImpl<M, C>
where
    M: MessageRepository,
    C: ChannelRepository,
{
    pub fn new(message_repo: Arc<M>, channel_repo: Arc<C>) -> Self {
        Self {
            message_repo,
            channel_repo,
        }
    }

    async fn check_membership(&self, channel_id: Uuid, user_id: Uuid) -> Result<(), MessageError> {
        let is_member = self
            .channel_repo
            .is_member(channel_id, user_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        if is_member {
            Ok(())
        } else {
            Err(MessageError::NotAMember)
        }
    }
}

#[async_trait]
impl<M, C> MessageService for MessageServiceImpl<M, C>
where
    M: MessageRepository + 'static,
    C: ChannelRepository + 'static,
{
    async fn list_messages(
        &self,
        channel_id: Uuid,
        user_id: Uuid,
        query: MessageQueryDto,
    ) -> Result<MessagePage, MessageError> {
        self.check_membership(channel_id, user_id).await?;

        let take = query
            .limit
            .map(i64::from)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        // Resolve the id cursor to its timestamp; an unknown or absent
        // cursor means "start from now"
        let before = match query.cursor {
            Some(cursor_id) => self
                .message_repo
                .find_by_id(cursor_id)
                .await
                .map_err(|e| MessageError::Internal(e.to_string()))?
                .map(|m| m.created_at)
                .unwrap_or_else(Utc::now),
            None => Utc::now(),
        };

        let mut messages = self
            .message_repo
            .list_before(channel_id, before, take)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        // A full page means there may be older messages; the oldest entry
        // of this page becomes the next cursor
        let next_cursor = if messages.len() as i64 == take {
            messages.last().map(|m| m.message.id)
        } else {
            None
        };

        messages.reverse();

        Ok(MessagePage {
            messages,
            next_cursor,
        })
    }

    async fn send_message(
        &self,
        channel_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<MessageWithAuthor, MessageError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MessageError::EmptyContent);
        }
        if content.len() > MAX_CONTENT_LENGTH {
            return Err(MessageError::ContentTooLong);
        }

        self.check_membership(channel_id, author_id).await?;

        let message = Message {
            id: Uuid::now_v7(),
            channel_id,
            author_id,
            content: content.to_string(),
            // The database default is authoritative; this value is only a
            // placeholder for the insert
            created_at: Utc::now(),
        };

        self.message_repo
            .create(&message)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{Channel, ChannelRepository, MessageAuthor};
    use crate::shared::error::AppError;

    /// In-memory message store, ordered by insertion
    #[derive(Default)]
    struct InMemoryMessageRepo {
        messages: Mutex<Vec<MessageWithAuthor>>,
    }

    impl InMemoryMessageRepo {
        fn seed(&self, channel_id: Uuid, count: usize, start: DateTime<Utc>) -> Vec<Uuid> {
            let mut ids = Vec::new();
            let mut messages = self.messages.lock().unwrap();
            for i in 0..count {
                let id = Uuid::now_v7();
                ids.push(id);
                messages.push(MessageWithAuthor {
                    message: Message {
                        id,
                        channel_id,
                        author_id: Uuid::new_v4(),
                        content: format!("message {}", i),
                        created_at: start + Duration::seconds(i as i64),
                    },
                    author: MessageAuthor {
                        id: Uuid::new_v4(),
                        username: "alice".into(),
                    },
                });
            }
            ids
        }
    }

    #[async_trait]
    impl MessageRepository for InMemoryMessageRepo {
        async fn create(&self, message: &Message) -> Result<MessageWithAuthor, AppError> {
            let stored = MessageWithAuthor {
                message: message.clone(),
                author: MessageAuthor {
                    id: message.author_id,
                    username: "alice".into(),
                },
            };
            self.messages.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, AppError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .find(|m| m.message.id == id)
                .map(|m| m.message.clone()))
        }

        async fn list_before(
            &self,
            channel_id: Uuid,
            before: DateTime<Utc>,
            limit: i64,
        ) -> Result<Vec<MessageWithAuthor>, AppError> {
            let mut page: Vec<MessageWithAuthor> = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.message.channel_id == channel_id && m.message.created_at < before)
                .cloned()
                .collect();
            page.sort_by(|a, b| b.message.created_at.cmp(&a.message.created_at));
            page.truncate(limit as usize);
            Ok(page)
        }
    }

    /// Membership-only channel fake
    #[derive(Default)]
    struct InMemoryChannelRepo {
        members: Mutex<HashSet<(Uuid, Uuid)>>,
    }

    impl InMemoryChannelRepo {
        fn with_member(channel_id: Uuid, user_id: Uuid) -> Self {
            let repo = Self::default();
            repo.members.lock().unwrap().insert((channel_id, user_id));
            repo
        }
    }

    #[async_trait]
    impl ChannelRepository for InMemoryChannelRepo {
        async fn create(&self, channel: &Channel) -> Result<Channel, AppError> {
            Ok(channel.clone())
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Channel>, AppError> {
            Ok(None)
        }

        async fn list_all(&self) -> Result<Vec<Channel>, AppError> {
            Ok(Vec::new())
        }

        async fn add_member(&self, channel_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
            Ok(self.members.lock().unwrap().insert((channel_id, user_id)))
        }

        async fn remove_member(&self, channel_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
            self.members.lock().unwrap().remove(&(channel_id, user_id));
            Ok(())
        }

        async fn is_member(&self, channel_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
            Ok(self.members.lock().unwrap().contains(&(channel_id, user_id)))
        }
    }

    fn service(
        channel_id: Uuid,
        user_id: Uuid,
    ) -> (
        MessageServiceImpl<InMemoryMessageRepo, InMemoryChannelRepo>,
        Arc<InMemoryMessageRepo>,
    ) {
        let message_repo = Arc::new(InMemoryMessageRepo::default());
        let channel_repo = Arc::new(InMemoryChannelRepo::with_member(channel_id, user_id));
        (
            MessageServiceImpl::new(message_repo.clone(), channel_repo),
            message_repo,
        )
    }

    #[tokio::test]
    async fn non_member_cannot_read_or_write() {
        let channel_id = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let (svc, _) = service(channel_id, Uuid::new_v4());

        let read = svc
            .list_messages(channel_id, outsider, MessageQueryDto::default())
            .await;
        assert!(matches!(read, Err(MessageError::NotAMember)));

        let write = svc.send_message(channel_id, outsider, "hi").await;
        assert!(matches!(write, Err(MessageError::NotAMember)));
    }

    #[tokio::test]
    async fn send_rejects_blank_and_oversized_content() {
        let channel_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let (svc, _) = service(channel_id, user_id);

        let blank = svc.send_message(channel_id, user_id, "   ").await;
        assert!(matches!(blank, Err(MessageError::EmptyContent)));

        let oversized = "x".repeat(MAX_CONTENT_LENGTH + 1);
        let too_long = svc.send_message(channel_id, user_id, &oversized).await;
        assert!(matches!(too_long, Err(MessageError::ContentTooLong)));
    }

    #[tokio::test]
    async fn send_trims_content() {
        let channel_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let (svc, _) = service(channel_id, user_id);

        let stored = svc
            .send_message(channel_id, user_id, "  hello  ")
            .await
            .unwrap();
        assert_eq!(stored.message.content, "hello");
    }

    #[tokio::test]
    async fn pagination_walks_history_oldest_first_per_page() {
        let channel_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let (svc, repo) = service(channel_id, user_id);
        repo.seed(channel_id, 5, Utc::now() - Duration::minutes(5));

        // First page: the 3 newest, returned oldest-to-newest
        let page = svc
            .list_messages(
                channel_id,
                user_id,
                MessageQueryDto {
                    cursor: None,
                    limit: Some(3),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.messages.len(), 3);
        let contents: Vec<&str> = page
            .messages
            .iter()
            .map(|m| m.message.content.as_str())
            .collect();
        assert_eq!(contents, vec!["message 2", "message 3", "message 4"]);
        let cursor = page.next_cursor.expect("full page must yield a cursor");
        // The cursor is the oldest message of the page
        assert_eq!(cursor, page.messages.first().unwrap().message.id);

        // Second page: the remaining 2, no further cursor
        let rest = svc
            .list_messages(
                channel_id,
                user_id,
                MessageQueryDto {
                    cursor: Some(cursor),
                    limit: Some(3),
                },
            )
            .await
            .unwrap();
        let contents: Vec<&str> = rest
            .messages
            .iter()
            .map(|m| m.message.content.as_str())
            .collect();
        assert_eq!(contents, vec!["message 0", "message 1"]);
        assert_eq!(rest.next_cursor, None);
    }

    #[tokio::test]
    async fn single_message_exhausts_in_one_full_page_then_empty() {
        let channel_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let (svc, repo) = service(channel_id, user_id);
        let ids = repo.seed(channel_id, 1, Utc::now() - Duration::minutes(1));

        let page = svc
            .list_messages(
                channel_id,
                user_id,
                MessageQueryDto {
                    cursor: None,
                    limit: Some(1),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.messages.len(), 1);
        // Page is full, so a cursor is handed out even though history is done
        assert_eq!(page.next_cursor, Some(ids[0]));

        let empty = svc
            .list_messages(
                channel_id,
                user_id,
                MessageQueryDto {
                    cursor: page.next_cursor,
                    limit: Some(1),
                },
            )
            .await
            .unwrap();
        assert!(empty.messages.is_empty());
        assert_eq!(empty.next_cursor, None);
    }

    #[tokio::test]
    async fn unknown_cursor_falls_back_to_now() {
        let channel_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let (svc, repo) = service(channel_id, user_id);
        repo.seed(channel_id, 2, Utc::now() - Duration::minutes(2));

        let page = svc
            .list_messages(
                channel_id,
                user_id,
                MessageQueryDto {
                    cursor: Some(Uuid::new_v4()),
                    limit: Some(10),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.messages.len(), 2);
    }

    #[tokio::test]
    async fn limit_is_capped() {
        let channel_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let (svc, repo) = service(channel_id, user_id);
        repo.seed(channel_id, 60, Utc::now() - Duration::minutes(60));

        let page = svc
            .list_messages(
                channel_id,
                user_id,
                MessageQueryDto {
                    cursor: None,
                    limit: Some(500),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.messages.len(), MAX_PAGE_SIZE as usize);
    }
}
