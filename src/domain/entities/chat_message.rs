//! Chat message entity and repository trait.
//!
//! Maps to the `chat_messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A message exchanged inside a friendship.
///
/// At least one of `content` / `image_path` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub friendship_id: i64,
    pub sender_id: i64,

    /// Text body; `None` for image-only messages
    pub content: Option<String>,

    /// `{bucket}/chat-images/{friendship_id}/...` object path
    pub image_path: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewChatMessage {
    pub friendship_id: i64,
    pub sender_id: i64,
    pub content: Option<String>,
    pub image_path: Option<String>,
}

/// Repository trait for chat message data access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    async fn create(&self, message: &NewChatMessage) -> Result<ChatMessage, AppError>;

    /// Newest-first page of a conversation. With `before`, only ids strictly below it.
    async fn list_before(
        &self,
        friendship_id: i64,
        before: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError>;

    /// Number of messages in the conversation.
    async fn count(&self, friendship_id: i64) -> Result<i64, AppError>;

    /// Latest message of each of the given conversations (conversations without messages are absent).
    async fn latest_per_friendship(
        &self,
        friendship_ids: &[i64],
    ) -> Result<Vec<ChatMessage>, AppError>;
}
