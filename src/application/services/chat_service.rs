//! Chat Service
//!
//! Friend-to-friend messaging: access checks, image upload URLs, message
//! persistence, history and the recent conversations list.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::application::dto::event::ConversationUpdatedEvent;
use crate::application::dto::response::{
    ChatHistoryResponse, ChatMessageResponse, ConversationResponse, PresignedUploadResponse,
};
use crate::config::UploadSettings;
use crate::domain::{
    object_name_of, ChatMessage, ChatMessageRepository, Friendship, FriendshipRepository,
    FriendshipStatus, ImagePath, NewChatMessage, ObjectStore, RegisteredUser, UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::validation::check_limit;

/// Largest page for history and conversation lists
pub const MAX_CHAT_LIMIT: i64 = 100;

/// An accepted friendship with both members loaded.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub friendship: Friendship,
    pub user: RegisteredUser,
    pub friend: RegisteredUser,
}

/// A freshly stored message with everything needed to fan it out.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: ChatMessage,
    pub image_url: Option<String>,
    pub sender: RegisteredUser,
    pub recipient: RegisteredUser,
}

impl SentMessage {
    /// The message as shown to the sender (`is_mine = true`) or the recipient.
    pub fn view(&self, is_mine: bool) -> ChatMessageResponse {
        ChatMessageResponse {
            id: self.message.id,
            sender_id: self.sender.id,
            sender_nickname: self.sender.nickname.clone(),
            content: self.message.content.clone(),
            image_url: self.image_url.clone(),
            created_at: self.message.created_at.to_rfc3339(),
            is_mine,
        }
    }

    /// Conversation list refresh for one of the two members.
    pub fn conversation_update(&self, for_user_id: i64) -> ConversationUpdatedEvent {
        let friend = if for_user_id == self.sender.id {
            &self.recipient
        } else {
            &self.sender
        };
        ConversationUpdatedEvent {
            friendship_id: self.message.friendship_id,
            friend_id: friend.id,
            friend_nickname: friend.nickname.clone(),
            last_message_time: self.message.created_at.to_rfc3339(),
            last_message_content: self.message.content.clone(),
            last_message_is_mine: for_user_id == self.sender.id,
        }
    }
}

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Accepted friendship between two active users
    async fn get_friendship_by_id(&self, user_id: i64, friend_id: i64)
        -> Result<ChatContext, AppError>;

    /// Presigned PUT URL for an image to be attached to a message
    async fn generate_image_upload_url(
        &self,
        user_id: i64,
        friend_id: i64,
        filename: &str,
        content_type: &str,
    ) -> Result<PresignedUploadResponse, AppError>;

    /// Check that `image_path` points into this conversation's image directory
    async fn validate_image_path(
        &self,
        image_path: Option<&str>,
        friendship_id: i64,
        verify_exists: bool,
    ) -> Result<(), AppError>;

    async fn save_message(
        &self,
        friendship_id: i64,
        sender_id: i64,
        content: Option<String>,
        image_path: Option<String>,
    ) -> Result<ChatMessage, AppError>;

    /// Newest-first history page before `before_message_id`
    async fn get_chat_history(
        &self,
        user_id: i64,
        friend_id: i64,
        before_message_id: Option<i64>,
        limit: i64,
    ) -> Result<ChatHistoryResponse, AppError>;

    /// Whether `user_id` is a member of the friendship
    async fn verify_chat_access(&self, friendship_id: i64, user_id: i64) -> Result<bool, AppError>;

    async fn get_recent_conversations(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ConversationResponse>, AppError>;

    /// Validate, store and describe a message sent over the gateway
    async fn process_send_message(
        &self,
        sender_id: i64,
        friend_id: i64,
        content: Option<String>,
        image_path: Option<String>,
    ) -> Result<SentMessage, AppError>;
}

/// ChatService implementation
pub struct ChatServiceImpl<U, F, M>
where
    U: UserRepository,
    F: FriendshipRepository,
    M: ChatMessageRepository,
{
    user_repo: Arc<U>,
    friendship_repo: Arc<F>,
    message_repo: Arc<M>,
    object_store: Arc<dyn ObjectStore>,
    uploads: UploadSettings,
}

impl<U, F, M> ChatServiceImpl<U, F, M>
where
    U: UserRepository,
    F: FriendshipRepository,
    M: ChatMessageRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        friendship_repo: Arc<F>,
        message_repo: Arc<M>,
        object_store: Arc<dyn ObjectStore>,
        uploads: UploadSettings,
    ) -> Self {
        Self {
            user_repo,
            friendship_repo,
            message_repo,
            object_store,
            uploads,
        }
    }

    fn image_url_ttl(&self) -> Duration {
        Duration::from_secs(self.uploads.image_url_expiry_hours * 3600)
    }

    /// Presigned GET URL for a stored image path. Signing failures degrade to `None`.
    fn image_url(&self, image_path: Option<&str>) -> Option<String> {
        let path = image_path?;
        match self
            .object_store
            .presigned_get_url(object_name_of(path), self.image_url_ttl())
        {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, image_path = path, "Failed to sign image URL");
                None
            }
        }
    }

    fn view(
        &self,
        message: &ChatMessage,
        viewer_id: i64,
        ctx: &ChatContext,
    ) -> ChatMessageResponse {
        let sender = if message.sender_id == ctx.user.id {
            &ctx.user
        } else {
            &ctx.friend
        };
        ChatMessageResponse {
            id: message.id,
            sender_id: message.sender_id,
            sender_nickname: sender.nickname.clone(),
            content: message.content.clone(),
            image_url: self.image_url(message.image_path.as_deref()),
            created_at: message.created_at.to_rfc3339(),
            is_mine: message.sender_id == viewer_id,
        }
    }
}

#[async_trait]
impl<U, F, M> ChatService for ChatServiceImpl<U, F, M>
where
    U: UserRepository + 'static,
    F: FriendshipRepository + 'static,
    M: ChatMessageRepository + 'static,
{
    async fn get_friendship_by_id(
        &self,
        user_id: i64,
        friend_id: i64,
    ) -> Result<ChatContext, AppError> {
        let user = self.user_repo.find_by_id(user_id).await?.filter(|u| u.is_active);
        let friend = self.user_repo.find_by_id(friend_id).await?.filter(|u| u.is_active);

        let (Some(user), Some(friend)) = (user, friend) else {
            return Err(AppError::NotFound("One or both users not found".into()));
        };

        let friendship = self
            .friendship_repo
            .find_between(user_id, friend_id)
            .await?
            .filter(Friendship::is_accepted)
            .ok_or_else(|| {
                AppError::Forbidden("You must be friends with this user to chat".into())
            })?;

        Ok(ChatContext {
            friendship,
            user,
            friend,
        })
    }

    #[instrument(skip(self))]
    async fn generate_image_upload_url(
        &self,
        user_id: i64,
        friend_id: i64,
        filename: &str,
        content_type: &str,
    ) -> Result<PresignedUploadResponse, AppError> {
        if !self
            .uploads
            .allowed_image_types
            .iter()
            .any(|t| t == content_type)
        {
            return Err(AppError::validation_with(
                "Invalid image type",
                json!({
                    "content_type": content_type,
                    "allowed": self.uploads.allowed_image_types,
                }),
            ));
        }

        let ctx = self.get_friendship_by_id(user_id, friend_id).await?;

        let path = ImagePath::generate(
            &self.object_store.bucket(),
            ctx.friendship.id,
            filename,
            Utc::now(),
        );
        let ttl = Duration::from_secs(self.uploads.upload_url_expiry_minutes * 60);

        let upload_url = self
            .object_store
            .presigned_put_url(path.object_name(), ttl)
            .map_err(|e| {
                warn!(error = %e, "Presigning upload failed");
                AppError::Internal("Failed to generate upload URL".into())
            })?;

        debug!(object_name = path.object_name(), "Upload URL issued");
        Ok(PresignedUploadResponse {
            upload_url,
            object_name: path.object_name().to_string(),
            image_path: path.full_path(),
            expires_in_minutes: self.uploads.upload_url_expiry_minutes,
        })
    }

    async fn validate_image_path(
        &self,
        image_path: Option<&str>,
        friendship_id: i64,
        verify_exists: bool,
    ) -> Result<(), AppError> {
        let Some(image_path) = image_path else {
            return Ok(());
        };

        let path = ImagePath::parse(image_path, &self.object_store.bucket())?;

        if path.friendship_id() != friendship_id {
            return Err(AppError::Forbidden(
                "Image path does not belong to this conversation".into(),
            ));
        }

        if !verify_exists {
            return Ok(());
        }

        let Some(size) = self.object_store.object_size(path.object_name()).await? else {
            return Err(AppError::NotFound("Image file not found in storage".into()));
        };

        let max_size = self.uploads.max_image_size;
        if size > max_size {
            // oversized uploads are never referenced, so drop them now
            if let Err(e) = self.object_store.delete_object(path.object_name()).await {
                warn!(error = %e, object_name = path.object_name(), "Failed to delete oversized image");
            }
            return Err(AppError::validation_with(
                "Image exceeds maximum size",
                json!({ "size": size, "max_size": max_size }),
            ));
        }

        Ok(())
    }

    async fn save_message(
        &self,
        friendship_id: i64,
        sender_id: i64,
        content: Option<String>,
        image_path: Option<String>,
    ) -> Result<ChatMessage, AppError> {
        let content = content.filter(|c| !c.is_empty());
        let image_path = image_path.filter(|p| !p.is_empty());

        if content.is_none() && image_path.is_none() {
            return Err(AppError::BadRequest(
                "Either content or image must be provided".into(),
            ));
        }

        self.message_repo
            .create(&NewChatMessage {
                friendship_id,
                sender_id,
                content,
                image_path,
            })
            .await
    }

    async fn get_chat_history(
        &self,
        user_id: i64,
        friend_id: i64,
        before_message_id: Option<i64>,
        limit: i64,
    ) -> Result<ChatHistoryResponse, AppError> {
        let limit = check_limit(limit, MAX_CHAT_LIMIT)?;
        let ctx = self.get_friendship_by_id(user_id, friend_id).await?;

        // one extra row tells whether an older page exists
        let mut rows = self
            .message_repo
            .list_before(ctx.friendship.id, before_message_id, limit + 1)
            .await?;
        let has_more = rows.len() as i64 > limit;
        rows.truncate(limit as usize);

        let total = self.message_repo.count(ctx.friendship.id).await?;
        let next_cursor = if has_more {
            rows.last().map(|m| m.id)
        } else {
            None
        };

        let messages = rows
            .iter()
            .map(|m| self.view(m, user_id, &ctx))
            .collect();

        Ok(ChatHistoryResponse {
            messages,
            total,
            limit,
            has_more,
            next_cursor,
            friend_user_id: ctx.friend.id,
            friend_nickname: ctx.friend.nickname,
        })
    }

    async fn verify_chat_access(&self, friendship_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self
            .friendship_repo
            .find_by_id(friendship_id)
            .await?
            .is_some_and(|f| f.involves(user_id)))
    }

    async fn get_recent_conversations(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ConversationResponse>, AppError> {
        let limit = check_limit(limit, MAX_CHAT_LIMIT)?;

        let entries = self
            .friendship_repo
            .list_for_user(user_id, Some(FriendshipStatus::Accepted))
            .await?;
        let ids: Vec<i64> = entries.iter().map(|e| e.friendship.id).collect();

        let latest: HashMap<i64, ChatMessage> = self
            .message_repo
            .latest_per_friendship(&ids)
            .await?
            .into_iter()
            .map(|m| (m.friendship_id, m))
            .collect();

        let mut conversations: Vec<(Option<chrono::DateTime<Utc>>, ConversationResponse)> = entries
            .into_iter()
            .map(|entry| {
                let last = latest.get(&entry.friendship.id);
                let response = ConversationResponse {
                    friendship_id: entry.friendship.id,
                    friend_id: entry.friend.id,
                    friend_nickname: entry.friend.nickname,
                    friend_email: entry.friend.email,
                    last_message_time: last.map(|m| m.created_at.to_rfc3339()),
                    last_message_content: last.and_then(|m| m.content.clone()),
                    last_message_is_mine: last.map(|m| m.sender_id == user_id),
                    unread_count: 0,
                };
                (last.map(|m| m.created_at), response)
            })
            .collect();

        // newest first; conversations without messages sort last
        conversations.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(conversations
            .into_iter()
            .take(limit as usize)
            .map(|(_, c)| c)
            .collect())
    }

    #[instrument(skip(self, content, image_path))]
    async fn process_send_message(
        &self,
        sender_id: i64,
        friend_id: i64,
        content: Option<String>,
        image_path: Option<String>,
    ) -> Result<SentMessage, AppError> {
        let ctx = self.get_friendship_by_id(sender_id, friend_id).await?;

        self.validate_image_path(image_path.as_deref(), ctx.friendship.id, true)
            .await?;

        let message = self
            .save_message(ctx.friendship.id, sender_id, content, image_path)
            .await?;
        let image_url = self.image_url(message.image_path.as_deref());

        info!(message_id = message.id, friendship_id = message.friendship_id, "Message stored");
        Ok(SentMessage {
            message,
            image_url,
            sender: ctx.user,
            recipient: ctx.friend,
        })
    }
}
