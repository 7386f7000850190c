//! Friendship Service
//!
//! Friend requests, acceptance, removal, listing and user search.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::notifier::Notifier;
use crate::application::dto::event::{
    FriendRemovedEvent, FriendRequestAcceptedEvent, FriendRequestEvent,
};
use crate::application::dto::response::{FriendshipWithUser, UserSearchResponse};
use crate::application::dto::RealtimeEvent;
use crate::domain::{Friendship, FriendshipRepository, FriendshipStatus, RegisteredUser, UserRepository};
use crate::shared::error::AppError;
use crate::shared::validation::{total_pages, PageParams};

/// Shortest accepted search query, after trimming
pub const MIN_SEARCH_LENGTH: usize = 3;

/// Friendship service trait
#[async_trait]
pub trait FriendshipService: Send + Sync {
    /// Create a pending request from `requester` to `recipient_id`
    async fn send_friend_request(
        &self,
        requester: &RegisteredUser,
        recipient_id: i64,
    ) -> Result<Friendship, AppError>;

    /// Accept the pending request `requester_id` sent to `recipient`
    async fn accept_friend_request(
        &self,
        recipient: &RegisteredUser,
        requester_id: i64,
    ) -> Result<Friendship, AppError>;

    /// Delete a friendship in either direction; also rejects a pending request
    async fn remove_friendship(&self, user_id: i64, friend_id: i64) -> Result<(), AppError>;

    async fn get_user_friendships(
        &self,
        user_id: i64,
        status_filter: Option<FriendshipStatus>,
    ) -> Result<Vec<FriendshipWithUser>, AppError>;

    /// Nickname search over active users other than the caller
    async fn search_users(
        &self,
        query: &str,
        current_user_id: i64,
        page: PageParams,
    ) -> Result<UserSearchResponse, AppError>;
}

/// FriendshipService implementation
pub struct FriendshipServiceImpl<U, F>
where
    U: UserRepository,
    F: FriendshipRepository,
{
    user_repo: Arc<U>,
    friendship_repo: Arc<F>,
    notifier: Arc<dyn Notifier>,
}

impl<U, F> FriendshipServiceImpl<U, F>
where
    U: UserRepository,
    F: FriendshipRepository,
{
    pub fn new(user_repo: Arc<U>, friendship_repo: Arc<F>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            user_repo,
            friendship_repo,
            notifier,
        }
    }

    async fn require_active_user(&self, user_id: i64) -> Result<RegisteredUser, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }
}

#[async_trait]
impl<U, F> FriendshipService for FriendshipServiceImpl<U, F>
where
    U: UserRepository + 'static,
    F: FriendshipRepository + 'static,
{
    #[instrument(skip(self, requester), fields(requester_id = requester.id))]
    async fn send_friend_request(
        &self,
        requester: &RegisteredUser,
        recipient_id: i64,
    ) -> Result<Friendship, AppError> {
        self.require_active_user(recipient_id).await?;

        if requester.id == recipient_id {
            return Err(AppError::BadRequest(
                "Cannot send friend request to yourself".into(),
            ));
        }

        if let Some(existing) = self
            .friendship_repo
            .find_between(requester.id, recipient_id)
            .await?
        {
            return Err(match existing.status {
                FriendshipStatus::Pending => {
                    AppError::Conflict("Friend request already pending".into())
                }
                FriendshipStatus::Accepted => {
                    AppError::Conflict("Users are already friends".into())
                }
            });
        }

        let friendship = self
            .friendship_repo
            .create_pending(requester.id, recipient_id)
            .await?;

        info!(friendship_id = friendship.id, "Friend request sent");
        self.notifier.notify_user(
            recipient_id,
            RealtimeEvent::FriendRequestReceived(FriendRequestEvent::from_sender(requester)),
        );

        Ok(friendship)
    }

    #[instrument(skip(self, recipient), fields(recipient_id = recipient.id))]
    async fn accept_friend_request(
        &self,
        recipient: &RegisteredUser,
        requester_id: i64,
    ) -> Result<Friendship, AppError> {
        self.require_active_user(requester_id).await?;

        let request = self
            .friendship_repo
            .find_directed(requester_id, recipient.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Friend request not found".into()))?;

        if request.status != FriendshipStatus::Pending {
            return Err(AppError::BadRequest(
                "Friend request is not pending".into(),
            ));
        }

        let friendship = self
            .friendship_repo
            .update_status(request.id, FriendshipStatus::Accepted)
            .await?;

        info!(friendship_id = friendship.id, "Friend request accepted");
        self.notifier.notify_user(
            requester_id,
            RealtimeEvent::FriendRequestAccepted(FriendRequestAcceptedEvent::from_accepter(
                recipient,
            )),
        );

        Ok(friendship)
    }

    #[instrument(skip(self))]
    async fn remove_friendship(&self, user_id: i64, friend_id: i64) -> Result<(), AppError> {
        self.require_active_user(friend_id).await?;

        let friendship = self
            .friendship_repo
            .find_between(user_id, friend_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Friendship not found".into()))?;

        self.friendship_repo.delete(friendship.id).await?;

        info!(friendship_id = friendship.id, "Friendship removed");
        self.notifier.notify_user(
            user_id,
            RealtimeEvent::FriendRemoved(FriendRemovedEvent { friend_id }),
        );
        self.notifier.notify_user(
            friend_id,
            RealtimeEvent::FriendRemoved(FriendRemovedEvent { friend_id: user_id }),
        );

        Ok(())
    }

    async fn get_user_friendships(
        &self,
        user_id: i64,
        status_filter: Option<FriendshipStatus>,
    ) -> Result<Vec<FriendshipWithUser>, AppError> {
        let entries = self
            .friendship_repo
            .list_for_user(user_id, status_filter)
            .await?;

        Ok(entries
            .into_iter()
            .map(|entry| FriendshipWithUser::from_entry(entry, user_id))
            .collect())
    }

    #[instrument(skip(self))]
    async fn search_users(
        &self,
        query: &str,
        current_user_id: i64,
        page: PageParams,
    ) -> Result<UserSearchResponse, AppError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LENGTH {
            return Err(AppError::BadRequest(
                "Search query must be at least 3 characters".into(),
            ));
        }

        let page = page.validate()?;
        let (users, total) = self
            .user_repo
            .search_active(query, current_user_id, page.page_size, page.offset())
            .await?;

        Ok(UserSearchResponse {
            users: users.into_iter().map(Into::into).collect(),
            total,
            page: page.page,
            page_size: page.page_size,
            total_pages: total_pages(total, page.page_size),
        })
    }
}
