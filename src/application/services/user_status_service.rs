//! User Status Service
//!
//! Presence derived from gateway sessions plus in-memory in-game and
//! in-lobby markers, pushed to friends as `FRIEND_STATUS_UPDATE`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, error, instrument};

use super::notifier::Notifier;
use crate::application::dto::RealtimeEvent;
use crate::domain::{FriendshipRepository, LobbyPresence, StatusSnapshot, UserStatus};
use crate::shared::error::AppError;

/// User status service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStatusService: Send + Sync {
    /// Ids of users with an accepted friendship with `user_id`
    async fn get_friends_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    /// Current status of every friend
    async fn get_initial_friend_statuses(&self, user_id: i64)
        -> Result<Vec<StatusSnapshot>, AppError>;

    /// The caller's own status; always at least online
    fn get_my_status(&self, user_id: i64) -> StatusSnapshot;

    /// Status of `target_id`, visible to friends only
    async fn get_user_status(
        &self,
        viewer_id: i64,
        target_id: i64,
    ) -> Result<StatusSnapshot, AppError>;

    /// First gateway session opened
    async fn user_connected(&self, user_id: i64);

    /// Last gateway session closed
    async fn user_disconnected(&self, user_id: i64);

    /// `ACTIVITY_UPDATE`: enter a game or return to plain online
    async fn set_activity(&self, user_id: i64, game_name: Option<String>);

    /// Record the lobby a user sits in, or `None` after leaving one.
    /// Friends are told when the user is connected.
    async fn set_lobby(&self, user_id: i64, lobby: Option<LobbyPresence>);
}

/// UserStatusService implementation
pub struct UserStatusServiceImpl<F>
where
    F: FriendshipRepository,
{
    friendship_repo: Arc<F>,
    notifier: Arc<dyn Notifier>,
    /// user id -> game name
    in_game: DashMap<i64, String>,
    /// user id -> lobby
    in_lobby: DashMap<i64, LobbyPresence>,
}

impl<F> UserStatusServiceImpl<F>
where
    F: FriendshipRepository,
{
    pub fn new(friendship_repo: Arc<F>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            friendship_repo,
            notifier,
            in_game: DashMap::new(),
            in_lobby: DashMap::new(),
        }
    }

    /// Status of a connected user: a game wins over a lobby.
    fn current(&self, user_id: i64) -> StatusSnapshot {
        if let Some(game) = self.in_game.get(&user_id) {
            return StatusSnapshot::in_game(user_id, game.value().clone());
        }
        match self.in_lobby.get(&user_id) {
            Some(lobby) => StatusSnapshot::in_lobby(user_id, lobby.value()),
            None => StatusSnapshot::new(user_id, UserStatus::Online),
        }
    }

    /// Offline unless connected.
    fn snapshot(&self, user_id: i64) -> StatusSnapshot {
        if !self.notifier.is_online(user_id) {
            return StatusSnapshot::new(user_id, UserStatus::Offline);
        }
        self.current(user_id)
    }

    /// Push `snapshot` to every online friend.
    /// Failures are logged and swallowed.
    async fn notify_friends(&self, snapshot: StatusSnapshot) {
        let friend_ids = match self.friendship_repo.accepted_friend_ids(snapshot.user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(user_id = snapshot.user_id, error = %e, "Failed to load friends for status update");
                return;
            }
        };

        let mut delivered = 0;
        for friend_id in friend_ids {
            if self.notifier.is_online(friend_id) {
                delivered += self
                    .notifier
                    .notify_user(friend_id, RealtimeEvent::FriendStatusUpdate(snapshot.clone()));
            }
        }
        debug!(
            user_id = snapshot.user_id,
            status = %snapshot.status,
            delivered,
            "Status pushed to friends"
        );
    }
}

#[async_trait]
impl<F> UserStatusService for UserStatusServiceImpl<F>
where
    F: FriendshipRepository + 'static,
{
    async fn get_friends_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        self.friendship_repo.accepted_friend_ids(user_id).await
    }

    async fn get_initial_friend_statuses(
        &self,
        user_id: i64,
    ) -> Result<Vec<StatusSnapshot>, AppError> {
        let friend_ids = self.get_friends_ids(user_id).await?;
        Ok(friend_ids.into_iter().map(|id| self.snapshot(id)).collect())
    }

    fn get_my_status(&self, user_id: i64) -> StatusSnapshot {
        self.current(user_id)
    }

    async fn get_user_status(
        &self,
        viewer_id: i64,
        target_id: i64,
    ) -> Result<StatusSnapshot, AppError> {
        let friend_ids = self.get_friends_ids(viewer_id).await?;
        if !friend_ids.contains(&target_id) {
            return Err(AppError::Forbidden(
                "You can only query the status of your friends".into(),
            ));
        }
        Ok(self.snapshot(target_id))
    }

    #[instrument(skip(self))]
    async fn user_connected(&self, user_id: i64) {
        self.notify_friends(self.current(user_id)).await;
    }

    #[instrument(skip(self))]
    async fn user_disconnected(&self, user_id: i64) {
        self.in_game.remove(&user_id);
        let mut snapshot = StatusSnapshot::new(user_id, UserStatus::Offline);
        snapshot.last_seen = Some(Utc::now());
        self.notify_friends(snapshot).await;
    }

    #[instrument(skip(self))]
    async fn set_activity(&self, user_id: i64, game_name: Option<String>) {
        match game_name.filter(|g| !g.trim().is_empty()) {
            Some(game) => {
                self.in_game.insert(user_id, game);
            }
            None => {
                self.in_game.remove(&user_id);
            }
        }
        self.notify_friends(self.current(user_id)).await;
    }

    #[instrument(skip(self))]
    async fn set_lobby(&self, user_id: i64, lobby: Option<LobbyPresence>) {
        match lobby {
            Some(lobby) => {
                self.in_lobby.insert(user_id, lobby);
            }
            None => {
                self.in_lobby.remove(&user_id);
            }
        }
        if self.notifier.is_online(user_id) {
            self.notify_friends(self.current(user_id)).await;
        }
    }
}
