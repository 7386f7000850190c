//! Friendship entity and repository trait.
//!
//! Maps to the `friendships` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::RegisteredUser;
use crate::shared::error::AppError;

/// Friendship lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

impl FriendshipStatus {
    /// Convert from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

impl std::fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relationship between two registered users.
///
/// `user_id_1` is always the requester, `user_id_2` the recipient.
/// At most one row exists per unordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: i64,
    pub user_id_1: i64,
    pub user_id_2: i64,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    /// Whether `user_id` is one of the two members.
    pub fn involves(&self, user_id: i64) -> bool {
        self.user_id_1 == user_id || self.user_id_2 == user_id
    }

    /// The member that is not `user_id`.
    pub fn other_member(&self, user_id: i64) -> i64 {
        if self.user_id_1 == user_id {
            self.user_id_2
        } else {
            self.user_id_1
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == FriendshipStatus::Accepted
    }
}

/// A friendship seen from one member, joined with the other member's account.
#[derive(Debug, Clone, PartialEq)]
pub struct FriendEntry {
    pub friendship: Friendship,
    pub friend: RegisteredUser,
}

/// Repository trait for friendship data access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Friendship>, AppError>;

    /// Friendship between two users in either direction.
    async fn find_between(&self, user_a: i64, user_b: i64) -> Result<Option<Friendship>, AppError>;

    /// Friendship requested by `requester` to `recipient` only.
    async fn find_directed(
        &self,
        requester: i64,
        recipient: i64,
    ) -> Result<Option<Friendship>, AppError>;

    /// Insert a `pending` row with `requester` as `user_id_1`.
    async fn create_pending(&self, requester: i64, recipient: i64) -> Result<Friendship, AppError>;

    async fn update_status(
        &self,
        id: i64,
        status: FriendshipStatus,
    ) -> Result<Friendship, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// All friendships of `user_id` joined with the other member, optionally filtered by status.
    async fn list_for_user(
        &self,
        user_id: i64,
        status: Option<FriendshipStatus>,
    ) -> Result<Vec<FriendEntry>, AppError>;

    /// Ids of users with an accepted friendship with `user_id`.
    async fn accepted_friend_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;
}
