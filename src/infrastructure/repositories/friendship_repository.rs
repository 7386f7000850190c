//! Friendship Repository Implementation
//!
//! PostgreSQL implementation of the FriendshipRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{
    FriendEntry, Friendship, FriendshipRepository, FriendshipStatus, RegisteredUser,
};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct FriendshipRow {
    id: i64,
    user_id_1: i64,
    user_id_2: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl FriendshipRow {
    fn into_friendship(self) -> Result<Friendship, AppError> {
        let status = FriendshipStatus::parse(&self.status).ok_or_else(|| {
            AppError::Internal(format!(
                "Unknown friendship status '{}' on friendship {}",
                self.status, self.id
            ))
        })?;

        Ok(Friendship {
            id: self.id,
            user_id_1: self.user_id_1,
            user_id_2: self.user_id_2,
            status,
            created_at: self.created_at,
        })
    }
}

/// Friendship joined with the other member's account.
#[derive(Debug, sqlx::FromRow)]
struct FriendEntryRow {
    id: i64,
    user_id_1: i64,
    user_id_2: i64,
    status: String,
    created_at: DateTime<Utc>,
    friend_id: i64,
    friend_nickname: String,
    friend_email: String,
    friend_is_active: bool,
    friend_pfp_path: Option<String>,
    friend_description: Option<String>,
    friend_created_at: DateTime<Utc>,
}

impl FriendEntryRow {
    fn into_entry(self) -> Result<FriendEntry, AppError> {
        let friend = RegisteredUser {
            id: self.friend_id,
            nickname: self.friend_nickname,
            email: self.friend_email,
            password_hash: None,
            is_active: self.friend_is_active,
            pfp_path: self.friend_pfp_path,
            description: self.friend_description,
            created_at: self.friend_created_at,
        };
        let friendship = FriendshipRow {
            id: self.id,
            user_id_1: self.user_id_1,
            user_id_2: self.user_id_2,
            status: self.status,
            created_at: self.created_at,
        }
        .into_friendship()?;

        Ok(FriendEntry { friendship, friend })
    }
}

const FRIENDSHIP_COLUMNS: &str = "id, user_id_1, user_id_2, status, created_at";

/// PostgreSQL friendship repository implementation.
#[derive(Clone)]
pub struct PgFriendshipRepository {
    pool: PgPool,
}

impl PgFriendshipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FriendshipRepository for PgFriendshipRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Friendship>, AppError> {
        let row = sqlx::query_as::<_, FriendshipRow>(&format!(
            "SELECT {} FROM friendships WHERE id = $1",
            FRIENDSHIP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_friendship()).transpose()
    }

    async fn find_between(&self, user_a: i64, user_b: i64) -> Result<Option<Friendship>, AppError> {
        let row = sqlx::query_as::<_, FriendshipRow>(&format!(
            r#"
            SELECT {}
            FROM friendships
            WHERE (user_id_1 = $1 AND user_id_2 = $2)
               OR (user_id_1 = $2 AND user_id_2 = $1)
            "#,
            FRIENDSHIP_COLUMNS
        ))
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_friendship()).transpose()
    }

    async fn find_directed(
        &self,
        requester: i64,
        recipient: i64,
    ) -> Result<Option<Friendship>, AppError> {
        let row = sqlx::query_as::<_, FriendshipRow>(&format!(
            "SELECT {} FROM friendships WHERE user_id_1 = $1 AND user_id_2 = $2",
            FRIENDSHIP_COLUMNS
        ))
        .bind(requester)
        .bind(recipient)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_friendship()).transpose()
    }

    async fn create_pending(&self, requester: i64, recipient: i64) -> Result<Friendship, AppError> {
        let row = sqlx::query_as::<_, FriendshipRow>(&format!(
            r#"
            INSERT INTO friendships (user_id_1, user_id_2, status)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            FRIENDSHIP_COLUMNS
        ))
        .bind(requester)
        .bind(recipient)
        .bind(FriendshipStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Friend request already pending".to_string())
            }
            _ => AppError::Database(e),
        })?;

        row.into_friendship()
    }

    async fn update_status(
        &self,
        id: i64,
        status: FriendshipStatus,
    ) -> Result<Friendship, AppError> {
        let row = sqlx::query_as::<_, FriendshipRow>(&format!(
            "UPDATE friendships SET status = $2 WHERE id = $1 RETURNING {}",
            FRIENDSHIP_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Friendship not found".to_string()))?;

        row.into_friendship()
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM friendships WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Friendship not found".to_string()));
        }

        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        status: Option<FriendshipStatus>,
    ) -> Result<Vec<FriendEntry>, AppError> {
        let rows = sqlx::query_as::<_, FriendEntryRow>(
            r#"
            SELECT f.id, f.user_id_1, f.user_id_2, f.status, f.created_at,
                   u.id AS friend_id,
                   u.nickname AS friend_nickname,
                   u.email AS friend_email,
                   u.is_active AS friend_is_active,
                   u.pfp_path AS friend_pfp_path,
                   u.description AS friend_description,
                   u.created_at AS friend_created_at
            FROM friendships f
            JOIN registered_users u
              ON u.id = CASE WHEN f.user_id_1 = $1 THEN f.user_id_2 ELSE f.user_id_1 END
            WHERE (f.user_id_1 = $1 OR f.user_id_2 = $1)
              AND ($2::VARCHAR IS NULL OR f.status = $2)
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_entry()).collect()
    }

    async fn accepted_friend_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CASE WHEN user_id_1 = $1 THEN user_id_2 ELSE user_id_1 END
            FROM friendships
            WHERE (user_id_1 = $1 OR user_id_2 = $1) AND status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
