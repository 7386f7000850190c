//! User Service
//!
//! Profile reads and updates for registered users.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::auth_service::hash_password;
use crate::application::dto::request::UpdateUserRequest;
use crate::domain::{RegisteredUser, UserChanges, UserRepository};
use crate::shared::error::AppError;

/// Number of stock avatars served under `/images/avatar/`
pub const AVATAR_COUNT: u32 = 16;

/// Paths of all stock avatars, `/images/avatar/1.png` to `/images/avatar/16.png`.
pub fn avatar_paths() -> Vec<String> {
    (1..=AVATAR_COUNT)
        .map(|i| format!("/images/avatar/{}.png", i))
        .collect()
}

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Apply a partial update to the caller's own profile
    async fn update_profile(
        &self,
        current: &RegisteredUser,
        update: UpdateUserRequest,
    ) -> Result<RegisteredUser, AppError>;

    /// Profile of an active user
    async fn get_public_profile(&self, user_id: i64) -> Result<RegisteredUser, AppError>;
}

/// UserService implementation
pub struct UserServiceImpl<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> UserServiceImpl<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl<U> UserService for UserServiceImpl<U>
where
    U: UserRepository + 'static,
{
    #[instrument(skip(self, current, update), fields(user_id = current.id))]
    async fn update_profile(
        &self,
        current: &RegisteredUser,
        update: UpdateUserRequest,
    ) -> Result<RegisteredUser, AppError> {
        let mut changes = UserChanges {
            pfp_path: update.pfp_path,
            description: update.description,
            ..Default::default()
        };

        if let Some(nickname) = update.nickname.filter(|n| *n != current.nickname) {
            if self.user_repo.nickname_exists(&nickname).await? {
                return Err(AppError::Conflict("Nickname already taken".into()));
            }
            changes.nickname = Some(nickname);
        }

        if let Some(email) = update
            .email
            .filter(|e| !e.eq_ignore_ascii_case(&current.email))
        {
            if self.user_repo.email_exists(&email).await? {
                return Err(AppError::Conflict("Email already registered".into()));
            }
            changes.email = Some(email);
        }

        if let Some(password) = update.password {
            changes.password_hash = Some(hash_password(&password).map_err(AppError::from)?);
        }

        if changes.is_empty() {
            return Ok(current.clone());
        }

        let updated = self.user_repo.update(current.id, &changes).await?;
        info!("Profile updated");
        Ok(updated)
    }

    async fn get_public_profile(&self, user_id: i64) -> Result<RegisteredUser, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }
}
