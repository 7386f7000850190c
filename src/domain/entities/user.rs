//! Registered user entity and repository trait.
//!
//! Maps to the `registered_users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A registered (non-guest) account.
///
/// Maps to the `registered_users` table:
/// - id: SERIAL PRIMARY KEY
/// - nickname: VARCHAR(255) NOT NULL UNIQUE
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NULL
/// - is_active: BOOLEAN NOT NULL DEFAULT TRUE
/// - pfp_path: VARCHAR(500) NULL
/// - description: VARCHAR(1000) NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,

    /// Public, unique display name (3-255 characters)
    pub nickname: String,

    /// Login e-mail (unique)
    pub email: String,

    /// Argon2 password hash; `None` for accounts without a local password
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// Inactive accounts cannot log in and are invisible to other users
    pub is_active: bool,

    /// Avatar image path, e.g. `/images/avatar/3.png`
    pub pfp_path: Option<String>,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Default for RegisteredUser {
    fn default() -> Self {
        Self {
            id: 0,
            nickname: String::new(),
            email: String::new(),
            password_hash: None,
            is_active: true,
            pfp_path: None,
            description: None,
            created_at: Utc::now(),
        }
    }
}

/// Values needed to insert a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub pfp_path: Option<String>,
    pub description: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.pfp_path.is_none()
            && self.description.is_none()
    }
}

/// Repository trait for registered user data access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id, active or not.
    async fn find_by_id(&self, id: i64) -> Result<Option<RegisteredUser>, AppError>;

    /// Find a user by e-mail (case-insensitive).
    async fn find_by_email(&self, email: &str) -> Result<Option<RegisteredUser>, AppError>;

    /// Insert a new, active account.
    ///
    /// Returns `Conflict` when the e-mail or nickname is taken.
    async fn create(&self, user: &NewUser) -> Result<RegisteredUser, AppError>;

    /// Apply a partial update.
    async fn update(&self, id: i64, changes: &UserChanges) -> Result<RegisteredUser, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    async fn nickname_exists(&self, nickname: &str) -> Result<bool, AppError>;

    /// Case-insensitive substring search on nickname over active users,
    /// excluding `exclude_id`, ordered by nickname. Returns the page and the total match count.
    async fn search_active(
        &self,
        query: &str,
        exclude_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RegisteredUser>, i64), AppError>;
}
