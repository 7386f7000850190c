//! Guest user entity and session store trait.
//!
//! Guests live only in the cache; nothing is written to the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Default avatar assigned to every guest.
pub const GUEST_PFP_PATH: &str = "/images/avatar/1.png";

/// Anonymous player identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestUser {
    pub guest_id: Uuid,

    /// `guest` followed by six characters, e.g. `guest042137`
    pub nickname: String,

    pub created_at: DateTime<Utc>,

    pub pfp_path: String,
}

/// Cache-backed storage for guest sessions.
///
/// Session payloads are opaque JSON strings; the store only handles keys,
/// expiry and the set of active nicknames.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuestSessionStore: Send + Sync {
    /// Whether `nickname` belongs to an active guest.
    async fn is_nickname_taken(&self, nickname: &str) -> Result<bool, AppError>;

    /// Atomically store the session payload with a TTL and reserve the nickname.
    async fn save(
        &self,
        guest_id: Uuid,
        nickname: &str,
        payload: &str,
        ttl_seconds: u64,
    ) -> Result<(), AppError>;

    /// Raw session payload, `None` when missing or expired.
    async fn load(&self, guest_id: Uuid) -> Result<Option<String>, AppError>;

    /// Reset the TTL. Returns `false` when the session does not exist.
    async fn touch(&self, guest_id: Uuid, ttl_seconds: u64) -> Result<bool, AppError>;

    /// Atomically drop the session and release `nickname` if given.
    /// Returns `false` when the session did not exist.
    async fn remove(&self, guest_id: Uuid, nickname: Option<String>) -> Result<bool, AppError>;
}
