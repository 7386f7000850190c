//! Guest Service
//!
//! Short-lived anonymous identities kept in the cache.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{GuestSessionStore, GuestUser, GUEST_PFP_PATH};
use crate::shared::error::AppError;

/// Session lifetime, refreshed by `extend_guest_session` (8 hours)
pub const GUEST_SESSION_TTL_SECONDS: u64 = 8 * 60 * 60;

/// Random nickname attempts before falling back to a UUID fragment
const NICKNAME_ATTEMPTS: usize = 10;

/// Guest service trait
#[async_trait]
pub trait GuestService: Send + Sync {
    async fn create_guest_session(&self) -> Result<GuestUser, AppError>;

    /// `None` when missing, expired or unreadable
    async fn get_guest_session(&self, guest_id: Uuid) -> Result<Option<GuestUser>, AppError>;

    /// Reset the TTL; `false` when the session does not exist
    async fn extend_guest_session(&self, guest_id: Uuid) -> Result<bool, AppError>;

    /// Drop the session and release its nickname; `false` when it did not exist
    async fn delete_guest_session(&self, guest_id: Uuid) -> Result<bool, AppError>;
}

/// GuestService implementation
pub struct GuestServiceImpl<S>
where
    S: GuestSessionStore,
{
    store: Arc<S>,
}

impl<S> GuestServiceImpl<S>
where
    S: GuestSessionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// `guest` + six random digits, unique among active guests when possible.
    async fn generate_nickname(&self) -> Result<String, AppError> {
        for _ in 0..NICKNAME_ATTEMPTS {
            let candidate = random_nickname();
            if !self.store.is_nickname_taken(&candidate).await? {
                return Ok(candidate);
            }
        }

        let fallback = fallback_nickname(Uuid::new_v4());
        warn!(nickname = %fallback, "Random guest nicknames exhausted, using UUID fragment");
        Ok(fallback)
    }
}

fn random_nickname() -> String {
    format!("guest{:06}", rand::rng().random_range(0..1_000_000u32))
}

fn fallback_nickname(id: Uuid) -> String {
    format!("guest{}", &id.simple().to_string()[..6])
}

#[async_trait]
impl<S> GuestService for GuestServiceImpl<S>
where
    S: GuestSessionStore + 'static,
{
    async fn create_guest_session(&self) -> Result<GuestUser, AppError> {
        let guest = GuestUser {
            guest_id: Uuid::new_v4(),
            nickname: self.generate_nickname().await?,
            created_at: Utc::now(),
            pfp_path: GUEST_PFP_PATH.to_string(),
        };

        let payload = serde_json::to_string(&guest)
            .map_err(|e| AppError::Internal(format!("Failed to encode guest session: {}", e)))?;

        self.store
            .save(
                guest.guest_id,
                &guest.nickname,
                &payload,
                GUEST_SESSION_TTL_SECONDS,
            )
            .await?;

        info!(guest_id = %guest.guest_id, nickname = %guest.nickname, "Guest session created");
        Ok(guest)
    }

    async fn get_guest_session(&self, guest_id: Uuid) -> Result<Option<GuestUser>, AppError> {
        let Some(payload) = self.store.load(guest_id).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<GuestUser>(&payload) {
            Ok(guest) => Ok(Some(guest)),
            Err(e) => {
                warn!(guest_id = %guest_id, error = %e, "Corrupt guest session payload");
                Ok(None)
            }
        }
    }

    async fn extend_guest_session(&self, guest_id: Uuid) -> Result<bool, AppError> {
        self.store.touch(guest_id, GUEST_SESSION_TTL_SECONDS).await
    }

    async fn delete_guest_session(&self, guest_id: Uuid) -> Result<bool, AppError> {
        let nickname = self
            .get_guest_session(guest_id)
            .await?
            .map(|guest| guest.nickname);

        let removed = self.store.remove(guest_id, nickname).await?;
        if removed {
            info!(guest_id = %guest_id, "Guest session deleted");
        }
        Ok(removed)
    }
}
