//! Redis-backed guest session store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::keys;
use crate::domain::GuestSessionStore;
use crate::shared::error::AppError;

/// Stores each guest as a JSON string under `guest_session:{id}` and tracks
/// active nicknames in the `guest_nicknames` set.
#[derive(Clone)]
pub struct RedisGuestStore {
    conn: ConnectionManager,
}

impl RedisGuestStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl GuestSessionStore for RedisGuestStore {
    #[instrument(skip(self), level = "debug")]
    async fn is_nickname_taken(&self, nickname: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let taken: bool = conn.sismember(keys::GUEST_NICKNAMES, nickname).await?;
        Ok(taken)
    }

    #[instrument(skip(self, payload), level = "debug")]
    async fn save(
        &self,
        guest_id: Uuid,
        nickname: &str,
        payload: &str,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        let key = keys::guest_session(guest_id);
        let mut conn = self.conn.clone();

        let _: () = redis::pipe()
            .atomic()
            .set_ex(&key, payload, ttl_seconds)
            .ignore()
            .sadd(keys::GUEST_NICKNAMES, nickname)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(key = %key, ttl = ttl_seconds, "Guest session stored");
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn load(&self, guest_id: Uuid) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(keys::guest_session(guest_id)).await?;
        Ok(payload)
    }

    #[instrument(skip(self), level = "debug")]
    async fn touch(&self, guest_id: Uuid, ttl_seconds: u64) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();

        // EXPIRE returns 1 if the timeout was set, 0 if the key does not exist
        let result: i32 = conn
            .expire(keys::guest_session(guest_id), ttl_seconds as i64)
            .await?;

        Ok(result == 1)
    }

    #[instrument(skip(self), level = "debug")]
    async fn remove(&self, guest_id: Uuid, nickname: Option<String>) -> Result<bool, AppError> {
        let key = keys::guest_session(guest_id);
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key);
        if let Some(nickname) = &nickname {
            pipe.srem(keys::GUEST_NICKNAMES, nickname).ignore();
        }

        let (deleted,): (u64,) = pipe.query_async(&mut conn).await?;
        debug!(key = %key, deleted = deleted, "Guest session removed");

        Ok(deleted > 0)
    }
}
