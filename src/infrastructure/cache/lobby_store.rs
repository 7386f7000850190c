//! Redis-backed lobby store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, instrument};

use super::keys;
use crate::domain::LobbyStore;
use crate::shared::error::AppError;

/// Stores each lobby as a JSON string under `lobby:{code}` and points every
/// member at it through `user_lobby:{user_id}`.
#[derive(Clone)]
pub struct RedisLobbyStore {
    conn: ConnectionManager,
}

impl RedisLobbyStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl LobbyStore for RedisLobbyStore {
    #[instrument(skip(self), level = "debug")]
    async fn exists(&self, lobby_code: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(keys::lobby(lobby_code)).await?;
        Ok(exists)
    }

    #[instrument(skip(self), level = "debug")]
    async fn load(&self, lobby_code: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(keys::lobby(lobby_code)).await?;
        Ok(payload)
    }

    #[instrument(skip(self, payload), level = "debug")]
    async fn save(
        &self,
        lobby_code: &str,
        payload: &str,
        member_ids: &[i64],
        released: Option<i64>,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        let key = keys::lobby(lobby_code);
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().set_ex(&key, payload, ttl_seconds).ignore();
        for user_id in member_ids {
            pipe.set_ex(keys::user_lobby(*user_id), lobby_code, ttl_seconds)
                .ignore();
        }
        if let Some(user_id) = released {
            pipe.del(keys::user_lobby(user_id)).ignore();
        }

        let _: () = pipe.query_async(&mut conn).await?;
        debug!(key = %key, members = member_ids.len(), ttl = ttl_seconds, "Lobby stored");
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn user_lobby(&self, user_id: i64) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let code: Option<String> = conn.get(keys::user_lobby(user_id)).await?;
        Ok(code)
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, lobby_code: &str, member_ids: &[i64]) -> Result<(), AppError> {
        let key = keys::lobby(lobby_code);
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        for user_id in member_ids {
            pipe.del(keys::user_lobby(*user_id)).ignore();
        }

        let _: () = pipe.query_async(&mut conn).await?;
        debug!(key = %key, "Lobby removed");
        Ok(())
    }
}
