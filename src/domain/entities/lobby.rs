//! Lobby entity and store trait.
//!
//! A lobby is a pre-game room of 2 to 6 players identified by a short code.
//! Lobbies live only in the cache and expire when left idle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::RegisteredUser;
use crate::domain::LobbyPresence;
use crate::shared::error::AppError;

/// Length of a lobby code such as `K7Q2ZD`
pub const LOBBY_CODE_LEN: usize = 6;

pub const MIN_LOBBY_PLAYERS: u8 = 2;
pub const MAX_LOBBY_PLAYERS: u8 = 6;

/// Canonical form of a user-supplied lobby code.
pub fn normalize_lobby_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyMember {
    pub user_id: i64,
    pub nickname: String,
    pub joined_at: DateTime<Utc>,
}

impl LobbyMember {
    pub fn from_user(user: &RegisteredUser) -> Self {
        Self {
            user_id: user.id,
            nickname: user.nickname.clone(),
            joined_at: Utc::now(),
        }
    }
}

/// Lobby state stored as one payload.
///
/// `members` is kept in join order, so the first entry is the oldest member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lobby {
    pub lobby_code: String,
    pub host_id: i64,
    pub max_players: u8,
    pub members: Vec<LobbyMember>,
    pub created_at: DateTime<Utc>,
}

impl Lobby {
    /// New lobby with `host` as its only member.
    pub fn new(lobby_code: String, host: &RegisteredUser, max_players: u8) -> Self {
        Self {
            lobby_code,
            host_id: host.id,
            max_players,
            members: vec![LobbyMember::from_user(host)],
            created_at: Utc::now(),
        }
    }

    pub fn current_players(&self) -> usize {
        self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.current_players() >= self.max_players as usize
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn member_ids(&self) -> Vec<i64> {
        self.members.iter().map(|m| m.user_id).collect()
    }

    /// Drop `user_id` from the member list. When the host leaves and others
    /// remain, the oldest remaining member becomes host and is returned.
    pub fn remove_member(&mut self, user_id: i64) -> Option<i64> {
        self.members.retain(|m| m.user_id != user_id);
        if self.host_id != user_id {
            return None;
        }
        let successor = self.members.first()?.user_id;
        self.host_id = successor;
        Some(successor)
    }

    pub fn presence(&self) -> LobbyPresence {
        LobbyPresence {
            lobby_code: self.lobby_code.clone(),
            filled_slots: self.current_players().min(u8::MAX as usize) as u8,
            max_slots: self.max_players,
        }
    }
}

/// Cache-backed storage for lobbies.
///
/// Lobby payloads are opaque JSON strings. Each member also gets a pointer
/// from their user id to the lobby code; both expire together.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LobbyStore: Send + Sync {
    /// Whether a lobby with this code is live.
    async fn exists(&self, lobby_code: &str) -> Result<bool, AppError>;

    /// Raw lobby payload, `None` when missing or expired.
    async fn load(&self, lobby_code: &str) -> Result<Option<String>, AppError>;

    /// Atomically write the payload, point every member at the lobby and
    /// drop the pointer of `released`, all with the same TTL.
    async fn save(
        &self,
        lobby_code: &str,
        payload: &str,
        member_ids: &[i64],
        released: Option<i64>,
        ttl_seconds: u64,
    ) -> Result<(), AppError>;

    /// Code of the lobby `user_id` points at, if any.
    async fn user_lobby(&self, user_id: i64) -> Result<Option<String>, AppError>;

    /// Atomically drop the lobby and the pointers of `member_ids`.
    async fn delete(&self, lobby_code: &str, member_ids: &[i64]) -> Result<(), AppError>;
}
