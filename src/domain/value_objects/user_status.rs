//! Presence status as seen by friends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Online,
    #[default]
    Offline,
    InGame,
    InLobby,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::InGame => "in_game",
            Self::InLobby => "in_lobby",
        }
    }

    /// Anything but offline.
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Offline)
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lobby a user currently sits in, as shown to friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyPresence {
    pub lobby_code: String,
    pub filled_slots: u8,
    pub max_slots: u8,
}

/// Status of one user, as pushed to and queried by friends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub user_id: i64,
    pub status: UserStatus,
    pub game_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lobby_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lobby_filled_slots: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lobby_max_slots: Option<u8>,
}

impl StatusSnapshot {
    pub fn new(user_id: i64, status: UserStatus) -> Self {
        Self {
            user_id,
            status,
            game_name: None,
            last_seen: None,
            lobby_code: None,
            lobby_filled_slots: None,
            lobby_max_slots: None,
        }
    }

    pub fn in_lobby(user_id: i64, lobby: &LobbyPresence) -> Self {
        Self {
            lobby_code: Some(lobby.lobby_code.clone()),
            lobby_filled_slots: Some(lobby.filled_slots),
            lobby_max_slots: Some(lobby.max_slots),
            ..Self::new(user_id, UserStatus::InLobby)
        }
    }

    pub fn in_game(user_id: i64, game_name: impl Into<String>) -> Self {
        Self {
            game_name: Some(game_name.into()),
            ..Self::new(user_id, UserStatus::InGame)
        }
    }
}
