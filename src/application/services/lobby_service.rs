//! Lobby Service
//!
//! Pre-game rooms kept in the cache. Other members hear about changes as
//! lobby dispatches, and friends see the lobby in the member's presence.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::notifier::Notifier;
use super::user_status_service::UserStatusService;
use crate::application::dto::event::{
    LobbyHostTransferredEvent, LobbyMemberEvent, LobbySettingsUpdatedEvent,
};
use crate::application::dto::RealtimeEvent;
use crate::domain::{
    normalize_lobby_code, Lobby, LobbyMember, LobbyStore, RegisteredUser, LOBBY_CODE_LEN,
    MAX_LOBBY_PLAYERS, MIN_LOBBY_PLAYERS,
};
use crate::shared::error::AppError;

/// Idle lifetime of a lobby, refreshed on every change (4 hours)
pub const LOBBY_TTL_SECONDS: u64 = 4 * 60 * 60;

const CODE_ATTEMPTS: usize = 10;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Lobby service trait
#[async_trait]
pub trait LobbyService: Send + Sync {
    /// Open a lobby with `host` as its only member; defaults to 6 players
    async fn create_lobby(
        &self,
        host: &RegisteredUser,
        max_players: Option<i64>,
    ) -> Result<Lobby, AppError>;

    /// `None` when missing, expired or unreadable
    async fn get_lobby(&self, lobby_code: &str) -> Result<Option<Lobby>, AppError>;

    async fn join_lobby(&self, lobby_code: &str, user: &RegisteredUser) -> Result<Lobby, AppError>;

    /// The last member out closes the lobby; a leaving host hands over to the oldest member
    async fn leave_lobby(&self, lobby_code: &str, user_id: i64) -> Result<(), AppError>;

    /// Host only
    async fn update_lobby_settings(
        &self,
        lobby_code: &str,
        user_id: i64,
        max_players: i64,
    ) -> Result<Lobby, AppError>;

    /// Host only
    async fn transfer_host(
        &self,
        lobby_code: &str,
        current_host_id: i64,
        new_host_id: i64,
    ) -> Result<Lobby, AppError>;

    /// Lobby the user currently sits in
    async fn get_user_lobby(&self, user_id: i64) -> Result<Option<Lobby>, AppError>;
}

/// LobbyService implementation
pub struct LobbyServiceImpl<S>
where
    S: LobbyStore,
{
    store: Arc<S>,
    status: Arc<dyn UserStatusService>,
    notifier: Arc<dyn Notifier>,
    /// Held across every load-modify-save of a lobby payload
    writes: Mutex<()>,
}

impl<S> LobbyServiceImpl<S>
where
    S: LobbyStore,
{
    pub fn new(
        store: Arc<S>,
        status: Arc<dyn UserStatusService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            status,
            notifier,
            writes: Mutex::new(()),
        }
    }

    async fn load(&self, lobby_code: &str) -> Result<Option<Lobby>, AppError> {
        let Some(payload) = self.store.load(lobby_code).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Lobby>(&payload) {
            Ok(lobby) => Ok(Some(lobby)),
            Err(e) => {
                warn!(lobby_code = %lobby_code, error = %e, "Corrupt lobby payload");
                Ok(None)
            }
        }
    }

    async fn require(&self, lobby_code: &str) -> Result<Lobby, AppError> {
        self.load(lobby_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Lobby not found".into()))
    }

    /// Lobby `user_id` points at, ignoring pointers the lobby no longer backs.
    async fn current_lobby(&self, user_id: i64) -> Result<Option<Lobby>, AppError> {
        let Some(code) = self.store.user_lobby(user_id).await? else {
            return Ok(None);
        };
        Ok(self.load(&code).await?.filter(|lobby| lobby.contains(user_id)))
    }

    async fn persist(&self, lobby: &Lobby, released: Option<i64>) -> Result<(), AppError> {
        let payload = serde_json::to_string(lobby)
            .map_err(|e| AppError::Internal(format!("Failed to encode lobby: {}", e)))?;

        self.store
            .save(
                &lobby.lobby_code,
                &payload,
                &lobby.member_ids(),
                released,
                LOBBY_TTL_SECONDS,
            )
            .await
    }

    async fn generate_code(&self) -> Result<String, AppError> {
        for _ in 0..CODE_ATTEMPTS {
            let candidate = random_code();
            if !self.store.exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal("Failed to generate unique lobby code".into()))
    }

    /// Queue `event` for every member except `skip`.
    fn broadcast(&self, lobby: &Lobby, skip: Option<i64>, event: RealtimeEvent) {
        for user_id in lobby.member_ids() {
            if Some(user_id) != skip {
                self.notifier.notify_user(user_id, event.clone());
            }
        }
    }

    /// Filled slots changed for everyone inside.
    async fn refresh_presence(&self, lobby: &Lobby) {
        let presence = lobby.presence();
        for user_id in lobby.member_ids() {
            self.status.set_lobby(user_id, Some(presence.clone())).await;
        }
    }
}

fn random_code() -> String {
    let mut rng = rand::rng();
    (0..LOBBY_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

fn validate_max_players(value: i64) -> Result<u8, AppError> {
    if !(MIN_LOBBY_PLAYERS as i64..=MAX_LOBBY_PLAYERS as i64).contains(&value) {
        return Err(AppError::validation_with(
            "Invalid max_players",
            json!({
                "max_players": value,
                "min": MIN_LOBBY_PLAYERS,
                "max": MAX_LOBBY_PLAYERS,
            }),
        ));
    }
    Ok(value as u8)
}

#[async_trait]
impl<S> LobbyService for LobbyServiceImpl<S>
where
    S: LobbyStore + 'static,
{
    #[instrument(skip(self, host), fields(host_id = host.id))]
    async fn create_lobby(
        &self,
        host: &RegisteredUser,
        max_players: Option<i64>,
    ) -> Result<Lobby, AppError> {
        let max_players = validate_max_players(max_players.unwrap_or(MAX_LOBBY_PLAYERS as i64))?;

        let guard = self.writes.lock().await;
        if self.current_lobby(host.id).await?.is_some() {
            return Err(AppError::BadRequest("You are already in a lobby".into()));
        }

        let lobby = Lobby::new(self.generate_code().await?, host, max_players);
        self.persist(&lobby, None).await?;
        drop(guard);

        info!(lobby_code = %lobby.lobby_code, max_players, "Lobby created");
        self.refresh_presence(&lobby).await;
        Ok(lobby)
    }

    async fn get_lobby(&self, lobby_code: &str) -> Result<Option<Lobby>, AppError> {
        self.load(&normalize_lobby_code(lobby_code)).await
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    async fn join_lobby(&self, lobby_code: &str, user: &RegisteredUser) -> Result<Lobby, AppError> {
        let code = normalize_lobby_code(lobby_code);

        let guard = self.writes.lock().await;
        if let Some(current) = self.current_lobby(user.id).await? {
            let message = if current.lobby_code == code {
                "You are already in this lobby"
            } else {
                "You are already in another lobby"
            };
            return Err(AppError::BadRequest(message.into()));
        }

        let mut lobby = self.require(&code).await?;
        if lobby.is_full() {
            return Err(AppError::BadRequest("Lobby is full".into()));
        }

        lobby.members.push(LobbyMember::from_user(user));
        self.persist(&lobby, None).await?;
        drop(guard);

        info!(lobby_code = %code, players = lobby.current_players(), "Lobby joined");
        self.broadcast(
            &lobby,
            Some(user.id),
            RealtimeEvent::LobbyMemberJoined(LobbyMemberEvent {
                lobby_code: code,
                user_id: user.id,
                nickname: user.nickname.clone(),
            }),
        );
        self.refresh_presence(&lobby).await;
        Ok(lobby)
    }

    #[instrument(skip(self))]
    async fn leave_lobby(&self, lobby_code: &str, user_id: i64) -> Result<(), AppError> {
        let code = normalize_lobby_code(lobby_code);

        let guard = self.writes.lock().await;
        let mut lobby = self.require(&code).await?;
        let Some(leaver) = lobby.members.iter().find(|m| m.user_id == user_id).cloned() else {
            return Err(AppError::BadRequest("You are not in this lobby".into()));
        };

        let old_host_id = lobby.host_id;
        let new_host_id = lobby.remove_member(user_id);

        if lobby.members.is_empty() {
            self.store.delete(&code, &[user_id]).await?;
            drop(guard);
            info!(lobby_code = %code, "Lobby closed");
            self.status.set_lobby(user_id, None).await;
            return Ok(());
        }

        self.persist(&lobby, Some(user_id)).await?;
        drop(guard);

        info!(lobby_code = %code, players = lobby.current_players(), "Lobby left");
        self.status.set_lobby(user_id, None).await;
        self.broadcast(
            &lobby,
            None,
            RealtimeEvent::LobbyMemberLeft(LobbyMemberEvent {
                lobby_code: code.clone(),
                user_id,
                nickname: leaver.nickname,
            }),
        );
        if let Some(new_host_id) = new_host_id {
            self.broadcast(
                &lobby,
                None,
                RealtimeEvent::LobbyHostTransferred(LobbyHostTransferredEvent {
                    lobby_code: code,
                    old_host_id,
                    new_host_id,
                }),
            );
        }
        self.refresh_presence(&lobby).await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_lobby_settings(
        &self,
        lobby_code: &str,
        user_id: i64,
        max_players: i64,
    ) -> Result<Lobby, AppError> {
        let code = normalize_lobby_code(lobby_code);

        let guard = self.writes.lock().await;
        let mut lobby = self.require(&code).await?;
        if lobby.host_id != user_id {
            return Err(AppError::Forbidden(
                "Only the host can update lobby settings".into(),
            ));
        }

        let max_players = validate_max_players(max_players)?;
        if (max_players as usize) < lobby.current_players() {
            return Err(AppError::validation_with(
                "Cannot set max_players below current player count",
                json!({
                    "current_players": lobby.current_players(),
                    "requested_max": max_players,
                }),
            ));
        }

        lobby.max_players = max_players;
        self.persist(&lobby, None).await?;
        drop(guard);

        self.broadcast(
            &lobby,
            Some(user_id),
            RealtimeEvent::LobbySettingsUpdated(LobbySettingsUpdatedEvent {
                lobby_code: code,
                max_players,
            }),
        );
        self.refresh_presence(&lobby).await;
        Ok(lobby)
    }

    #[instrument(skip(self))]
    async fn transfer_host(
        &self,
        lobby_code: &str,
        current_host_id: i64,
        new_host_id: i64,
    ) -> Result<Lobby, AppError> {
        let code = normalize_lobby_code(lobby_code);

        let guard = self.writes.lock().await;
        let mut lobby = self.require(&code).await?;
        if lobby.host_id != current_host_id {
            return Err(AppError::Forbidden(
                "Only the host can transfer host privileges".into(),
            ));
        }
        if !lobby.contains(new_host_id) {
            return Err(AppError::BadRequest("New host is not in this lobby".into()));
        }
        if new_host_id == current_host_id {
            return Err(AppError::BadRequest("You are already the host".into()));
        }

        lobby.host_id = new_host_id;
        self.persist(&lobby, None).await?;
        drop(guard);

        info!(lobby_code = %code, new_host_id, "Lobby host transferred");
        self.broadcast(
            &lobby,
            Some(current_host_id),
            RealtimeEvent::LobbyHostTransferred(LobbyHostTransferredEvent {
                lobby_code: code,
                old_host_id: current_host_id,
                new_host_id,
            }),
        );
        Ok(lobby)
    }

    async fn get_user_lobby(&self, user_id: i64) -> Result<Option<Lobby>, AppError> {
        self.current_lobby(user_id).await
    }
}
