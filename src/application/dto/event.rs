//! Realtime event payloads
//!
//! Bodies of gateway dispatches (`op: 0`) and of the client commands the
//! gateway accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::response::{ChatMessageResponse, UserResponse};
use crate::domain::{RegisteredUser, StatusSnapshot};

/// Every dispatch the gateway can deliver to a user.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    Ready(ReadyEvent),
    Message(ChatMessageResponse),
    ConversationUpdated(ConversationUpdatedEvent),
    UserTyping(UserTypingEvent),
    FriendStatusUpdate(StatusSnapshot),
    FriendRequestReceived(FriendRequestEvent),
    FriendRequestAccepted(FriendRequestAcceptedEvent),
    FriendRemoved(FriendRemovedEvent),
    LobbyMemberJoined(LobbyMemberEvent),
    LobbyMemberLeft(LobbyMemberEvent),
    LobbyHostTransferred(LobbyHostTransferredEvent),
    LobbySettingsUpdated(LobbySettingsUpdatedEvent),
    Error(ErrorEvent),
}

impl RealtimeEvent {
    /// Dispatch name sent as `t`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "READY",
            Self::Message(_) => "MESSAGE",
            Self::ConversationUpdated(_) => "CONVERSATION_UPDATED",
            Self::UserTyping(_) => "USER_TYPING",
            Self::FriendStatusUpdate(_) => "FRIEND_STATUS_UPDATE",
            Self::FriendRequestReceived(_) => "FRIEND_REQUEST_RECEIVED",
            Self::FriendRequestAccepted(_) => "FRIEND_REQUEST_ACCEPTED",
            Self::FriendRemoved(_) => "FRIEND_REMOVED",
            Self::LobbyMemberJoined(_) => "LOBBY_MEMBER_JOINED",
            Self::LobbyMemberLeft(_) => "LOBBY_MEMBER_LEFT",
            Self::LobbyHostTransferred(_) => "LOBBY_HOST_TRANSFERRED",
            Self::LobbySettingsUpdated(_) => "LOBBY_SETTINGS_UPDATED",
            Self::Error(_) => "ERROR",
        }
    }

    /// Dispatch body sent as `d`.
    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            Self::Ready(e) => serde_json::to_value(e),
            Self::Message(e) => serde_json::to_value(e),
            Self::ConversationUpdated(e) => serde_json::to_value(e),
            Self::UserTyping(e) => serde_json::to_value(e),
            Self::FriendStatusUpdate(e) => serde_json::to_value(e),
            Self::FriendRequestReceived(e) => serde_json::to_value(e),
            Self::FriendRequestAccepted(e) => serde_json::to_value(e),
            Self::FriendRemoved(e) => serde_json::to_value(e),
            Self::LobbyMemberJoined(e) | Self::LobbyMemberLeft(e) => serde_json::to_value(e),
            Self::LobbyHostTransferred(e) => serde_json::to_value(e),
            Self::LobbySettingsUpdated(e) => serde_json::to_value(e),
            Self::Error(e) => serde_json::to_value(e),
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorEvent {
            message: message.into(),
            details: None,
        })
    }
}

/// First dispatch after the connection is authenticated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyEvent {
    pub session_id: String,
    pub user: UserResponse,
}

/// Conversation list entry refresh pushed to both members after a message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationUpdatedEvent {
    pub friendship_id: i64,
    pub friend_id: i64,
    pub friend_nickname: String,
    pub last_message_time: String,
    pub last_message_content: Option<String>,
    pub last_message_is_mine: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTypingEvent {
    pub user_id: i64,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendRequestEvent {
    pub sender_id: i64,
    pub sender_nickname: String,
    pub sender_pfp_path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FriendRequestEvent {
    pub fn from_sender(sender: &RegisteredUser) -> Self {
        Self {
            sender_id: sender.id,
            sender_nickname: sender.nickname.clone(),
            sender_pfp_path: sender.pfp_path.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendRequestAcceptedEvent {
    pub accepter_id: i64,
    pub accepter_nickname: String,
    pub accepter_pfp_path: Option<String>,
}

impl FriendRequestAcceptedEvent {
    pub fn from_accepter(accepter: &RegisteredUser) -> Self {
        Self {
            accepter_id: accepter.id,
            accepter_nickname: accepter.nickname.clone(),
            accepter_pfp_path: accepter.pfp_path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendRemovedEvent {
    pub friend_id: i64,
}

/// A member entered or left a lobby
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LobbyMemberEvent {
    pub lobby_code: String,
    pub user_id: i64,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LobbyHostTransferredEvent {
    pub lobby_code: String,
    pub old_host_id: i64,
    pub new_host_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LobbySettingsUpdatedEvent {
    pub lobby_code: String,
    pub max_players: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// `SEND_MESSAGE` (op 2) body
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageCommand {
    pub friend_user_id: i64,
    pub content: Option<String>,
    pub image_path: Option<String>,
}

/// `TYPING` (op 3) body
#[derive(Debug, Clone, Deserialize)]
pub struct TypingCommand {
    pub friend_user_id: i64,
}

/// `ACTIVITY_UPDATE` (op 4) body; no game means back to plain online
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityUpdateCommand {
    pub game_name: Option<String>,
}
