//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use serde::Deserialize;
use validator::Validate;

use crate::shared::validation::PageParams;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub password: String,

    #[validate(length(min = 3, max = 255, message = "Nickname must be 3-255 characters"))]
    pub nickname: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Update own profile request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 255, message = "Nickname must be 3-255 characters"))]
    pub nickname: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub password: Option<String>,

    #[validate(length(max = 500, message = "Avatar path must be at most 500 characters"))]
    pub pfp_path: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

/// Body of `POST /friends/request` and `POST /friends/accept`
#[derive(Debug, Deserialize)]
pub struct FriendUserRequest {
    pub friend_user_id: i64,
}

/// `GET /friends` query
#[derive(Debug, Default, Deserialize)]
pub struct FriendshipListQuery {
    pub status_filter: Option<String>,
}

/// `GET /friends/search` query
#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub q: String,

    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl UserSearchQuery {
    pub fn page_params(&self) -> PageParams {
        let defaults = PageParams::default();
        PageParams {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        }
    }
}

/// Presigned upload URL request
#[derive(Debug, Deserialize, Validate)]
pub struct PresignedUploadRequest {
    pub friend_user_id: i64,

    #[validate(length(min = 1, max = 255, message = "Filename must be 1-255 characters"))]
    pub filename: String,

    pub content_type: String,
}

/// `GET /chat/history/{friend_user_id}` query
#[derive(Debug, Deserialize)]
pub struct ChatHistoryQuery {
    pub before_message_id: Option<i64>,

    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

impl Default for ChatHistoryQuery {
    fn default() -> Self {
        Self {
            before_message_id: None,
            limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> i64 {
    50
}

/// `GET /chat/conversations` query
#[derive(Debug, Deserialize)]
pub struct ConversationsQuery {
    #[serde(default = "default_conversations_limit")]
    pub limit: i64,
}

impl Default for ConversationsQuery {
    fn default() -> Self {
        Self {
            limit: default_conversations_limit(),
        }
    }
}

fn default_conversations_limit() -> i64 {
    20
}

/// `GET /ws/chat` query
#[derive(Debug, Default, Deserialize)]
pub struct GatewayConnectQuery {
    pub token: Option<String>,
}


/// Body of `POST /lobby`
#[derive(Debug, Default, Deserialize)]
pub struct CreateLobbyRequest {
    pub max_players: Option<i64>,
}

/// Body of `PATCH /lobby/{code}/settings`
#[derive(Debug, Deserialize)]
pub struct LobbySettingsRequest {
    pub max_players: i64,
}

/// Body of `POST /lobby/{code}/transfer-host`
#[derive(Debug, Deserialize)]
pub struct TransferHostRequest {
    pub new_host_id: i64,
}
