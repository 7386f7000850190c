//! Response DTOs
//!
//! Data structures for API response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{FriendEntry, Friendship, Lobby, RegisteredUser, StatusSnapshot};

/// Login response; the same token is also set as the session cookie.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}

/// The caller's own account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub nickname: String,
    pub email: String,
    pub is_active: bool,
    pub pfp_path: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<RegisteredUser> for UserResponse {
    fn from(user: RegisteredUser) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            email: user.email,
            is_active: user.is_active,
            pfp_path: user.pfp_path,
            description: user.description,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Another user's profile, e-mail hidden
#[derive(Debug, Serialize)]
pub struct PublicUserResponse {
    pub id: i64,
    pub nickname: String,
    pub pfp_path: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<RegisteredUser> for PublicUserResponse {
    fn from(user: RegisteredUser) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            pfp_path: user.pfp_path,
            description: user.description,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Friendship state after a request or accept
#[derive(Debug, Serialize)]
pub struct FriendshipResponse {
    pub status: String,
    pub created_at: String,
}

impl From<Friendship> for FriendshipResponse {
    fn from(friendship: Friendship) -> Self {
        Self {
            status: friendship.status.as_str().to_string(),
            created_at: friendship.created_at.to_rfc3339(),
        }
    }
}

/// A friendship seen from the caller, with the other member's profile
#[derive(Debug, Serialize)]
pub struct FriendshipWithUser {
    pub friend_user_id: i64,
    pub friend_nickname: String,
    pub friend_pfp_path: Option<String>,
    pub friend_description: Option<String>,
    pub status: String,
    pub created_at: String,
    /// True if the caller sent the request
    pub is_requester: bool,
}

impl FriendshipWithUser {
    pub fn from_entry(entry: FriendEntry, user_id: i64) -> Self {
        Self {
            friend_user_id: entry.friend.id,
            friend_nickname: entry.friend.nickname,
            friend_pfp_path: entry.friend.pfp_path,
            friend_description: entry.friend.description,
            status: entry.friendship.status.as_str().to_string(),
            created_at: entry.friendship.created_at.to_rfc3339(),
            is_requester: entry.friendship.user_id_1 == user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserSearchResult {
    pub user_id: i64,
    pub nickname: String,
    pub pfp_path: Option<String>,
    pub description: Option<String>,
}

impl From<RegisteredUser> for UserSearchResult {
    fn from(user: RegisteredUser) -> Self {
        Self {
            user_id: user.id,
            nickname: user.nickname,
            pfp_path: user.pfp_path,
            description: user.description,
        }
    }
}

/// Paginated user search
#[derive(Debug, Serialize)]
pub struct UserSearchResponse {
    pub users: Vec<UserSearchResult>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// A chat message as seen by one of the two members
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessageResponse {
    pub id: i64,
    pub sender_id: i64,
    pub sender_nickname: String,
    pub content: Option<String>,
    /// Presigned download URL; `None` for text messages or when signing failed
    pub image_url: Option<String>,
    pub created_at: String,
    pub is_mine: bool,
}

/// Cursor-paginated chat history, newest first
#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessageResponse>,
    pub total: i64,
    pub limit: i64,
    pub has_more: bool,
    /// Id of the oldest message in this batch when more are available
    pub next_cursor: Option<i64>,
    pub friend_user_id: i64,
    pub friend_nickname: String,
}

#[derive(Debug, Serialize)]
pub struct PresignedUploadResponse {
    pub upload_url: String,
    pub object_name: String,
    pub image_path: String,
    pub expires_in_minutes: u64,
}

/// One entry of the recent conversations list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationResponse {
    pub friendship_id: i64,
    pub friend_id: i64,
    pub friend_nickname: String,
    pub friend_email: String,
    pub last_message_time: Option<String>,
    pub last_message_content: Option<String>,
    pub last_message_is_mine: Option<bool>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RecentConversationsResponse {
    pub conversations: Vec<ConversationResponse>,
}

#[derive(Debug, Serialize)]
pub struct FriendStatusListResponse {
    pub statuses: Vec<StatusSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct GuestExtendResponse {
    pub guest_id: String,
    pub extended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LobbyMemberResponse {
    pub user_id: i64,
    pub nickname: String,
    pub is_host: bool,
    pub joined_at: DateTime<Utc>,
}

/// Lobby with its members in join order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LobbyResponse {
    pub lobby_code: String,
    pub host_id: i64,
    pub max_players: u8,
    pub current_players: usize,
    pub members: Vec<LobbyMemberResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Lobby> for LobbyResponse {
    fn from(lobby: Lobby) -> Self {
        let host_id = lobby.host_id;
        Self {
            lobby_code: lobby.lobby_code,
            host_id,
            max_players: lobby.max_players,
            current_players: lobby.members.len(),
            members: lobby
                .members
                .into_iter()
                .map(|m| LobbyMemberResponse {
                    is_host: m.user_id == host_id,
                    user_id: m.user_id,
                    nickname: m.nickname,
                    joined_at: m.joined_at,
                })
                .collect(),
            created_at: lobby.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LobbyCreatedResponse {
    pub lobby_code: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LobbyJoinedResponse {
    pub lobby: LobbyResponse,
    pub message: &'static str,
}
