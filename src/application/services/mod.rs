//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, password login, JWT validation
//! - **UserService**: Profile reads and updates
//! - **FriendshipService**: Friend requests, friend lists, user search
//! - **ChatService**: Friend chat, image uploads, history, conversations
//! - **UserStatusService**: Presence pushed to friends
//! - **GuestService**: Cache-backed guest sessions
//! - **LobbyService**: Cache-backed pre-game lobbies
//!
//! Realtime delivery goes through the [`Notifier`] port.

pub mod auth_service;
pub mod chat_service;
pub mod friendship_service;
pub mod guest_service;
pub mod lobby_service;
pub mod notifier;
pub mod user_service;
pub mod user_status_service;

pub use auth_service::{AccessToken, AuthError, AuthService, AuthServiceImpl, Claims, JWT_AUDIENCE};
pub use chat_service::{ChatContext, ChatService, ChatServiceImpl, SentMessage};
pub use friendship_service::{FriendshipService, FriendshipServiceImpl};
pub use guest_service::{GuestService, GuestServiceImpl, GUEST_SESSION_TTL_SECONDS};
pub use lobby_service::{LobbyService, LobbyServiceImpl, LOBBY_TTL_SECONDS};
pub use notifier::Notifier;
pub use user_service::{avatar_paths, UserService, UserServiceImpl};
pub use user_status_service::{UserStatusService, UserStatusServiceImpl};
