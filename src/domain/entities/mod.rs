//! # Domain Entities
//!
//! Core domain entities of the L2P backend.
//!
//! - **RegisteredUser**: account with credentials and public profile
//! - **Friendship**: pending or accepted link between two users
//! - **ChatMessage**: text or image message inside a friendship
//! - **GuestUser**: cache-only anonymous identity
//! - **Lobby**: cache-only pre-game room with its members
//!
//! Each entity has an associated repository trait implemented in the
//! infrastructure layer.

mod chat_message;
mod friendship;
mod guest;
mod lobby;
mod user;

pub use chat_message::{ChatMessage, ChatMessageRepository, NewChatMessage};
pub use friendship::{FriendEntry, Friendship, FriendshipRepository, FriendshipStatus};
pub use guest::{GuestSessionStore, GuestUser, GUEST_PFP_PATH};
pub use lobby::{
    normalize_lobby_code, Lobby, LobbyMember, LobbyStore, LOBBY_CODE_LEN, MAX_LOBBY_PLAYERS,
    MIN_LOBBY_PLAYERS,
};
pub use user::{NewUser, RegisteredUser, UserChanges, UserRepository};

#[cfg(test)]
pub use chat_message::MockChatMessageRepository;
#[cfg(test)]
pub use friendship::MockFriendshipRepository;
#[cfg(test)]
pub use guest::MockGuestSessionStore;
#[cfg(test)]
pub use lobby::MockLobbyStore;
#[cfg(test)]
pub use user::MockUserRepository;
