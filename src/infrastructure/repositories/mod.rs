//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! - **PgUserRepository** - `registered_users`
//! - **PgFriendshipRepository** - `friendships`
//! - **PgChatMessageRepository** - `chat_messages` with id-cursor pagination
//!
//! ```rust,ignore
//! let user_repo = PgUserRepository::new(pool.clone());
//! let friendship_repo = PgFriendshipRepository::new(pool.clone());
//! let message_repo = PgChatMessageRepository::new(pool);
//! ```

pub mod chat_message_repository;
pub mod friendship_repository;
pub mod user_repository;

pub use chat_message_repository::PgChatMessageRepository;
pub use friendship_repository::PgFriendshipRepository;
pub use user_repository::PgUserRepository;
