//! Cache Module
//!
//! Redis connection management and cache-backed stores.
//!
//! - Redis connection manager with automatic reconnection
//! - `RedisGuestStore`, the guest session store
//! - `RedisLobbyStore`, lobbies and the user-to-lobby pointers
//! - Predefined key names for consistent cache key naming

mod guest_store;
mod lobby_store;

pub use guest_store::RedisGuestStore;
pub use lobby_store::RedisLobbyStore;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
///
/// # Errors
/// Returns `redis::RedisError` if the URL is invalid or the first connection fails.
#[instrument(skip(settings), fields(host = %settings.host, port = settings.port, db = settings.db))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.connection_url())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Round-trip a `PING` through the connection.
pub async fn ping(conn: &ConnectionManager) -> Result<(), redis::RedisError> {
    let mut conn = conn.clone();
    let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
}

/// Cache key names.
pub mod keys {
    /// Prefix for guest session payloads (e.g., "guest_session:uuid")
    pub const GUEST_SESSION: &str = "guest_session:";

    /// Set of nicknames held by active guests
    pub const GUEST_NICKNAMES: &str = "guest_nicknames";

    /// Generates a guest session key
    #[inline]
    pub fn guest_session(guest_id: impl std::fmt::Display) -> String {
        format!("{}{}", GUEST_SESSION, guest_id)
    }

    /// Prefix for lobby payloads (e.g., "lobby:K7Q2ZD")
    pub const LOBBY: &str = "lobby:";

    /// Prefix for the lobby code a user sits in (e.g., "user_lobby:42")
    pub const USER_LOBBY: &str = "user_lobby:";

    #[inline]
    pub fn lobby(lobby_code: &str) -> String {
        format!("{}{}", LOBBY, lobby_code)
    }

    #[inline]
    pub fn user_lobby(user_id: i64) -> String {
        format!("{}{}", USER_LOBBY, user_id)
    }
}
