//! WebSocket Session Management

use std::time::{Duration, Instant};

use crate::domain::RegisteredUser;

/// Grace period added to the advertised heartbeat interval
pub const HEARTBEAT_GRACE: Duration = Duration::from_secs(10);

/// Per-connection state owned by the reader loop
#[derive(Debug)]
pub struct SessionState {
    pub user: RegisteredUser,
    pub session_id: String,
    pub last_heartbeat: Instant,
}

impl SessionState {
    pub fn new(session_id: String, user: RegisteredUser) -> Self {
        Self {
            user,
            session_id,
            last_heartbeat: Instant::now(),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn heartbeat(&mut self) {
        self.last_heartbeat = Instant::now();
    }

    pub fn is_alive(&self, timeout: Duration) -> bool {
        self.last_heartbeat.elapsed() < timeout
    }
}

/// Monotonic dispatch counter of one connection
#[derive(Debug, Default)]
pub struct Sequence(u64);

impl Sequence {
    pub fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}
