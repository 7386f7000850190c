//! WebSocket Gateway
//!
//! Registry of connected sessions and per-user routing of dispatches.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::messages::GatewaySend;
use crate::application::dto::RealtimeEvent;
use crate::application::services::Notifier;
use crate::infrastructure::metrics;

/// Connected session with message sender
pub struct ConnectedSession {
    pub user_id: i64,
    pub session_id: String,
    pub sender: mpsc::UnboundedSender<GatewaySend>,
}

/// WebSocket gateway managing all connections
pub struct Gateway {
    /// Active sessions by session_id
    sessions: DashMap<String, Arc<ConnectedSession>>,
    /// User ID to session IDs mapping (one user can have multiple sessions)
    user_sessions: DashMap<i64, Vec<String>>,
    /// Heartbeat interval in milliseconds
    heartbeat_interval_ms: u64,
}

impl Gateway {
    pub fn new(heartbeat_interval_ms: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            user_sessions: DashMap::new(),
            heartbeat_interval_ms,
        }
    }

    /// Get the heartbeat interval
    pub fn heartbeat_interval(&self) -> u64 {
        self.heartbeat_interval_ms
    }

    /// Register a new connected session.
    ///
    /// Returns `true` when this is the user's first live session.
    pub fn register_session(
        &self,
        session_id: String,
        user_id: i64,
        sender: mpsc::UnboundedSender<GatewaySend>,
    ) -> bool {
        let session = Arc::new(ConnectedSession {
            user_id,
            session_id: session_id.clone(),
            sender,
        });
        self.sessions.insert(session_id.clone(), session);

        let first = {
            let mut ids = self.user_sessions.entry(user_id).or_default();
            ids.push(session_id.clone());
            ids.len() == 1
        };

        metrics::set_realtime_sessions(self.sessions.len());
        tracing::info!(user_id, session_id = %session_id, first, "Session registered");
        first
    }

    /// Unregister a session.
    ///
    /// Returns the owner and whether it was the owner's last session.
    pub fn unregister_session(&self, session_id: &str) -> Option<(i64, bool)> {
        let (_, session) = self.sessions.remove(session_id)?;
        let user_id = session.user_id;

        if let Some(mut ids) = self.user_sessions.get_mut(&user_id) {
            ids.retain(|s| s != session_id);
        }
        let last = self
            .user_sessions
            .remove_if(&user_id, |_, ids| ids.is_empty())
            .is_some();

        metrics::set_realtime_sessions(self.sessions.len());
        tracing::info!(user_id, session_id = %session_id, last, "Session unregistered");
        Some((user_id, last))
    }

    /// Send to one session (bypassing user routing)
    pub fn send_to_session(&self, session_id: &str, message: GatewaySend) -> bool {
        self.sessions
            .get(session_id)
            .map(|session| session.sender.send(message).is_ok())
            .unwrap_or(false)
    }

    /// Send to all sessions of a user; returns how many accepted the frame.
    pub fn send_to_user(&self, user_id: i64, message: GatewaySend) -> usize {
        let Some(session_ids) = self.user_sessions.get(&user_id) else {
            return 0;
        };

        session_ids
            .value()
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .filter(|session| session.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Get session count
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Check if user is online (has at least one session)
    pub fn is_user_online(&self, user_id: i64) -> bool {
        self.user_sessions
            .get(&user_id)
            .map(|sessions| !sessions.is_empty())
            .unwrap_or(false)
    }
}

impl Notifier for Gateway {
    fn is_online(&self, user_id: i64) -> bool {
        self.is_user_online(user_id)
    }

    fn notify_user(&self, user_id: i64, event: RealtimeEvent) -> usize {
        self.send_to_user(user_id, GatewaySend::dispatch(&event))
    }
}
