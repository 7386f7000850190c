//! Realtime delivery port
//!
//! Services push events to connected users through this trait; the
//! WebSocket gateway implements it.

use crate::application::dto::RealtimeEvent;

/// Delivers dispatches to every live session of a user.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Whether the user holds at least one gateway session.
    fn is_online(&self, user_id: i64) -> bool;

    /// Queue `event` on all sessions of `user_id`. Returns how many sessions received it.
    fn notify_user(&self, user_id: i64, event: RealtimeEvent) -> usize;
}
