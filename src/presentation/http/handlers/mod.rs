//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod auth;
pub mod chat;
pub mod docs;
pub mod friend;
pub mod guest;
pub mod health;
pub mod lobby;
pub mod status;
pub mod user;
