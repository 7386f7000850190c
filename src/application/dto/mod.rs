//! Data Transfer Objects
//!
//! DTOs for API request/response serialization and realtime payloads.

pub mod event;
pub mod request;
pub mod response;

pub use event::RealtimeEvent;
