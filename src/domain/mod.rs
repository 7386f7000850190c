//! # Domain Layer
//!
//! Core business types of the L2P backend, independent of frameworks and
//! infrastructure.
//!
//! ## Structure
//!
//! - **entities**: Users, friendships, chat messages, guests, lobbies and their storage traits
//! - **value_objects**: Presence status, chat image paths
//! - **services**: Storage contracts implemented by the infrastructure layer

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
pub use value_objects::*;
