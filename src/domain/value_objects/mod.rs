//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! - **UserStatus**: online / offline / in-game / in-lobby presence
//! - **ImagePath**: parsed object path of a chat image

mod image_path;
mod user_status;

pub use image_path::*;
pub use user_status::*;
