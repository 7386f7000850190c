//! # Domain Services
//!
//! Contracts for capabilities the domain relies on but does not implement.
//!
//! - **ObjectStore**: private blob storage with presigned URLs

mod object_store;

pub use object_store::*;
