//! # Configuration Module
//!
//! Layered settings:
//! - Built-in defaults
//! - Configuration files (config/default.toml, config/{RUN_ENV}.toml)
//! - Environment variables prefixed with `APP__`
//! - Flat deployment variables such as `POSTGRES_HOST` or `SECRET_KEY`
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use l2p_backend::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Server will listen on {}", settings.server_addr());
//! ```

mod settings;

pub use settings::*;
