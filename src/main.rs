//! # L2P-Online Backend
//!
//! Entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database, Redis and object storage connections
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use l2p_backend::config::Settings;
use l2p_backend::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so RUST_LOG / LOG_FORMAT from .env apply
    let settings = Settings::load()?;

    l2p_backend::telemetry::init_tracing();

    info!("Starting L2P-Online backend...");
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
