//! Lifecast server binary.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `lifecast-config.yaml`
//! 3. Create the instance directory
//! 4. Start the HTTP + `WebSocket` server
//! 5. Wait for `Ctrl-C`, then stop every running instance

mod error;

use std::path::Path;
use std::sync::Arc;

use lifecast_core::Directory;
use lifecast_core::config::LifecastConfig;
use lifecast_server::{AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "lifecast-config.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("lifecast-engine starting");

    let config = load_config(Path::new(CONFIG_PATH))?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        max_dimension = config.simulation.effective_max_dimension(),
        generation_interval_ms = config.simulation.generation_interval_ms,
        queue_capacity = config.listener.queue_capacity,
        "Configuration loaded"
    );

    let directory = Arc::new(Directory::new(config.simulation.clone()));
    let state = Arc::new(AppState::new(Arc::clone(&directory), config.listener.clone()));

    let server = lifecast_server::spawn_server(&ServerConfig::from(&config.server), state)
        .await
        .map_err(EngineError::from)?;

    tokio::signal::ctrl_c().await.map_err(EngineError::from)?;
    info!("Shutdown requested");

    let stopped = directory.stop_all();
    server.abort();

    info!(
        instances = directory.len(),
        stopped,
        "lifecast-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `path`, falling back to defaults (plus env
/// overrides) when the file does not exist.
fn load_config(path: &Path) -> Result<LifecastConfig, EngineError> {
    if path.exists() {
        Ok(LifecastConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(LifecastConfig::parse("{}")?)
    }
}
