//! Server startup and shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use handyhub_api::{ApiError, ApiState, Server};
use handyhub_core::{Config, ConfigError, Database, LogNotifier};
use tracing::info;

use crate::seed::{seed_directory, SeedError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to open database: {0}")]
    Database(#[from] handyhub_core::Error),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error("Failed to start HTTP server: {0}")]
    Api(#[from] ApiError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the configured database, creating its directory if needed
pub fn open_database(config: &Config) -> Result<Database, StartupError> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(&path)?;
    info!(path = %path.display(), schema_version = db.schema_version()?, "Database ready");
    Ok(db)
}

/// Open storage, import the directory seed and assemble handler state
pub fn build_state(config: Config) -> Result<ApiState, StartupError> {
    let db = open_database(&config)?;
    if let Some(seed_file) = &config.directory.seed_file {
        seed_directory(&db, seed_file)?;
    }
    Ok(ApiState::new(db, config, Arc::new(LogNotifier)))
}

/// Serve until Ctrl-C, then drain in-flight requests
pub async fn run(config: Config, bind_override: Option<SocketAddr>) -> Result<(), StartupError> {
    let bind = bind_override.unwrap_or(config.server.bind);
    let public_base_url = config.server.public_base_url.clone();
    let state = build_state(config)?;

    let server = Server::start(bind, state).await?;
    info!(addr = %server.addr(), public_base_url = %public_base_url, "HandyHub is serving");

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    server.wait().await;
    Ok(())
}
