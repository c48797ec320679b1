pub mod api;
pub mod config;
pub mod db;
pub mod followup;
pub mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, FollowUpConfig};
use crate::db::{DatabaseError, SqliteVisitReader};
use crate::followup::FollowUpEngine;

/// Startup failures surfaced by `run`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Invalid bind address {addr}: {reason}")]
    BindAddr { addr: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server error: {0}")]
    Server(String),
}

/// Open the clinic database, build the engine and serve the follow-up API
/// until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let followup_config = FollowUpConfig::from_env()?;
    followup_config.validate()?;

    let db_path = config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let reader = SqliteVisitReader::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "Clinic database opened");

    let engine = Arc::new(FollowUpEngine::with_config(
        Arc::new(reader),
        followup_config,
    ));

    let raw_addr = config::bind_addr();
    let addr: SocketAddr = raw_addr.parse().map_err(|e: std::net::AddrParseError| {
        StartupError::BindAddr {
            addr: raw_addr.clone(),
            reason: e.to_string(),
        }
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let mut server = api::start_followup_server(engine, addr)
            .await
            .map_err(StartupError::Server)?;
        tracing::info!(addr = %server.session.server_addr, "Serving follow-up API");

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
        }

        server.shutdown();
        server.stopped().await;
        Ok(())
    })
}
