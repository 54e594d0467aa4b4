pub mod advice; // Advice resolution: rule table, remote endpoint, latency
pub mod api; // HTTP surface for the browser client
pub mod chat;
pub mod clinical_data;
pub mod config;
pub mod conversation; // Exchange state machine
pub mod core_state;
pub mod dashboard;
pub mod identity;
pub mod models;
pub mod session_cache;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

pub async fn run() -> Result<(), RunError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        remote = config.advice_url.is_some(),
        latency = ?config.latency,
        "Configuration loaded"
    );

    let bind_addr = config.bind_addr;
    let core = Arc::new(core_state::CoreState::from_config(config)?);
    let mut server = api::start_api_server(core, bind_addr).await?;

    tokio::signal::ctrl_c().await.map_err(RunError::Signal)?;
    server.shutdown();
    server.stopped().await;
    Ok(())
}
