//! # ob-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment
//! (see [`AppConfig::from_env`]).

use std::sync::Arc;

use ob_api::db::{init_pool, PgStatusStore};
use ob_api::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {e}");
        e
    })?;
    let port = config.port;
    if config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set; status and revoke routes will reject every request");
    }

    let pool = init_pool(config.database_url.as_deref()).await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = match pool {
        Some(pool) => AppState::with_store(config, Arc::new(PgStatusStore::new(pool))),
        None => AppState::with_config(config),
    };

    let app = ob_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Open Badges API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
