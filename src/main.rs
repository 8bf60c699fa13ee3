//! Shelfmark Server - Library Catalog and Lending
//!
//! REST API server for books, users and lends.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use shelfmark_server::{
    api, config::AppConfig, repository::Repository, services::Services, telemetry, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let _log_guard = telemetry::init(&config.logging);

    tracing::info!("Starting Shelfmark Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    let host: IpAddr = config.server.host.parse().context("Invalid host address")?;
    let addr = SocketAddr::new(host, config.server.port);

    tracing::info!(
        id_offset = config.import.id_offset,
        lock_timeout_ms = config.database.lock_timeout_ms,
        "Catalog settings loaded"
    );

    let repository = Repository::new(pool, config.database.lock_timeout_ms);
    let services = Services::new(Arc::new(repository), &config.import);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
