//! # Boardline API Server
//!
//! Serves the board core over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p boardline-api
//! ```
//!
//! See `config` for the full list of environment variables.

use boardline_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    tracing::info!(
        "Boardline API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let address = config.bind_address();
    let state = AppState::from_config(config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "boardline_api=debug,boardline_shared=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
