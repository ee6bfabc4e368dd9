use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use langtool_proxy::adapter::EngineAdapter;
use langtool_proxy::config::Config;
use langtool_proxy::server::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting LanguageTool proxy...");

    let config = Config::load_from_default();

    // Engine failures leave the service running in degraded mode
    let adapter = EngineAdapter::connect(&config).await;
    if !adapter.state().await.available {
        tracing::warn!("Falling back to basic mode");
    }

    let app = router(Arc::new(AppState::new(adapter)), &config);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("LanguageTool proxy shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
