use std::net::SocketAddr;

use anyhow::Result;
use ats_api::{build_router, AppState, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "ats_api={level},ats_engine={level}",
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS API v{}", env!("CARGO_PKG_VERSION"));

    let engine = config.load_engine()?;
    info!(
        "Keyword catalog {} loaded ({} terms)",
        engine.catalog().version(),
        engine.catalog().len()
    );

    // The service evaluates in-process; the fallback target only matters to
    // hosts that build an `ExecutionRouter` from this configuration.
    match &config.remote_url {
        Some(url) => info!(
            "Router fallback target {url} (timeout {}s)",
            config.remote_timeout.as_secs()
        ),
        None => info!("No remote fallback configured; router runs local-only"),
    }
    if config.cors_origins.is_empty() {
        info!("CORS: any origin");
    } else {
        info!("CORS origins: {}", config.cors_origins.join(", "));
    }

    let port = config.port;
    let app = build_router(AppState::new(engine, config));

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
