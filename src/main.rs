mod automation;
mod config;
mod filter;
mod logging;
mod model;
mod providers;
mod reconcile;
mod web;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::{info, warn};

use automation::TaskAutomation;
use web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = config::load_config()?;

    let missing = config.missing();
    if !missing.is_empty() {
        warn!(?missing, "Azure DevOps configuration incomplete, story events will be rejected");
    }
    if config.function_key.is_none() {
        warn!("FUNCTION_KEY not set, webhook accepts unauthenticated calls");
    }

    let automation = TaskAutomation::from_config(&config);
    let app = web::create_app(AppState::new(automation, config.function_key.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening for work-item webhooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
