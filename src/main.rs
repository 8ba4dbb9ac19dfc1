// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::poller::{PollerConfig, TelemetryPoller};
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_source::HttpTelemetrySource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_snapshot, get_vitals, health_check, stream_snapshots};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Telemetry source (infrastructure layer)
    let source = Arc::new(HttpTelemetrySource::new(
        &config.api.base_url,
        config.api.request_timeout(),
    )?);

    // Synchronization engine (application layer)
    let (poller, poller_task) = TelemetryPoller::spawn(source, PollerConfig::from(&config.poller));

    let state = Arc::new(AppState {
        poller: poller.clone(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/snapshot/stream", get(stream_snapshots))
        .route("/vitals", get(get_vitals))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.server.bind_addr;
    tracing::info!(%addr, api = %config.api.base_url, "Starting vitals-monitor");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown_handle = poller.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            // Stopping the poller also ends open snapshot streams
            tracing::info!("Shutting down telemetry poller");
            shutdown_handle.stop();
        })
        .await?;

    poller_task.await?;
    tracing::info!(phase = ?poller.phase(), "vitals-monitor stopped");

    Ok(())
}
