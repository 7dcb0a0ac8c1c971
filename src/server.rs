//! HTTP server setup and lifecycle.
//!
//! Configures the axum server with:
//! - The catalogue and health routes
//! - Graceful shutdown support

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::Config;
use crate::observability::metrics::Metrics;
use crate::service::{create_router, AppState};

/// Run the catalogue HTTP server.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `metrics` - Instruments recorded by the request handler
/// * `shutdown_rx` - Receiver for shutdown signal
///
/// # Returns
///
/// Returns when the server has shut down and in-flight requests drained.
pub async fn run_server(
    config: Config,
    metrics: Metrics,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    serve(listener, &config, metrics, shutdown_rx).await
}

/// Serve on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    config: &Config,
    metrics: Metrics,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = AppState::new(metrics, config.chain_timings())
        .with_abort_on_disconnect(config.abort_on_disconnect);
    let app = create_router(state);

    tracing::info!(address = %listener.local_addr()?, "Starting catalogue HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            // Wait for shutdown signal
            let _ = shutdown_rx.changed().await;
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
