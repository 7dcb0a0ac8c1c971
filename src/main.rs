//! Catalogue: an HTTP demo of OpenTelemetry tracing and metrics.
//!
//! # Usage
//!
//! ```bash
//! catalogue --port 8080 --metrics-interval-secs 600
//! ```
//!
//! Environment variables can also be used:
//! - `CATALOGUE_PORT`: Port to listen on
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector base endpoint for traces
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use catalogue::config::Config;
use catalogue::observability::metrics::{Metrics, SCOPE_NAME};
use catalogue::observability::telemetry::init_telemetry;
use catalogue::observability::tracing::init_tracing;
use catalogue::server::run_server;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Catalogue v{} - OpenTelemetry demo service

  Configuration:
    Address:     {}:{}
    Collector:   {}
    Metrics:     {:?} every {}s
    Log Level:   {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.host,
        config.port,
        config.otel_endpoint.as_deref().unwrap_or("exporter default"),
        config.metrics_exporter,
        config.metrics_interval_secs,
        config.log_level
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Bootstrap the OpenTelemetry pipeline; failure is fatal
    let telemetry = init_telemetry(&config.telemetry())?;

    // Initialize tracing/logging, bridged into the tracer provider
    init_tracing(&config.log_level, Some(telemetry.tracer_provider()))?;

    let metrics = Metrics::new(&telemetry.meter(SCOPE_NAME));

    // Print startup banner
    print_banner(&config);

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(async move {
        // Wait for SIGTERM or SIGINT (Ctrl+C)
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                        }
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, initiating shutdown...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl+C only");
                    let _ = ctrl_c.await;
                    tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = ctrl_c.await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }

        // Signal shutdown
        let _ = shutdown_tx.send(true);
    });

    let grace = config.shutdown_grace();

    // Run the server
    let served = run_server(config, metrics, shutdown_rx).await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "Server failed");
    }

    // Flush and close exporters
    if let Err(e) = telemetry.shutdown_within(grace).await {
        tracing::error!(error = %e, "Telemetry shutdown failed");
        return Err(e.into());
    }

    tracing::info!("Catalogue shutdown complete");
    served.map_err(|e| e as Box<dyn std::error::Error>)
}
