//! Configuration parsing for the catalogue service.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides (including the standard `OTEL_*` names)
//! - Defaults matching the demo's reference timings

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::observability::telemetry::TelemetryConfig;
use crate::service::chain::ChainTimings;

/// Where periodic metric snapshots are sent.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricsExporterKind {
    /// Print aggregated metrics to stdout.
    #[default]
    Stdout,
    /// Push metrics to the OTLP collector over gRPC.
    Otlp,
    /// Record metrics without exporting them.
    None,
}

/// Catalogue: an HTTP demo of OpenTelemetry tracing and metrics.
#[derive(Parser, Debug, Clone)]
#[command(name = "catalogue")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "CATALOGUE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "CATALOGUE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Service name attached to exported telemetry
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "catalogue")]
    pub service_name: String,

    /// OpenTelemetry collector base endpoint (e.g. http://localhost:4318)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,

    /// Metrics sink
    #[arg(long, env = "CATALOGUE_METRICS_EXPORTER", value_enum, default_value_t = MetricsExporterKind::Stdout)]
    pub metrics_exporter: MetricsExporterKind,

    /// Interval between metric exports, in seconds
    #[arg(long, env = "CATALOGUE_METRICS_INTERVAL_SECS", default_value_t = 600)]
    pub metrics_interval_secs: u64,

    /// Timeout for a single export request, in seconds
    #[arg(long, env = "CATALOGUE_EXPORT_TIMEOUT_SECS", default_value_t = 10)]
    pub export_timeout_secs: u64,

    /// Grace period for flushing telemetry on shutdown, in seconds
    #[arg(long, env = "CATALOGUE_SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,

    /// Multiplier applied to the simulated work delays (0 disables them)
    #[arg(long, env = "CATALOGUE_LATENCY_SCALE", default_value_t = 1.0)]
    pub latency_scale: f64,

    /// Abort a request's simulated work when the client disconnects
    #[arg(long, env = "CATALOGUE_ABORT_ON_DISCONNECT")]
    pub abort_on_disconnect: bool,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Telemetry settings derived from this configuration.
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.service_name.clone(),
            otel_endpoint: self.otel_endpoint.clone(),
            metrics_exporter: self.metrics_exporter,
            metrics_interval: Duration::from_secs(self.metrics_interval_secs),
            export_timeout: Duration::from_secs(self.export_timeout_secs),
        }
    }

    /// Simulated work delays after applying the latency scale.
    pub fn chain_timings(&self) -> ChainTimings {
        ChainTimings::default().scaled(self.latency_scale)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            log_level: "info".into(),
            service_name: "catalogue".into(),
            otel_endpoint: None,
            metrics_exporter: MetricsExporterKind::Stdout,
            metrics_interval_secs: 600,
            export_timeout_secs: 10,
            shutdown_grace_secs: 5,
            latency_scale: 1.0,
            abort_on_disconnect: false,
        }
    }
}
