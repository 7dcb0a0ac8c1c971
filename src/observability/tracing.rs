//! OpenTelemetry tracing setup.
//!
//! Configures structured logging with:
//! - Console output filtered by `RUST_LOG` or the configured level
//! - A `tracing-opentelemetry` layer exporting spans through the tracer provider

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::TracerProvider;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::error::TelemetryError;
use super::metrics::SCOPE_NAME;

/// Initialize tracing.
///
/// This sets up:
/// - Console logging with structured format
/// - Environment-based filter (via RUST_LOG), falling back to `log_level`
/// - Span export at `INFO` and above when a tracer provider is given,
///   independent of the console filter
///
/// # Errors
///
/// Fails if a global subscriber has already been installed.
pub fn init_tracing(
    log_level: &str,
    tracer_provider: Option<&TracerProvider>,
) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    let otel_layer = tracer_provider.map(|provider| {
        tracing_opentelemetry::layer()
            .with_tracer(provider.tracer(SCOPE_NAME))
            .with_filter(LevelFilter::INFO)
    });

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    tracing::info!(
        level = log_level,
        export = tracer_provider.is_some(),
        "Tracing initialized"
    );
    Ok(())
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
