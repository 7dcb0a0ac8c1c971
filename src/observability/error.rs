//! Errors raised while bootstrapping or tearing down telemetry.

use std::fmt;
use std::time::Duration;

use opentelemetry::metrics::MetricsError;
use opentelemetry::trace::TraceError;

/// Errors from telemetry initialisation and lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to create the span exporter.
    #[error("failed to create trace exporter: {0}")]
    TraceExporter(#[source] TraceError),

    /// Failed to create the metric exporter or reader.
    #[error("failed to create metric exporter: {0}")]
    MetricExporter(#[source] MetricsError),

    /// The tracer provider failed to flush or shut down.
    #[error("failed to shut down tracer provider: {0}")]
    TraceShutdown(#[source] TraceError),

    /// The meter provider failed to flush or shut down.
    #[error("failed to shut down meter provider: {0}")]
    MetricShutdown(#[source] MetricsError),

    /// Shutdown did not finish within the grace period.
    #[error("telemetry shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),

    /// The blocking shutdown task panicked or was cancelled.
    #[error("telemetry shutdown task failed: {0}")]
    ShutdownTask(#[source] tokio::task::JoinError),

    /// Failed to install the global tracing subscriber.
    #[error("failed to initialise tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    /// Several failures collected from one operation, in the order they occurred.
    #[error("{0}")]
    Joined(JoinedErrors),
}

impl TelemetryError {
    /// Combine collected failures into one result.
    ///
    /// No failures is `Ok`, a single failure is returned unchanged and two or
    /// more are wrapped in [`TelemetryError::Joined`]. Nested joins are
    /// flattened.
    pub fn join(errors: impl IntoIterator<Item = TelemetryError>) -> Result<(), TelemetryError> {
        let mut flat: Vec<_> = errors.into_iter().flat_map(Self::into_errors).collect();

        match flat.len() {
            0 => Ok(()),
            1 => Err(flat.remove(0)),
            _ => Err(TelemetryError::Joined(JoinedErrors(flat))),
        }
    }

    /// Join `other` after this error.
    pub fn and(self, other: TelemetryError) -> TelemetryError {
        let mut errors = self.into_errors();
        errors.extend(other.into_errors());
        TelemetryError::Joined(JoinedErrors(errors))
    }

    fn into_errors(self) -> Vec<TelemetryError> {
        match self {
            TelemetryError::Joined(JoinedErrors(inner)) => inner,
            other => vec![other],
        }
    }

    /// The individual failures carried by this error.
    pub fn errors(&self) -> Vec<&TelemetryError> {
        match self {
            TelemetryError::Joined(joined) => joined.0.iter().collect(),
            other => vec![other],
        }
    }
}

/// Ordered collection of failures reported as one error.
#[derive(Debug)]
pub struct JoinedErrors(pub Vec<TelemetryError>);

impl fmt::Display for JoinedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}
