//! OpenTelemetry observability infrastructure.
//!
//! Provides:
//! - Pipeline bootstrap and ordered shutdown of the tracer and meter providers
//! - Structured logging bridged into OpenTelemetry spans
//! - W3C trace-context and baggage propagation
//! - The `request_count` metric instrument

pub mod error;
pub mod metrics;
pub mod propagation;
pub mod telemetry;
pub mod tracing;

pub use error::TelemetryError;
pub use telemetry::{init_telemetry, Telemetry, TelemetryConfig};
