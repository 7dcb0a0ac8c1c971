//! Metric instruments recorded by the request handler.
//!
//! Key metrics:
//! - request_count: Counter of served requests, tagged with the counter value

use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::KeyValue;

/// Name of the meter and tracer scope used by the service.
pub const SCOPE_NAME: &str = "catalogue";

/// Attribute carrying the request counter on spans and metric points.
pub const REQUEST_COUNT_ATTRIBUTE: &str = "RequestCnt.value";

/// Instruments used by the catalogue handler.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Number of times the catalogue endpoint was called.
    pub request_count: Counter<u64>,
}

impl Metrics {
    /// Create the instruments from a meter.
    pub fn new(meter: &Meter) -> Self {
        Self {
            request_count: meter
                .u64_counter("request_count")
                .with_description("The number of times api is called")
                .with_unit("{count}")
                .init(),
        }
    }

    /// Record one served request, tagged with its counter value.
    pub fn record_request(&self, count: u64) {
        let attrs = [KeyValue::new(REQUEST_COUNT_ATTRIBUTE, count_value(count))];
        self.request_count.add(1, &attrs);
    }
}

/// Counter value as an OpenTelemetry integer attribute.
pub fn count_value(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
