//! HTTP handlers for the catalogue service.

pub mod catalogue;
pub mod chain;
pub mod counter;

pub use chain::ChainTimings;
pub use counter::RequestCounter;

use axum::{routing::get, Router};

use crate::observability::metrics::Metrics;

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub counter: RequestCounter,
    pub metrics: Metrics,
    pub timings: ChainTimings,
    /// Drop a request's simulated work when the client goes away instead of
    /// running it to completion.
    pub abort_on_disconnect: bool,
}

impl AppState {
    /// Create state with a fresh counter.
    pub fn new(metrics: Metrics, timings: ChainTimings) -> Self {
        Self {
            counter: RequestCounter::new(),
            metrics,
            timings,
            abort_on_disconnect: false,
        }
    }

    pub fn with_abort_on_disconnect(mut self, abort: bool) -> Self {
        self.abort_on_disconnect = abort;
        self
    }
}

/// Create the HTTP router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(catalogue::handle_catalogue))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Handle GET /health - Basic health check.
async fn health_handler() -> &'static str {
    "OK"
}
