//! Catalogue endpoint handler.
//!
//! Counts the request, tags the `catalogue` span and the `request_count`
//! metric with the count, then runs the simulated call chain inside the span.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{field, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::chain::cart;
use super::AppState;
use crate::observability::metrics::{count_value, REQUEST_COUNT_ATTRIBUTE};
use crate::observability::propagation::extract_remote_context;

/// Handle GET / - count the request and walk the call chain.
///
/// The body is the new count followed by a newline. Unless the state asks to
/// abort on disconnect, the chain runs on its own task so it completes even
/// if the client goes away.
pub async fn handle_catalogue(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<String, StatusCode> {
    let span = tracing::info_span!("catalogue", RequestCnt.value = field::Empty);
    span.set_parent(extract_remote_context(&headers));

    let abort_on_disconnect = state.abort_on_disconnect;
    let work = serve_catalogue(state).instrument(span);

    if abort_on_disconnect {
        return Ok(work.await);
    }

    tokio::spawn(work).await.map_err(|e| {
        tracing::error!(error = %e, "Catalogue request task failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn serve_catalogue(state: AppState) -> String {
    let count = state.counter.increment();
    Span::current().record(REQUEST_COUNT_ATTRIBUTE, count_value(count));
    state.metrics.record_request(count);

    let body = format!("{count}\n");

    cart(&state.timings).await;
    tokio::time::sleep(state.timings.handler).await;

    tracing::debug!(count, "Catalogue request served");
    body
}
