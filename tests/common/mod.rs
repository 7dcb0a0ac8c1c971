//! Test utilities for catalogue tests.
//!
//! Provides:
//! - A recording `tracing` layer capturing span names, parents, fields and close order
//! - Router and state fixtures backed by an in-memory meter provider
//! - Request helpers, with or without propagation headers

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use catalogue::observability::metrics::{Metrics, SCOPE_NAME};
use catalogue::service::{create_router, AppState, ChainTimings};
use opentelemetry::metrics::MeterProvider as _;
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// One span seen by the [`SpanRecorder`].
#[derive(Debug, Clone)]
pub struct SpanRecord {
    pub id: u64,
    pub name: String,
    pub parent: Option<String>,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub spans: Vec<SpanRecord>,
    /// Span names in the order they closed.
    pub closed: Vec<String>,
}

impl Recorded {
    pub fn names(&self) -> Vec<&str> {
        self.spans.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn by_name(&self, name: &str) -> Vec<&SpanRecord> {
        self.spans.iter().filter(|s| s.name == name).collect()
    }
}

/// Layer that records span structure for assertions.
#[derive(Clone, Default)]
pub struct SpanRecorder {
    inner: Arc<Mutex<Recorded>>,
}

impl SpanRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().expect("recorder poisoned")
    }

    /// Install this recorder as the default subscriber for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }
}

#[derive(Default)]
struct FieldCollector(HashMap<String, String>);

impl Visit for FieldCollector {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S> Layer<S> for SpanRecorder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let parent = ctx
            .span(id)
            .and_then(|span| span.parent())
            .map(|parent| parent.name().to_string());

        let mut fields = FieldCollector::default();
        attrs.record(&mut fields);

        self.recorded().spans.push(SpanRecord {
            id: id.into_u64(),
            name: attrs.metadata().name().to_string(),
            parent,
            fields: fields.0,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut recorded = self.recorded();
        // Ids are reused after close; the latest span with this id is the live one.
        if let Some(span) = recorded
            .spans
            .iter_mut()
            .rev()
            .find(|s| s.id == id.into_u64())
        {
            let mut fields = FieldCollector::default();
            values.record(&mut fields);
            span.fields.extend(fields.0);
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(&id) {
            self.recorded().closed.push(span.name().to_string());
        }
    }
}

/// Router fixture. The meter provider lives as long as the fixture.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub meter_provider: SdkMeterProvider,
}

impl TestApp {
    pub fn new(timings: ChainTimings) -> Self {
        Self::with_abort_on_disconnect(timings, false)
    }

    pub fn with_abort_on_disconnect(timings: ChainTimings, abort: bool) -> Self {
        let reader = ManualReader::builder().build();
        let meter_provider = SdkMeterProvider::builder().with_reader(reader).build();
        Self::build(timings, abort, meter_provider)
    }

    /// Fixture whose instruments record into `meter_provider`.
    pub fn with_meter_provider(timings: ChainTimings, meter_provider: SdkMeterProvider) -> Self {
        Self::build(timings, false, meter_provider)
    }

    fn build(timings: ChainTimings, abort: bool, meter_provider: SdkMeterProvider) -> Self {
        let metrics = Metrics::new(&meter_provider.meter(SCOPE_NAME));
        let state = AppState::new(metrics, timings).with_abort_on_disconnect(abort);
        Self {
            router: create_router(state.clone()),
            state,
            meter_provider,
        }
    }

    /// Issue `GET path` and return the status and body.
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        get(self.router.clone(), path).await
    }

    /// Issue `GET path` with one extra request header.
    pub async fn get_with_header(
        &self,
        path: &str,
        name: &str,
        value: &str,
    ) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(path)
            .header(name, value)
            .body(Body::empty())
            .expect("valid request");
        send(self.router.clone(), request).await
    }
}

/// Issue `GET path` against `router` and return the status and body.
pub async fn get(router: Router, path: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("valid request");
    send(router, request).await
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.expect("router is infallible");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf-8 body"))
}
