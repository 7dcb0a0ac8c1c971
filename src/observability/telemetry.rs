//! OpenTelemetry pipeline bootstrap and teardown.
//!
//! [`init_telemetry`] installs the W3C propagator, builds the tracer provider
//! (OTLP over HTTP) and the meter provider (periodic reader over the
//! configured sink, OTLP also over HTTP), and hands back a [`Telemetry`] handle. Each component
//! registers a shutdown hook as it is built; if a later component fails, the
//! hooks registered so far run before the error is returned.

use std::fmt;
use std::time::Duration;

use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{ManualReader, PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};

use super::error::TelemetryError;
use super::propagation;
use crate::config::MetricsExporterKind;

/// Paths the OTLP/HTTP collector serves each signal on.
const TRACES_PATH: &str = "/v1/traces";
const METRICS_PATH: &str = "/v1/metrics";

/// Telemetry settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// `service.name` resource attribute.
    pub service_name: String,
    /// Collector base endpoint; the exporter default is used when absent.
    pub otel_endpoint: Option<String>,
    /// Where metric snapshots go.
    pub metrics_exporter: MetricsExporterKind,
    /// Period of the metric reader.
    pub metrics_interval: Duration,
    /// Timeout for one export call.
    pub export_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "catalogue".into(),
            otel_endpoint: None,
            metrics_exporter: MetricsExporterKind::Stdout,
            metrics_interval: Duration::from_secs(600),
            export_timeout: Duration::from_secs(10),
        }
    }
}

/// A telemetry component that can be closed once.
pub trait Shutdown: Send + 'static {
    /// Flush buffered data and release the component.
    fn shutdown(&self) -> Result<(), TelemetryError>;
}

// Provider shutdown flushes pending data itself, and a failed export must
// never stop the provider from closing.
impl Shutdown for TracerProvider {
    fn shutdown(&self) -> Result<(), TelemetryError> {
        TracerProvider::shutdown(self).map_err(TelemetryError::TraceShutdown)
    }
}

impl Shutdown for SdkMeterProvider {
    fn shutdown(&self) -> Result<(), TelemetryError> {
        SdkMeterProvider::shutdown(self).map_err(TelemetryError::MetricShutdown)
    }
}

/// Lifecycle of a telemetry pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initializing,
    Ready,
    ShuttingDown,
    Closed,
}

type Hook = Box<dyn FnOnce() -> Result<(), TelemetryError> + Send>;

/// Cleanup callbacks registered while the pipeline is built.
///
/// [`run`](Self::run) invokes every hook once, in registration order, and
/// clears the list, so later calls do nothing.
#[derive(Default)]
pub struct ShutdownHooks {
    hooks: Vec<(&'static str, Hook)>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cleanup callback.
    pub fn register<F>(&mut self, name: &'static str, hook: F)
    where
        F: FnOnce() -> Result<(), TelemetryError> + Send + 'static,
    {
        self.hooks.push((name, Box::new(hook)));
    }

    /// Register the shutdown of a component.
    pub fn register_component<C: Shutdown>(&mut self, name: &'static str, component: C) {
        self.register(name, move || component.shutdown());
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every registered hook, joining the failures.
    pub fn run(&mut self) -> Result<(), TelemetryError> {
        let mut errors = Vec::new();
        for (name, hook) in self.hooks.drain(..) {
            match hook() {
                Ok(()) => tracing::debug!(component = name, "Telemetry component shut down"),
                Err(e) => {
                    tracing::warn!(component = name, error = %e, "Telemetry component failed to shut down");
                    errors.push(e);
                }
            }
        }
        TelemetryError::join(errors)
    }
}

impl fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.hooks.iter().map(|(name, _)| *name).collect();
        f.debug_struct("ShutdownHooks").field("hooks", &names).finish()
    }
}

/// Handle to a running telemetry pipeline.
///
/// Call [`shutdown`](Self::shutdown) or [`shutdown_within`](Self::shutdown_within)
/// to flush and close the providers. A handle dropped while still ready is
/// shut down on drop, with failures logged.
pub struct Telemetry<T = TracerProvider, M = SdkMeterProvider> {
    tracer_provider: T,
    meter_provider: M,
    hooks: ShutdownHooks,
    state: Lifecycle,
}

impl<T, M> Telemetry<T, M>
where
    T: Shutdown + Clone,
    M: Shutdown + Clone,
{
    /// Assemble a pipeline from component builders.
    ///
    /// The tracing component is built first. If the metrics builder fails,
    /// the tracing component is shut down before the error is returned, and
    /// any shutdown failure is joined to it.
    pub fn bootstrap<BT, BM>(build_tracing: BT, build_metrics: BM) -> Result<Self, TelemetryError>
    where
        BT: FnOnce() -> Result<T, TelemetryError>,
        BM: FnOnce() -> Result<M, TelemetryError>,
    {
        let mut state = Lifecycle::Uninitialized;
        let mut hooks = ShutdownHooks::new();
        transition(&mut state, Lifecycle::Initializing);

        let tracer_provider = match build_tracing() {
            Ok(provider) => provider,
            Err(e) => return Err(abort(&mut hooks, e)),
        };
        hooks.register_component("tracer_provider", tracer_provider.clone());

        let meter_provider = match build_metrics() {
            Ok(provider) => provider,
            Err(e) => return Err(abort(&mut hooks, e)),
        };
        hooks.register_component("meter_provider", meter_provider.clone());

        transition(&mut state, Lifecycle::Ready);
        Ok(Self {
            tracer_provider,
            meter_provider,
            hooks,
            state,
        })
    }
}

impl<T, M> Telemetry<T, M> {
    pub fn tracer_provider(&self) -> &T {
        &self.tracer_provider
    }

    pub fn meter_provider(&self) -> &M {
        &self.meter_provider
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Shut every component down once, joining the failures.
    ///
    /// Calling this again after the pipeline is closed returns `Ok(())`.
    pub fn shutdown(&mut self) -> Result<(), TelemetryError> {
        if self.state == Lifecycle::Closed {
            return Ok(());
        }
        transition(&mut self.state, Lifecycle::ShuttingDown);
        let result = self.hooks.run();
        transition(&mut self.state, Lifecycle::Closed);
        result
    }
}

impl<T, M> Telemetry<T, M>
where
    T: Send + 'static,
    M: Send + 'static,
{
    /// Shut down on a blocking thread, giving up after `grace`.
    ///
    /// Provider shutdown blocks while exporters drain, so it is kept off the
    /// async worker threads.
    pub async fn shutdown_within(mut self, grace: Duration) -> Result<(), TelemetryError> {
        let task = tokio::task::spawn_blocking(move || self.shutdown());
        match tokio::time::timeout(grace, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                tracing::error!(error = %join_error, "Telemetry shutdown task failed");
                Err(TelemetryError::ShutdownTask(join_error))
            }
            Err(_) => Err(TelemetryError::ShutdownTimeout(grace)),
        }
    }
}

impl Telemetry {
    /// A meter from the pipeline's meter provider.
    pub fn meter(&self, name: &'static str) -> Meter {
        self.meter_provider.meter(name)
    }
}

impl<T, M> fmt::Debug for Telemetry<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("state", &self.state)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl<T, M> Drop for Telemetry<T, M> {
    fn drop(&mut self) {
        if self.state == Lifecycle::Ready {
            if let Err(e) = self.shutdown() {
                tracing::error!(error = %e, "Failed to shut down telemetry on drop");
            }
        }
    }
}

fn transition(state: &mut Lifecycle, next: Lifecycle) {
    tracing::debug!(from = ?*state, to = ?next, "Telemetry lifecycle transition");
    *state = next;
}

/// Release whatever was built before `error`, keeping every failure.
fn abort(hooks: &mut ShutdownHooks, error: TelemetryError) -> TelemetryError {
    match hooks.run() {
        Ok(()) => error,
        Err(cleanup) => error.and(cleanup),
    }
}

/// Bootstrap the OpenTelemetry pipeline described by `config`.
///
/// Installs the composite trace-context + baggage propagator as the global
/// default. The returned handle must be shut down to flush pending spans and
/// metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<Telemetry, TelemetryError> {
    propagation::install();

    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        config.service_name.clone(),
    )]);

    let telemetry = Telemetry::bootstrap(
        || build_tracer_provider(config, resource.clone()),
        || build_meter_provider(config, resource.clone()),
    )?;

    tracing::info!(
        service = %config.service_name,
        endpoint = config.otel_endpoint.as_deref().unwrap_or("default"),
        metrics = ?config.metrics_exporter,
        "Telemetry initialized"
    );
    Ok(telemetry)
}

/// Full OTLP/HTTP traces URL for a collector base endpoint.
pub fn traces_endpoint(base: &str) -> String {
    format!("{}{TRACES_PATH}", base.trim_end_matches('/'))
}

/// Full OTLP/HTTP metrics URL for a collector base endpoint.
pub fn metrics_endpoint(base: &str) -> String {
    format!("{}{METRICS_PATH}", base.trim_end_matches('/'))
}

fn build_tracer_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<TracerProvider, TelemetryError> {
    let mut exporter = opentelemetry_otlp::new_exporter()
        .http()
        .with_timeout(config.export_timeout);
    if let Some(endpoint) = &config.otel_endpoint {
        exporter = exporter.with_endpoint(traces_endpoint(endpoint));
    }
    let exporter = exporter
        .build_span_exporter()
        .map_err(TelemetryError::TraceExporter)?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .build())
}

fn build_meter_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkMeterProvider, TelemetryError> {
    match config.metrics_exporter {
        MetricsExporterKind::Stdout => {
            let exporter = opentelemetry_stdout::MetricsExporter::default();
            let reader = PeriodicReader::builder(exporter, runtime::Tokio)
                .with_interval(config.metrics_interval)
                .with_timeout(config.export_timeout)
                .build();
            Ok(SdkMeterProvider::builder()
                .with_reader(reader)
                .with_resource(resource)
                .build())
        }
        MetricsExporterKind::Otlp => {
            let mut exporter = opentelemetry_otlp::new_exporter()
                .http()
                .with_timeout(config.export_timeout);
            if let Some(endpoint) = &config.otel_endpoint {
                exporter = exporter.with_endpoint(metrics_endpoint(endpoint));
            }

            opentelemetry_otlp::new_pipeline()
                .metrics(runtime::Tokio)
                .with_exporter(exporter)
                .with_period(config.metrics_interval)
                .with_resource(resource)
                .build()
                .map_err(TelemetryError::MetricExporter)
        }
        MetricsExporterKind::None => {
            // Instruments still record; nothing is ever exported.
            let reader = ManualReader::builder().build();
            Ok(SdkMeterProvider::builder()
                .with_reader(reader)
                .with_resource(resource)
                .build())
        }
    }
}
