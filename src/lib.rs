//! Catalogue: a small HTTP service instrumented with OpenTelemetry.
//!
//! Every request to `GET /` bumps a process-wide counter, opens a
//! `catalogue` span, records a `request_count` metric and walks a simulated
//! call chain (cart → order → payment) whose stages sleep to emulate work.
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`observability`]: Telemetry bootstrap, logging and metric instruments
//! - [`server`]: HTTP server setup and lifecycle
//! - [`service`]: Request handler, call chain and shared state

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // observability::telemetry::TelemetryConfig is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod observability;
pub mod server;
pub mod service;
