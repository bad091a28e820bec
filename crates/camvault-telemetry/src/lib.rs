//! CamVault Telemetry - event sinks and metrics
//!
//! Provides:
//! - `TracingTelemetry`: writes every event to the `tracing` log
//! - `FanOutTelemetry`: forwards every event to several sinks
//! - `MetricsRegistry`: Prometheus counters fed from telemetry events
//! - `MetricsServer`: HTTP server for Prometheus scraping

pub mod events;
pub mod metrics;
pub mod server;

pub use events::{FanOutTelemetry, TracingTelemetry};
pub use metrics::MetricsRegistry;
pub use server::MetricsServer;
