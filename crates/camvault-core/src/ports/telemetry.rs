//! Telemetry sink port (driven/secondary port)
//!
//! Delivery is best-effort: `record` cannot fail and must not block, so
//! implementations buffer, log or drop as they see fit.

use crate::domain::TelemetryEvent;

/// Receiver of telemetry events
pub trait ITelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Sink that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl ITelemetrySink for NoopTelemetry {
    fn record(&self, _event: TelemetryEvent) {}
}
