//! Telemetry sinks that log or fan out events

use std::sync::Arc;

use camvault_core::{domain::TelemetryEvent, ports::ITelemetrySink};

/// Writes each event to the `camvault::telemetry` tracing target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl ITelemetrySink for TracingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        let properties = event
            .properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::debug!(
            target: "camvault::telemetry",
            event = %event.name,
            %properties,
            "telemetry"
        );
    }
}

/// Forwards every event to each inner sink, in order
#[derive(Clone, Default)]
pub struct FanOutTelemetry {
    sinks: Vec<Arc<dyn ITelemetrySink>>,
}

impl FanOutTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn ITelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ITelemetrySink for FanOutTelemetry {
    fn record(&self, event: TelemetryEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.record(event.clone());
            }
            last.record(event);
        }
    }
}
