//! Prometheus metrics registry for CamVault
//!
//! Counters are driven by telemetry events: the registry is itself an
//! [`ITelemetrySink`], so the engine never calls it directly.

use camvault_core::{
    domain::{events::names, TelemetryEvent},
    ports::ITelemetrySink,
};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Label used when an event carries no `camera` property
const UNKNOWN_CAMERA: &str = "unknown";

/// Central metrics registry holding all Prometheus metrics.
pub struct MetricsRegistry {
    registry: Registry,
    /// Counter: pictures uploaded, by camera
    pub pictures_uploaded_total: IntCounterVec,
    /// Counter: failed picture uploads, by camera
    pub upload_failures_total: IntCounterVec,
    /// Counter: upload passes, by camera and result (completed, skipped)
    pub upload_passes_total: IntCounterVec,
    /// Counter: expired remote pictures deleted, by camera
    pub pictures_deleted_total: IntCounterVec,
    /// Counter: failed remote deletions, by camera
    pub delete_failures_total: IntCounterVec,
    /// Counter: failed remote listings, by camera
    pub listing_failures_total: IntCounterVec,
    /// Counter: token exchanges, by result (refreshed, refresh_failed, login)
    pub token_exchanges_total: IntCounterVec,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("camvault".to_string()), None)?;

        let counter = |name: &str, help: &str, labels: &[&str]| -> anyhow::Result<IntCounterVec> {
            let vec = IntCounterVec::new(Opts::new(name, help), labels)?;
            registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        };

        let pictures_uploaded_total = counter(
            "pictures_uploaded_total",
            "Pictures uploaded to remote storage",
            &["camera"],
        )?;
        let upload_failures_total = counter(
            "upload_failures_total",
            "Picture uploads that failed",
            &["camera"],
        )?;
        let upload_passes_total = counter(
            "upload_passes_total",
            "Upload passes by result",
            &["camera", "result"],
        )?;
        let pictures_deleted_total = counter(
            "pictures_deleted_total",
            "Expired remote pictures deleted",
            &["camera"],
        )?;
        let delete_failures_total = counter(
            "delete_failures_total",
            "Remote deletions that failed",
            &["camera"],
        )?;
        let listing_failures_total = counter(
            "listing_failures_total",
            "Remote folder listings that failed",
            &["camera"],
        )?;
        let token_exchanges_total = counter(
            "token_exchanges_total",
            "Token exchanges by result",
            &["result"],
        )?;

        Ok(Self {
            registry,
            pictures_uploaded_total,
            upload_failures_total,
            upload_passes_total,
            pictures_deleted_total,
            delete_failures_total,
            listing_failures_total,
            token_exchanges_total,
        })
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl ITelemetrySink for MetricsRegistry {
    fn record(&self, event: TelemetryEvent) {
        let camera = event.property("camera").unwrap_or(UNKNOWN_CAMERA);
        match event.name.as_str() {
            names::PICTURE_UPLOADED => self
                .pictures_uploaded_total
                .with_label_values(&[camera])
                .inc(),
            names::UPLOAD_FAILED => self.upload_failures_total.with_label_values(&[camera]).inc(),
            names::UPLOAD_PASS_COMPLETED => self
                .upload_passes_total
                .with_label_values(&[camera, "completed"])
                .inc(),
            names::UPLOAD_PASS_SKIPPED => self
                .upload_passes_total
                .with_label_values(&[camera, "skipped"])
                .inc(),
            names::PICTURE_DELETED => self
                .pictures_deleted_total
                .with_label_values(&[camera])
                .inc(),
            names::DELETE_FAILED => self.delete_failures_total.with_label_values(&[camera]).inc(),
            names::REMOTE_LISTING_FAILED => self
                .listing_failures_total
                .with_label_values(&[camera])
                .inc(),
            names::TOKEN_REFRESHED => self
                .token_exchanges_total
                .with_label_values(&["refreshed"])
                .inc(),
            names::TOKEN_REFRESH_FAILED => self
                .token_exchanges_total
                .with_label_values(&["refresh_failed"])
                .inc(),
            names::LOGIN_SUCCEEDED => self
                .token_exchanges_total
                .with_label_values(&["login"])
                .inc(),
            _ => {}
        }
    }
}
