//! Retention sweeper
//!
//! Each run expires exactly one day bucket: the one dated
//! `today - retention_days`. Sweeps run often enough (hourly by default)
//! that every bucket gets its turn.
//!
//! Deletions are only attempted against a listing the provider confirmed.
//! A failed listing ends the run without touching anything; a folder that
//! does not exist counts as confirmed empty.

use std::sync::Arc;

use camvault_core::{
    domain::{
        date_bucket, events::names, retention_cutoff, CameraName, RemoteFolderPath,
        TelemetryEvent,
    },
    ports::ITelemetrySink,
};
use camvault_onedrive::{auth::Authenticator, client::OneDriveClient, OneDriveError};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::uploader::SkipReason;

/// Counts for one completed sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub camera: String,
    /// Day bucket that was swept, `MM_dd_yyyy`
    pub bucket: String,
    pub listed: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Result of [`RetentionSweeper::delete_expired_pictures`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    Skipped { reason: SkipReason },
    /// The listing failed; nothing was deleted
    ListingFailed { bucket: String, error: String },
    Completed(SweepReport),
}

/// Deletes remote pictures older than the retention period
pub struct RetentionSweeper {
    auth: Arc<Authenticator>,
    client: Arc<OneDriveClient>,
    telemetry: Arc<dyn ITelemetrySink>,
    retention_days: u32,
}

impl RetentionSweeper {
    pub fn new(
        auth: Arc<Authenticator>,
        client: Arc<OneDriveClient>,
        telemetry: Arc<dyn ITelemetrySink>,
        retention_days: u32,
    ) -> Self {
        Self {
            auth,
            client,
            telemetry,
            retention_days,
        }
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Sweeps the expired bucket for `camera`, relative to today's local date
    pub async fn delete_expired_pictures(&self, camera: &CameraName) -> SweepOutcome {
        self.delete_expired_pictures_on(camera, Local::now().date_naive())
            .await
    }

    /// Sweeps the bucket dated `today - retention_days`
    pub async fn delete_expired_pictures_on(
        &self,
        camera: &CameraName,
        today: NaiveDate,
    ) -> SweepOutcome {
        let Some(session) = self.auth.session() else {
            debug!(%camera, "Not logged in, skipping sweep");
            return SweepOutcome::Skipped {
                reason: SkipReason::NotLoggedIn,
            };
        };

        let cutoff = retention_cutoff(today, self.retention_days);
        let bucket = date_bucket(cutoff);
        let folder = RemoteFolderPath::day_bucket(self.client.root_folder(), camera, cutoff);

        let names_listed = match self.client.list_pictures(&session, &folder).await {
            Ok(listed) => listed,
            Err(e) => {
                warn!(%camera, %folder, error = %e, "Listing failed, sweep aborted");
                self.telemetry.record(
                    TelemetryEvent::new(names::REMOTE_LISTING_FAILED)
                        .with("camera", camera)
                        .with("folder", &folder)
                        .with("error", &e),
                );
                return SweepOutcome::ListingFailed {
                    bucket,
                    error: e.to_string(),
                };
            }
        };

        let mut report = SweepReport {
            camera: camera.to_string(),
            bucket,
            listed: names_listed.len(),
            ..SweepReport::default()
        };

        for name in &names_listed {
            let result = match self.auth.session() {
                Some(session) => self.client.delete_picture(&session, &folder, name).await,
                None => Err(OneDriveError::NotLoggedIn),
            };

            match result {
                Ok(()) => {
                    report.deleted += 1;
                    debug!(%camera, %folder, name = %name, "Expired picture deleted");
                    self.telemetry.record(
                        TelemetryEvent::new(names::PICTURE_DELETED)
                            .with("camera", camera)
                            .with("remote_name", format!("{}/{}", folder, name)),
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(%camera, %folder, name = %name, error = %e, "Delete failed");
                    let mut event = TelemetryEvent::new(names::DELETE_FAILED)
                        .with("camera", camera)
                        .with("remote_name", format!("{}/{}", folder, name))
                        .with("error", &e);
                    if let Some(status) = e.status() {
                        event = event.with("status", status);
                    }
                    self.telemetry.record(event);
                }
            }
        }

        info!(
            %camera,
            bucket = %report.bucket,
            listed = report.listed,
            deleted = report.deleted,
            failed = report.failed,
            "Retention sweep completed"
        );
        self.telemetry.record(
            TelemetryEvent::new(names::SWEEP_COMPLETED)
                .with("camera", camera)
                .with("bucket", &report.bucket)
                .with("count", report.deleted)
                .with("failed", report.failed),
        );

        SweepOutcome::Completed(report)
    }
}
