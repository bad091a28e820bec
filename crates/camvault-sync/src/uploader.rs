//! Upload pipeline
//!
//! Moves every picture in the local buffer to
//! `{root}/{camera}/{MM_dd_yyyy}/{HH}_{ticks}.jpg`, one file at a time.
//!
//! ## Guarantees
//!
//! - At most one pass runs at a time. A pass started while another holds the
//!   lock returns [`UploadOutcome::Skipped`] immediately instead of waiting.
//! - A local file is removed only after the provider answered 201 Created
//!   for that file.
//! - A failed file is left in place for the next pass and does not stop the
//!   rest of the batch.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use camvault_core::{
    domain::{events::names, CameraName, RemotePictureName, TelemetryEvent, TickSource},
    ports::{BufferedPicture, IPictureBuffer, ITelemetrySink},
};
use camvault_onedrive::{auth::Authenticator, client::OneDriveClient, OneDriveError};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::SyncError;

/// Why a pass did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotLoggedIn,
    /// Another pass holds the upload lock
    Busy,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotLoggedIn => f.write_str("not logged in"),
            SkipReason::Busy => f.write_str("another upload pass is running"),
        }
    }
}

/// Counts for one completed pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub camera: String,
    pub attempted: usize,
    pub uploaded: usize,
    pub failed: usize,
}

/// Result of [`UploadPipeline::upload_pictures`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Skipped { reason: SkipReason },
    Completed(UploadReport),
}

/// Returns the local wall-clock time used for bucket names
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Uploads buffered pictures and removes them locally once stored
pub struct UploadPipeline {
    auth: Arc<Authenticator>,
    client: Arc<OneDriveClient>,
    buffer: Arc<dyn IPictureBuffer>,
    telemetry: Arc<dyn ITelemetrySink>,
    ticks: TickSource,
    clock: Clock,
    lock: tokio::sync::Mutex<()>,
    uploaded: AtomicU64,
}

impl UploadPipeline {
    pub fn new(
        auth: Arc<Authenticator>,
        client: Arc<OneDriveClient>,
        buffer: Arc<dyn IPictureBuffer>,
        telemetry: Arc<dyn ITelemetrySink>,
    ) -> Self {
        Self {
            auth,
            client,
            buffer,
            telemetry,
            ticks: TickSource::new(),
            clock: local_now,
            lock: tokio::sync::Mutex::new(()),
            uploaded: AtomicU64::new(0),
        }
    }

    /// Replaces the clock used for the date and hour buckets
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Pictures uploaded since the pipeline was created
    pub fn uploaded_count(&self) -> u64 {
        self.uploaded.load(Ordering::Relaxed)
    }

    /// Runs one upload pass for `camera`
    ///
    /// # Errors
    /// [`SyncError::Buffer`] when the buffer cannot be enumerated. Per-file
    /// failures are counted in the report, never returned.
    pub async fn upload_pictures(&self, camera: &CameraName) -> Result<UploadOutcome, SyncError> {
        if !self.auth.is_logged_in() {
            debug!(%camera, "Not logged in, skipping upload pass");
            return Ok(self.skipped(camera, SkipReason::NotLoggedIn));
        }

        let Ok(_pass) = self.lock.try_lock() else {
            debug!(%camera, "Upload pass already running, skipping");
            return Ok(self.skipped(camera, SkipReason::Busy));
        };

        let pictures = self
            .buffer
            .list()
            .await
            .map_err(|e| SyncError::Buffer(format!("{:#}", e)))?;

        let mut report = UploadReport {
            camera: camera.to_string(),
            ..UploadReport::default()
        };

        for picture in &pictures {
            report.attempted += 1;
            match self.upload_one(camera, picture).await {
                Ok(name) => {
                    report.uploaded += 1;
                    self.uploaded.fetch_add(1, Ordering::Relaxed);
                    debug!(%camera, remote_name = %name, "Picture uploaded");
                    self.telemetry.record(
                        TelemetryEvent::new(names::PICTURE_UPLOADED)
                            .with("camera", camera)
                            .with("file", picture.path.display())
                            .with("remote_name", &name),
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        %camera,
                        path = %picture.path.display(),
                        error = %e,
                        "Upload failed, keeping local copy"
                    );
                    let mut event = TelemetryEvent::new(names::UPLOAD_FAILED)
                        .with("camera", camera)
                        .with("file", picture.path.display())
                        .with("error", &e);
                    if let SyncError::Remote(remote) = &e {
                        if let Some(status) = remote.status() {
                            event = event.with("status", status);
                        }
                    }
                    self.telemetry.record(event);
                }
            }
        }

        if report.attempted > 0 {
            info!(
                %camera,
                attempted = report.attempted,
                uploaded = report.uploaded,
                failed = report.failed,
                "Upload pass completed"
            );
        }
        self.telemetry.record(
            TelemetryEvent::new(names::UPLOAD_PASS_COMPLETED)
                .with("camera", camera)
                .with("count", report.uploaded)
                .with("failed", report.failed),
        );

        Ok(UploadOutcome::Completed(report))
    }

    async fn upload_one(
        &self,
        camera: &CameraName,
        picture: &BufferedPicture,
    ) -> Result<RemotePictureName, SyncError> {
        // Snapshot per file so a refresh mid-batch is picked up by later files
        let session = self.auth.session().ok_or(OneDriveError::NotLoggedIn)?;

        let body = self
            .buffer
            .read(picture)
            .await
            .map_err(|e| SyncError::FileOpen {
                path: picture.path.clone(),
                message: format!("{:#}", e),
            })?;

        let name = RemotePictureName::new(camera, (self.clock)(), self.ticks.next());
        self.client.upload_picture(&session, &name, body).await?;

        if let Err(e) = self.buffer.remove(picture).await {
            warn!(
                path = %picture.path.display(),
                error = %e,
                "Uploaded picture could not be removed locally"
            );
        }
        Ok(name)
    }

    fn skipped(&self, camera: &CameraName, reason: SkipReason) -> UploadOutcome {
        self.telemetry.record(
            TelemetryEvent::new(names::UPLOAD_PASS_SKIPPED)
                .with("camera", camera)
                .with("reason", reason),
        );
        UploadOutcome::Skipped { reason }
    }
}
