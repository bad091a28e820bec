//! Periodic triggers
//!
//! The [`SyncScheduler`] drives three independent loops on the current
//! runtime until its shutdown token is canceled:
//!
//! ```text
//! upload tick ──→ spawn UploadPipeline::upload_pictures(first camera)
//! sweep tick  ──→ spawn RetentionSweeper::delete_expired_pictures(camera)  (each camera)
//! refresh     ──→ Authenticator::run_refresh_loop
//! ```
//!
//! The local buffer holds the first camera's pictures, so only that camera
//! uploads; the other cameras' remote folders are still expired.
//!
//! Passes are spawned rather than awaited so a slow pass never delays the
//! next tick; the upload lock turns an overlapping tick into a skip.

use std::{sync::Arc, time::Duration};

use camvault_core::{config::ScheduleConfig, domain::CameraName};
use camvault_onedrive::auth::Authenticator;
use tokio::time::MissedTickBehavior;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, warn};

use crate::{
    sweeper::{RetentionSweeper, SweepOutcome},
    uploader::UploadPipeline,
};

/// Periods of the three triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub upload_interval: Duration,
    pub sweep_interval: Duration,
    pub token_refresh_interval: Duration,
}

impl From<&ScheduleConfig> for ScheduleSettings {
    fn from(config: &ScheduleConfig) -> Self {
        Self {
            upload_interval: Duration::from_secs(config.upload_interval_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            token_refresh_interval: Duration::from_secs(config.token_refresh_interval_secs),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self::from(&ScheduleConfig::default())
    }
}

/// Runs the upload, sweep and refresh triggers
pub struct SyncScheduler {
    auth: Arc<Authenticator>,
    uploader: Arc<UploadPipeline>,
    sweeper: Arc<RetentionSweeper>,
    cameras: Vec<CameraName>,
    settings: ScheduleSettings,
    tasks: TaskTracker,
}

impl SyncScheduler {
    pub fn new(
        auth: Arc<Authenticator>,
        uploader: Arc<UploadPipeline>,
        sweeper: Arc<RetentionSweeper>,
        cameras: Vec<CameraName>,
        settings: ScheduleSettings,
    ) -> Self {
        if cameras.len() > 1 {
            info!(
                upload_camera = %cameras[0],
                cameras = cameras.len(),
                "Buffer uploads under the first camera; all cameras are swept"
            );
        }
        Self {
            auth,
            uploader,
            sweeper,
            cameras,
            settings,
            tasks: TaskTracker::new(),
        }
    }

    /// Runs until `shutdown` is canceled, then waits for in-flight passes
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            cameras = self.cameras.len(),
            upload_secs = self.settings.upload_interval.as_secs(),
            sweep_secs = self.settings.sweep_interval.as_secs(),
            refresh_secs = self.settings.token_refresh_interval.as_secs(),
            "Scheduler started"
        );

        tokio::join!(
            self.upload_loop(shutdown.clone()),
            self.sweep_loop(shutdown.clone()),
            self.auth
                .run_refresh_loop(self.settings.token_refresh_interval, shutdown.clone()),
        );

        self.tasks.close();
        self.tasks.wait().await;
        info!("Scheduler stopped");
    }

    /// Camera the local buffer is uploaded under
    pub fn upload_camera(&self) -> Option<&CameraName> {
        self.cameras.first()
    }

    async fn upload_loop(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.upload_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Some(camera) = self.upload_camera() {
                        let uploader = self.uploader.clone();
                        let camera = camera.clone();
                        self.tasks.spawn(async move {
                            if let Err(e) = uploader.upload_pictures(&camera).await {
                                warn!(%camera, error = %e, "Upload pass failed");
                            }
                        });
                    }
                }
            }
        }
        debug!("Upload trigger stopped");
    }

    async fn sweep_loop(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    for camera in &self.cameras {
                        let sweeper = self.sweeper.clone();
                        let camera = camera.clone();
                        self.tasks.spawn(async move {
                            if let SweepOutcome::ListingFailed { bucket, .. } =
                                sweeper.delete_expired_pictures(&camera).await
                            {
                                debug!(%camera, bucket = %bucket, "Sweep will retry on the next tick");
                            }
                        });
                    }
                }
            }
        }
        debug!("Sweep trigger stopped");
    }
}
