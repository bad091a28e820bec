//! Sweep command - one retention sweep for a camera

use std::sync::Arc;

use anyhow::Result;
use camvault_sync::{RetentionSweeper, SweepOutcome};
use clap::Args;

use super::{resolve_camera, CommandContext, RemoteContext};

#[derive(Debug, Args)]
pub struct SweepCommand {
    /// Camera name; defaults to the first configured camera
    #[arg(long)]
    camera: Option<String>,

    /// Override storage.retention_days for this run
    #[arg(long)]
    retention_days: Option<u32>,
}

impl SweepCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let remote = RemoteContext::new(ctx.load_config()?);
        let camera = resolve_camera(&remote.config, self.camera.as_deref())?;

        let retention_days = self
            .retention_days
            .unwrap_or(remote.config.storage.retention_days);
        if retention_days == 0 {
            anyhow::bail!("--retention-days must be at least 1");
        }
        remote.require_session().await?;

        let sweeper = RetentionSweeper::new(
            Arc::clone(&remote.auth),
            Arc::clone(&remote.client),
            Arc::clone(&remote.telemetry),
            retention_days,
        );
        let outcome = sweeper.delete_expired_pictures(&camera).await;

        if ctx.is_json() {
            fmt.print_json(&serde_json::to_value(&outcome)?);
            return Ok(());
        }

        match outcome {
            SweepOutcome::Skipped { reason } => fmt.warn(&format!("Sweep skipped: {}", reason)),
            SweepOutcome::ListingFailed { bucket, error } => {
                fmt.error(&format!("Could not list {}: {}", bucket, error));
                fmt.info("Nothing was deleted");
            }
            SweepOutcome::Completed(report) => {
                fmt.success(&format!(
                    "Deleted {} expired picture(s) for {}",
                    report.deleted, camera
                ));
                fmt.fields(&[
                    ("Bucket", report.bucket),
                    ("Listed", report.listed.to_string()),
                    ("Deleted", report.deleted.to_string()),
                    ("Failed", report.failed.to_string()),
                ]);
            }
        }
        Ok(())
    }
}
