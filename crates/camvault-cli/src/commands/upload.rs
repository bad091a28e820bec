//! Upload command - one upload pass for a camera

use std::sync::Arc;

use anyhow::{Context, Result};
use camvault_core::ports::IPictureBuffer;
use camvault_sync::{LocalPictureBuffer, UploadOutcome, UploadPipeline};
use clap::Args;

use super::{resolve_camera, CommandContext, RemoteContext};

#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Camera name; defaults to the first configured camera
    #[arg(long)]
    camera: Option<String>,
}

impl UploadCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let remote = RemoteContext::new(ctx.load_config()?);
        let camera = resolve_camera(&remote.config, self.camera.as_deref())?;
        remote.require_session().await?;

        let buffer: Arc<dyn IPictureBuffer> = Arc::new(LocalPictureBuffer::new(
            remote.config.storage.picture_buffer.clone(),
        ));
        let pipeline = UploadPipeline::new(
            Arc::clone(&remote.auth),
            Arc::clone(&remote.client),
            buffer,
            Arc::clone(&remote.telemetry),
        );

        let outcome = pipeline
            .upload_pictures(&camera)
            .await
            .context("Upload pass failed")?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::to_value(&outcome)?);
            return Ok(());
        }

        match outcome {
            UploadOutcome::Skipped { reason } => fmt.warn(&format!("Upload skipped: {}", reason)),
            UploadOutcome::Completed(report) if report.attempted == 0 => {
                fmt.success(&format!("Nothing to upload for {}", camera));
            }
            UploadOutcome::Completed(report) => {
                if report.failed == 0 {
                    fmt.success(&format!("Uploaded {} picture(s) for {}", report.uploaded, camera));
                } else {
                    fmt.warn(&format!(
                        "{} of {} picture(s) failed; they stay in the buffer",
                        report.failed, report.attempted
                    ));
                }
                fmt.fields(&[
                    ("Buffer", remote.config.storage.picture_buffer.display().to_string()),
                    ("Attempted", report.attempted.to_string()),
                    ("Uploaded", report.uploaded.to_string()),
                    ("Failed", report.failed.to_string()),
                ]);
            }
        }
        Ok(())
    }
}
