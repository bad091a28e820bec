//! CamVault Sync - moves pictures from the local buffer to OneDrive
//!
//! ## Components
//!
//! - [`buffer`] - Local picture buffer (recursive folder scan)
//! - [`uploader`] - Upload pipeline guarded by a skip-if-busy lock
//! - [`sweeper`] - Retention sweeper, one day bucket per run
//! - [`scheduler`] - The three periodic triggers (upload, sweep, refresh)

pub mod buffer;
pub mod scheduler;
pub mod sweeper;
pub mod uploader;

use std::path::PathBuf;

use camvault_onedrive::OneDriveError;
use thiserror::Error;

pub use buffer::LocalPictureBuffer;
pub use scheduler::{ScheduleSettings, SyncScheduler};
pub use sweeper::{RetentionSweeper, SweepOutcome, SweepReport};
pub use uploader::{SkipReason, UploadOutcome, UploadPipeline, UploadReport};

/// Errors raised while moving pictures
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local buffer could not be enumerated
    #[error("Picture buffer unavailable: {0}")]
    Buffer(String),

    /// A buffered picture could not be read
    #[error("Failed to open {}: {message}", path.display())]
    FileOpen { path: PathBuf, message: String },

    /// The remote call failed
    #[error(transparent)]
    Remote(#[from] OneDriveError),
}
