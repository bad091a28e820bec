//! Domain values for CamVault
//!
//! Pure types with no I/O: the OAuth credential, the remote picture layout,
//! the monotonic tick source and telemetry events.

pub mod credential;
pub mod errors;
pub mod events;
pub mod naming;
pub mod ticks;

pub use credential::{ClientCredentials, Credential, TokenPair};
pub use errors::DomainError;
pub use events::TelemetryEvent;
pub use naming::{
    date_bucket, retention_cutoff, validate_root_folder, CameraName, RemoteFolderPath,
    RemotePictureName, DATE_BUCKET_FORMAT, PICTURE_EXTENSION,
};
pub use ticks::TickSource;
