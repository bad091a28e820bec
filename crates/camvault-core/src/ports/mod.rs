//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are interfaces the synchronization engine depends on, whose
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ICredentialStore`] - Persistence of the OAuth token pair
//! - [`IPictureBuffer`] - The local folder the camera writes pictures into
//! - [`ITelemetrySink`] - Fire-and-forget event reporting

pub mod credential_store;
pub mod picture_buffer;
pub mod telemetry;

pub use credential_store::{ICredentialStore, InMemoryCredentialStore};
pub use picture_buffer::{BufferedPicture, IPictureBuffer};
pub use telemetry::{ITelemetrySink, NoopTelemetry};
