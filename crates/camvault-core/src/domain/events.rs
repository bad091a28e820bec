//! Telemetry events emitted by the synchronization engine
//!
//! Events are named, carry string properties, and are delivered to an
//! [`ITelemetrySink`](crate::ports::telemetry::ITelemetrySink) on a
//! best-effort basis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known event names
pub mod names {
    pub const PICTURE_UPLOADED: &str = "PictureUploaded";
    pub const UPLOAD_FAILED: &str = "UploadFailed";
    pub const UPLOAD_PASS_COMPLETED: &str = "UploadPassCompleted";
    pub const UPLOAD_PASS_SKIPPED: &str = "UploadPassSkipped";
    pub const REMOTE_LISTING_FAILED: &str = "RemoteListingFailed";
    pub const PICTURE_DELETED: &str = "PictureDeleted";
    pub const DELETE_FAILED: &str = "DeleteFailed";
    pub const SWEEP_COMPLETED: &str = "SweepCompleted";
    pub const TOKEN_REFRESHED: &str = "TokenRefreshed";
    pub const TOKEN_REFRESH_FAILED: &str = "TokenRefreshFailed";
    pub const LOGIN_SUCCEEDED: &str = "LoginSucceeded";
    pub const LOGOUT_COMPLETED: &str = "LogoutCompleted";
    pub const LOGOUT_REQUEST_FAILED: &str = "LogoutRequestFailed";
}

/// A named event with string-keyed properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl TelemetryEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds a property, replacing any previous value for the key
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.properties.insert(key.into(), value.to_string());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
