//! Remote layout for archived pictures
//!
//! Uploads and retention sweeps must agree on where a picture lives, so
//! every remote location is derived here from `(camera, timestamp)`:
//!
//! ```text
//! {root_folder}/{camera}/{MM_dd_yyyy}/{HH}_{ticks}.jpg
//! ```
//!
//! The day folder (`MM_dd_yyyy`) is the unit of retention: a sweep lists and
//! empties exactly one day bucket.

use std::fmt::{self, Display, Formatter};

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// `chrono` format of a day bucket, e.g. `02_14_2024`
pub const DATE_BUCKET_FORMAT: &str = "%m_%d_%Y";

/// `chrono` format of the hour prefix inside a day bucket, e.g. `07`
pub const HOUR_BUCKET_FORMAT: &str = "%H";

/// Extension of every archived picture
pub const PICTURE_EXTENSION: &str = ".jpg";

// ============================================================================
// CameraName
// ============================================================================

/// Name of a camera, used as a single remote path segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CameraName(String);

impl CameraName {
    /// Creates a camera name
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidCameraName`] if the name is empty,
    /// contains a path separator, or contains a quote character.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed != name
            || name.contains('/')
            || name.contains('\\')
            || name.contains('"')
            || name == "."
            || name == ".."
        {
            return Err(DomainError::InvalidCameraName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CameraName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CameraName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CameraName> for String {
    fn from(value: CameraName) -> Self {
        value.0
    }
}

// ============================================================================
// Buckets
// ============================================================================

/// Formats a calendar day as a day bucket (`MM_dd_yyyy`)
pub fn date_bucket(date: NaiveDate) -> String {
    date.format(DATE_BUCKET_FORMAT).to_string()
}

/// Computes the day whose bucket is expired for the given retention
///
/// `today - retention_days`, saturating at the earliest representable date.
pub fn retention_cutoff(today: NaiveDate, retention_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(retention_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Validates a root folder name: relative, non-empty, no empty segments
pub fn validate_root_folder(root: &str) -> Result<(), DomainError> {
    if root.is_empty()
        || root.starts_with('/')
        || root.ends_with('/')
        || root.split('/').any(|segment| segment.trim().is_empty())
    {
        return Err(DomainError::InvalidRootFolder(root.to_string()));
    }
    Ok(())
}

// ============================================================================
// RemoteFolderPath
// ============================================================================

/// Remote folder relative to the provider's `Pictures` folder
///
/// `{root_folder}/{camera}/{MM_dd_yyyy}`: the day bucket the sweeper lists
/// and deletes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFolderPath(String);

impl RemoteFolderPath {
    /// Day bucket for a camera
    pub fn day_bucket(root_folder: &str, camera: &CameraName, date: NaiveDate) -> Self {
        Self(format!("{}/{}/{}", root_folder, camera, date_bucket(date)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteFolderPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// RemotePictureName
// ============================================================================

/// Object name of an uploaded picture, relative to the root folder
///
/// `{camera}/{MM_dd_yyyy}/{HH}_{ticks}.jpg`. The tick component comes from a
/// [`TickSource`](super::ticks::TickSource) and keeps names unique inside an
/// hour.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePictureName(String);

impl RemotePictureName {
    pub fn new(camera: &CameraName, timestamp: NaiveDateTime, ticks: u64) -> Self {
        Self(format!(
            "{}/{}/{}_{}{}",
            camera,
            date_bucket(timestamp.date()),
            timestamp.format(HOUR_BUCKET_FORMAT),
            ticks,
            PICTURE_EXTENSION
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemotePictureName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
