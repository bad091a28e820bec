//! Domain error types
//!
//! Validation failures raised while constructing domain values.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Camera names become remote path segments and must be a single segment
    #[error("Invalid camera name: {0}")]
    InvalidCameraName(String),

    /// Root folder names must be a non-empty relative path
    #[error("Invalid root folder: {0}")]
    InvalidRootFolder(String),

    /// Retention must cover at least one day
    #[error("Invalid retention duration: {0} days")]
    InvalidRetention(u32),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
