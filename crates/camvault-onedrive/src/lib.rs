//! CamVault OneDrive - remote storage adapter
//!
//! Provides the async pieces that talk to OneDrive:
//! - OAuth2 token exchange with the legacy Live endpoints
//! - A transport session that owns the HTTP client and its cancellation scope
//! - Picture upload, folder listing and deletion
//!
//! ## Modules
//!
//! - [`auth`] - Authenticator, token exchange and authorize-URL building
//! - [`session`] - Transport session (HTTP client + cancellation scope)
//! - [`client`] - Upload / list / delete calls against the item-by-path API
//! - [`listing`] - Parsers for folder children responses
//! - [`token`] - Token response parsing
//! - [`keyring_store`] - Credential store backed by the system keyring

pub mod auth;
pub mod client;
pub mod keyring_store;
pub mod listing;
pub mod session;
pub mod token;

use thiserror::Error;

/// Errors that can occur when communicating with OneDrive
#[derive(Debug, Error)]
pub enum OneDriveError {
    /// The token endpoint rejected the code, refresh token or client credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The token endpoint answered but the body lacked a token field
    #[error("Malformed token response: missing {field}")]
    TokenParse {
        /// Name of the missing JSON key
        field: &'static str,
    },

    /// A network-level error occurred (connect, timeout, body read)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The transport session was replaced while the request was in flight
    #[error("Request canceled")]
    Canceled,

    /// Upload did not return 201 Created
    #[error("Upload of {name} failed with status {status}")]
    Upload { name: String, status: u16 },

    /// Children listing did not return 200 OK
    #[error("Listing of {folder} failed with status {status}")]
    Listing { folder: String, status: u16 },

    /// Delete did not return 204 No Content
    #[error("Delete of {name} failed with status {status}")]
    Delete { name: String, status: u16 },

    /// An operation needing a session was attempted while logged out
    #[error("Not logged in")]
    NotLoggedIn,

    /// A configured endpoint could not be parsed as a URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Tokens could not be persisted or removed
    #[error("Credential store error: {0}")]
    CredentialStore(String),
}

impl OneDriveError {
    /// True when the error came from the session being canceled
    pub fn is_canceled(&self) -> bool {
        matches!(self, OneDriveError::Canceled)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            OneDriveError::Upload { status, .. }
            | OneDriveError::Listing { status, .. }
            | OneDriveError::Delete { status, .. } => Some(*status),
            OneDriveError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for OneDrive operations
pub type Result<T> = std::result::Result<T, OneDriveError>;
