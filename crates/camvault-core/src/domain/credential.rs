//! OAuth credential held by the authenticator
//!
//! A [`Credential`] bundles the application's client registration with the
//! token pair issued by the provider. The access and refresh tokens are only
//! ever replaced together through [`Credential::replace_tokens`], so no reader
//! can observe a fresh access token next to a stale refresh token.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// ClientCredentials
// ============================================================================

/// Application registration with the storage provider
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    /// Application (client) ID
    pub client_id: String,
    /// Application secret sent with every token exchange
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// TokenPair
// ============================================================================

/// Access/refresh token pair returned by a successful token exchange
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token for API calls
    pub access_token: String,
    /// Long-lived token used to obtain new access tokens without a new login
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Credential
// ============================================================================

/// Client registration, current token pair and login state
#[derive(Debug, Clone, Default)]
pub struct Credential {
    client: ClientCredentials,
    tokens: Option<TokenPair>,
    logged_in: bool,
}

impl Credential {
    /// Creates a logged-out credential for the given client registration
    pub fn new(client: ClientCredentials) -> Self {
        Self {
            client,
            tokens: None,
            logged_in: false,
        }
    }

    pub fn client(&self) -> &ClientCredentials {
        &self.client
    }

    pub fn tokens(&self) -> Option<&TokenPair> {
        self.tokens.as_ref()
    }

    /// Current access token, empty when logged out
    pub fn access_token(&self) -> &str {
        self.tokens
            .as_ref()
            .map(|t| t.access_token.as_str())
            .unwrap_or("")
    }

    /// Current refresh token, if any
    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.refresh_token.as_str())
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Installs a freshly exchanged token pair and marks the credential logged in
    pub fn replace_tokens(&mut self, tokens: TokenPair) {
        self.tokens = Some(tokens);
        self.logged_in = true;
    }

    /// Drops both tokens and marks the credential logged out
    pub fn clear(&mut self) {
        self.tokens = None;
        self.logged_in = false;
    }
}
