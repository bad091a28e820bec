//! Credential store port (driven/secondary port)
//!
//! Persists the token pair between process runs. Only the authenticator
//! writes to it; the daemon reads it once at startup to restore the session.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage failures are adapter-specific
//!   (system keyring, file, memory).
//! - Synchronous: keyring backends block briefly and are called rarely.

use std::sync::Mutex;

use anyhow::Result;

use crate::domain::TokenPair;

/// Persistent storage for the OAuth token pair
pub trait ICredentialStore: Send + Sync {
    /// Loads the stored token pair, `None` when nothing is stored
    fn load(&self) -> Result<Option<TokenPair>>;

    /// Stores a token pair, replacing any previous one
    fn save(&self, tokens: &TokenPair) -> Result<()>;

    /// Removes the stored token pair; succeeds when nothing is stored
    fn clear(&self) -> Result<()>;
}

/// Process-local credential store
///
/// Used by tests and by headless runs that should not touch the system
/// keyring.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with a token pair
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

impl ICredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        let guard = self
            .tokens
            .lock()
            .map_err(|_| anyhow::anyhow!("credential store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_| anyhow::anyhow!("credential store lock poisoned"))?;
        *guard = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_| anyhow::anyhow!("credential store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
