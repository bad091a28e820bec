//! Credential store backed by the system keyring
//!
//! The token pair is serialized as JSON and kept under the service name
//! `camvault`, with the OneDrive client ID as the keyring username so that
//! two registrations on one machine do not overwrite each other.

use anyhow::{Context, Result};
use camvault_core::{domain::TokenPair, ports::ICredentialStore};
use tracing::{debug, info};

/// Keyring service name for stored tokens
pub const KEYRING_SERVICE: &str = "camvault";

/// Stores the token pair in the OS credential store
/// (GNOME Keyring, KDE Wallet, macOS Keychain)
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
    account: String,
}

impl KeyringCredentialStore {
    /// Creates a store for the given client ID
    pub fn new(client_id: &str) -> Self {
        let account = if client_id.is_empty() {
            "default".to_string()
        } else {
            client_id.to_string()
        };
        Self {
            service: KEYRING_SERVICE.to_string(),
            account,
        }
    }

    /// Overrides the keyring service name
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.account).context("Failed to create keyring entry")
    }
}

impl ICredentialStore for KeyringCredentialStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        match self.entry()?.get_password() {
            Ok(json) => {
                let tokens: TokenPair = serde_json::from_str(&json)
                    .context("Failed to deserialize tokens from keyring")?;
                debug!(account = %self.account, "Loaded tokens from keyring");
                Ok(Some(tokens))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(account = %self.account, "No tokens found in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        let json = serde_json::to_string(tokens).context("Failed to serialize tokens")?;
        self.entry()?
            .set_password(&json)
            .context("Failed to store tokens in keyring")?;
        debug!(account = %self.account, "Stored tokens in keyring");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                info!(account = %self.account, "Cleared tokens from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!(account = %self.account, "No tokens to clear");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}
