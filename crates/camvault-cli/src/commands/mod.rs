//! CLI subcommands
//!
//! Every command receives a [`CommandContext`] carrying the output format
//! and the configuration path, and builds the adapters it needs from it.

pub mod auth;
pub mod config;
pub mod sweep;
pub mod upload;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use camvault_core::{
    config::Config,
    domain::CameraName,
    ports::{ICredentialStore, ITelemetrySink},
};
use camvault_onedrive::{
    auth::Authenticator, client::OneDriveClient, keyring_store::KeyringCredentialStore,
};
use camvault_telemetry::TracingTelemetry;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Global options shared by all commands
pub struct CommandContext {
    config_path: PathBuf,
    pub format: OutputFormat,
}

impl CommandContext {
    pub fn new(config_path: Option<PathBuf>, format: OutputFormat) -> Self {
        Self {
            config_path: config_path.unwrap_or_else(Config::default_path),
            format,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Loads the configuration, falling back to defaults when the file is absent
    pub fn load_config(&self) -> Result<Config> {
        if self.config_path.exists() {
            Config::load(&self.config_path).with_context(|| {
                format!("Failed to load configuration from {}", self.config_path.display())
            })
        } else {
            Ok(Config::default())
        }
    }
}

/// Adapters for commands that talk to OneDrive
pub struct RemoteContext {
    pub config: Config,
    pub store: Arc<dyn ICredentialStore>,
    pub telemetry: Arc<dyn ITelemetrySink>,
    pub auth: Arc<Authenticator>,
    pub client: Arc<OneDriveClient>,
}

impl RemoteContext {
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn ICredentialStore> =
            Arc::new(KeyringCredentialStore::new(&config.onedrive.client_id));
        let telemetry: Arc<dyn ITelemetrySink> = Arc::new(TracingTelemetry);
        let auth = Arc::new(Authenticator::from_config(
            &config.onedrive,
            Arc::clone(&store),
            Arc::clone(&telemetry),
        ));
        let client = Arc::new(OneDriveClient::from_config(&config.onedrive));
        Self {
            config,
            store,
            telemetry,
            auth,
            client,
        }
    }

    /// Restores the stored session, failing when there is none
    pub async fn require_session(&self) -> Result<()> {
        let restored = self
            .auth
            .restore_session()
            .await
            .context("Failed to restore session from keyring")?;
        if !restored {
            anyhow::bail!("Not logged in. Run 'camvault auth login' first.");
        }
        Ok(())
    }
}

/// Resolves `--camera`, defaulting to the first configured camera
pub fn resolve_camera(config: &Config, camera: Option<&str>) -> Result<CameraName> {
    match camera {
        Some(name) => CameraName::new(name).with_context(|| format!("Invalid camera name '{}'", name)),
        None => config
            .camera_names()
            .into_iter()
            .next()
            .context("No camera configured. Pass --camera or add one under 'cameras'"),
    }
}
