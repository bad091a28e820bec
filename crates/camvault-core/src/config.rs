//! Configuration module for CamVault.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, saving, validation, defaults, and a builder pattern for
//! programmatic use.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{naming::validate_root_folder, CameraName, ClientCredentials};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for CamVault.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub onedrive: OneDriveConfig,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
    pub cameras: Vec<String>,
    pub logging: LoggingConfig,
    pub telemetry: TelemetryConfig,
}

/// OneDrive application registration and endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OneDriveConfig {
    /// Application (client) ID. Empty until the app is registered.
    pub client_id: String,
    /// Application secret sent with token exchanges.
    pub client_secret: String,
    /// Redirect URI registered for the application.
    pub redirect_uri: String,
    /// Space-separated OAuth scopes requested at login.
    pub scopes: String,
    /// Consent page the operator visits to obtain an authorization code.
    pub authorize_url: String,
    /// Token endpoint for code and refresh-token exchanges.
    pub token_url: String,
    /// Sign-out endpoint.
    pub logout_url: String,
    /// Base of the item-by-path API, ending in `root:`.
    pub api_base_url: String,
    /// Folder under `Pictures` that holds every camera's archive.
    pub root_folder: String,
    /// How remote folder listings are parsed.
    pub listing_parser: ListingParserKind,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

/// Strategy used to extract picture names from a children listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingParserKind {
    /// Split the body on quotes and keep tokens containing `.jpg`.
    Lenient,
    /// Decode the body as JSON and keep `value[].name` entries ending in `.jpg`.
    Json,
}

/// Local buffer and retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Folder the camera writes captured pictures into.
    pub picture_buffer: PathBuf,
    /// Days a picture is kept remotely before the sweeper removes it.
    pub retention_days: u32,
}

/// Periods of the three independent triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between upload passes.
    pub upload_interval_secs: u64,
    /// Seconds between retention sweeps.
    pub sweep_interval_secs: u64,
    /// Seconds between background token refreshes.
    pub token_refresh_interval_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

/// Metrics export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Whether the daemon serves Prometheus metrics.
    pub metrics_enabled: bool,
    /// Address for the metrics endpoint, e.g. `127.0.0.1:9464`.
    pub metrics_endpoint: String,
}

// ---------------------------------------------------------------------------
// Config::load() / save()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration as YAML, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let yaml = serde_yaml::to_string(self).context("Failed to serialize configuration")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/camvault/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("camvault")
            .join("config.yaml")
    }

    /// Client registration taken from the `onedrive` section.
    pub fn client_credentials(&self) -> ClientCredentials {
        ClientCredentials::new(
            self.onedrive.client_id.clone(),
            self.onedrive.client_secret.clone(),
        )
    }

    /// Configured cameras as validated names.
    ///
    /// Invalid entries are reported by [`Config::validate`]; here they are skipped.
    pub fn camera_names(&self) -> Vec<CameraName> {
        self.cameras
            .iter()
            .filter_map(|c| CameraName::new(c.clone()).ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for Config {
    fn default() -> Self {
        Self {
            onedrive: OneDriveConfig::default(),
            storage: StorageConfig::default(),
            schedule: ScheduleConfig::default(),
            cameras: vec!["Cam1".to_string()],
            logging: LoggingConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Default for OneDriveConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "https://login.live.com/oauth20_desktop.srf".to_string(),
            scopes: "wl.offline_access onedrive.readwrite".to_string(),
            authorize_url: "https://login.live.com/oauth20_authorize.srf".to_string(),
            token_url: "https://login.live.com/oauth20_token.srf".to_string(),
            logout_url: "https://login.live.com/oauth20_logout.srf".to_string(),
            api_base_url: "https://api.onedrive.com/v1.0/drive/root:".to_string(),
            root_folder: "SecuritySystem".to_string(),
            listing_parser: ListingParserKind::Lenient,
            request_timeout_secs: 60,
        }
    }
}

impl Default for ListingParserKind {
    fn default() -> Self {
        ListingParserKind::Lenient
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            picture_buffer: dirs::picture_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
                .unwrap_or_else(|| PathBuf::from("~/Pictures")),
            retention_days: 7,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            upload_interval_secs: 10,
            sweep_interval_secs: 60 * 60,
            token_refresh_interval_secs: 25 * 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_endpoint: "127.0.0.1:9464".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"schedule.upload_interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Missing client
    /// credentials are not an error here: the CLI reports them when a login
    /// is attempted.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- onedrive ---
        for (field, value) in [
            ("onedrive.redirect_uri", &self.onedrive.redirect_uri),
            ("onedrive.authorize_url", &self.onedrive.authorize_url),
            ("onedrive.token_url", &self.onedrive.token_url),
            ("onedrive.logout_url", &self.onedrive.logout_url),
            ("onedrive.api_base_url", &self.onedrive.api_base_url),
        ] {
            if !(value.starts_with("https://") || value.starts_with("http://")) {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("must be an http(s) URL, got '{}'", value),
                });
            }
        }
        if let Err(e) = validate_root_folder(&self.onedrive.root_folder) {
            errors.push(ValidationError {
                field: "onedrive.root_folder".into(),
                message: e.to_string(),
            });
        }
        if self.onedrive.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "onedrive.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- storage ---
        if self.storage.retention_days == 0 {
            errors.push(ValidationError {
                field: "storage.retention_days".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.storage.picture_buffer.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.picture_buffer".into(),
                message: "must not be empty".into(),
            });
        }

        // --- schedule ---
        for (field, value) in [
            ("schedule.upload_interval_secs", self.schedule.upload_interval_secs),
            ("schedule.sweep_interval_secs", self.schedule.sweep_interval_secs),
            (
                "schedule.token_refresh_interval_secs",
                self.schedule.token_refresh_interval_secs,
            ),
        ] {
            if value == 0 {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "must be greater than 0".into(),
                });
            }
        }

        // --- cameras ---
        if self.cameras.is_empty() {
            errors.push(ValidationError {
                field: "cameras".into(),
                message: "at least one camera is required".into(),
            });
        }
        for (index, camera) in self.cameras.iter().enumerate() {
            if let Err(e) = CameraName::new(camera.clone()) {
                errors.push(ValidationError {
                    field: format!("cameras[{}]", index),
                    message: e.to_string(),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- telemetry ---
        if self.telemetry.metrics_enabled
            && self
                .telemetry
                .metrics_endpoint
                .parse::<std::net::SocketAddr>()
                .is_err()
        {
            errors.push(ValidationError {
                field: "telemetry.metrics_endpoint".into(),
                message: format!(
                    "invalid socket address '{}'",
                    self.telemetry.metrics_endpoint
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use camvault_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .picture_buffer(PathBuf::from("/var/lib/camvault/buffer"))
///     .retention_days(30)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- onedrive ---

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.onedrive.client_id = id.into();
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.onedrive.client_secret = secret.into();
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.config.onedrive.token_url = url.into();
        self
    }

    pub fn logout_url(mut self, url: impl Into<String>) -> Self {
        self.config.onedrive.logout_url = url.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.onedrive.api_base_url = url.into();
        self
    }

    pub fn root_folder(mut self, folder: impl Into<String>) -> Self {
        self.config.onedrive.root_folder = folder.into();
        self
    }

    pub fn listing_parser(mut self, kind: ListingParserKind) -> Self {
        self.config.onedrive.listing_parser = kind;
        self
    }

    // --- storage ---

    pub fn picture_buffer(mut self, path: PathBuf) -> Self {
        self.config.storage.picture_buffer = path;
        self
    }

    pub fn retention_days(mut self, days: u32) -> Self {
        self.config.storage.retention_days = days;
        self
    }

    // --- schedule ---

    pub fn upload_interval_secs(mut self, secs: u64) -> Self {
        self.config.schedule.upload_interval_secs = secs;
        self
    }

    pub fn sweep_interval_secs(mut self, secs: u64) -> Self {
        self.config.schedule.sweep_interval_secs = secs;
        self
    }

    pub fn token_refresh_interval_secs(mut self, secs: u64) -> Self {
        self.config.schedule.token_refresh_interval_secs = secs;
        self
    }

    // --- cameras / logging ---

    pub fn cameras(mut self, cameras: Vec<String>) -> Self {
        self.config.cameras = cameras;
        self
    }

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
