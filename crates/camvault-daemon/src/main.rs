//! CamVault Daemon - Background picture upload service
//!
//! This binary runs next to the camera and handles:
//! - Restoring the OneDrive session from the system keyring
//! - Periodic upload passes of the local buffer (first configured camera)
//! - Periodic retention sweeps of every camera's remote day buckets
//! - Periodic token refresh
//! - Optional Prometheus metrics on `telemetry.metrics_endpoint`
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! All triggers run inside [`SyncScheduler::run`], controlled by a
//! `CancellationToken` that is triggered on receipt of SIGTERM or SIGINT.
//! A failed session restore is not fatal: the daemon keeps running logged
//! out, upload and sweep ticks are no-ops, and each token refresh tick
//! retries the credential left in the keyring.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use camvault_core::{
    config::Config,
    ports::{ICredentialStore, IPictureBuffer, ITelemetrySink},
};
use camvault_onedrive::{
    auth::Authenticator, client::OneDriveClient, keyring_store::KeyringCredentialStore,
};
use camvault_sync::{
    LocalPictureBuffer, RetentionSweeper, ScheduleSettings, SyncScheduler, UploadPipeline,
};
use camvault_telemetry::{FanOutTelemetry, MetricsRegistry, MetricsServer, TracingTelemetry};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "camvaultd", version, about = "CamVault upload and retention daemon")]
struct Args {
    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// DaemonService
// ============================================================================

/// Wires the adapters together and owns the shutdown token
struct DaemonService {
    config: Config,
    auth: Arc<Authenticator>,
    scheduler: SyncScheduler,
    metrics: Option<Arc<MetricsRegistry>>,
    shutdown: CancellationToken,
}

impl DaemonService {
    fn new(config: Config, shutdown: CancellationToken) -> Result<Self> {
        let store: Arc<dyn ICredentialStore> =
            Arc::new(KeyringCredentialStore::new(&config.onedrive.client_id));
        Self::with_store(config, store, shutdown)
    }

    /// Builds the service around an explicit credential store
    fn with_store(
        config: Config,
        store: Arc<dyn ICredentialStore>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let metrics = if config.telemetry.metrics_enabled {
            Some(Arc::new(
                MetricsRegistry::new().context("Failed to create metrics registry")?,
            ))
        } else {
            None
        };

        let mut fan_out = FanOutTelemetry::new().with_sink(Arc::new(TracingTelemetry));
        if let Some(metrics) = &metrics {
            fan_out = fan_out.with_sink(Arc::clone(metrics) as Arc<dyn ITelemetrySink>);
        }
        let telemetry: Arc<dyn ITelemetrySink> = Arc::new(fan_out);

        let auth = Arc::new(Authenticator::from_config(
            &config.onedrive,
            store,
            Arc::clone(&telemetry),
        ));

        let client = Arc::new(OneDriveClient::from_config(&config.onedrive));
        let buffer: Arc<dyn IPictureBuffer> =
            Arc::new(LocalPictureBuffer::new(config.storage.picture_buffer.clone()));

        let uploader = Arc::new(UploadPipeline::new(
            Arc::clone(&auth),
            Arc::clone(&client),
            buffer,
            Arc::clone(&telemetry),
        ));
        let sweeper = Arc::new(RetentionSweeper::new(
            Arc::clone(&auth),
            client,
            telemetry,
            config.storage.retention_days,
        ));

        let scheduler = SyncScheduler::new(
            Arc::clone(&auth),
            uploader,
            sweeper,
            config.camera_names(),
            ScheduleSettings::from(&config.schedule),
        );

        Ok(Self {
            config,
            auth,
            scheduler,
            metrics,
            shutdown,
        })
    }

    /// Runs until the shutdown token is canceled
    ///
    /// 1. Restores the stored session
    /// 2. Starts the metrics server when enabled
    /// 3. Runs the scheduler until shutdown
    async fn run(&self) -> Result<()> {
        match self.auth.restore_session().await {
            Ok(true) => info!("Session restored from keyring"),
            Ok(false) => warn!("No stored credential, run 'camvault auth login' first"),
            Err(e) => warn!(error = %e, "Session restore failed, continuing logged out"),
        }

        let metrics_task = match &self.metrics {
            Some(metrics) => {
                let server =
                    MetricsServer::new(Arc::clone(metrics), &self.config.telemetry.metrics_endpoint)
                        .context("Invalid telemetry.metrics_endpoint")?;
                let shutdown = self.shutdown.clone();
                Some(tokio::spawn(async move {
                    if let Err(e) = server.run(shutdown).await {
                        error!(error = %e, "Metrics server failed");
                    }
                }))
            }
            None => None,
        };

        info!(
            cameras = ?self.config.cameras,
            buffer = %self.config.storage.picture_buffer.display(),
            retention_days = self.config.storage.retention_days,
            "Daemon running"
        );
        self.scheduler.run(self.shutdown.clone()).await;

        if let Some(task) = metrics_task {
            if let Err(e) = task.await {
                warn!(error = %e, "Metrics server task ended abnormally");
            }
        }
        Ok(())
    }
}

// ============================================================================
// Signal handling
// ============================================================================

/// Waits for SIGINT or SIGTERM and cancels `token`
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Startup
// ============================================================================

fn load_config(path: Option<PathBuf>) -> Result<(PathBuf, Config)> {
    let path = path.unwrap_or_else(Config::default_path);
    let config = if path.exists() {
        Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    } else {
        Config::default()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration: {}", joined.join("; "));
    }
    Ok((path, config))
}

fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config_path, config) = load_config(args.config)?;

    init_tracing(&config);
    info!(config_path = %config_path.display(), "CamVault daemon starting (camvaultd)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config, shutdown_token.clone())?;
    let result = service.run().await;

    match &result {
        Ok(()) => info!("CamVault daemon shut down gracefully"),
        Err(e) => error!(error = %e, "CamVault daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
