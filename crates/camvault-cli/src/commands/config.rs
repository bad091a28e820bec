//! Config command - View and manage CamVault configuration
//!
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors
//! 3. Writes a default configuration file to start from

use anyhow::{Context, Result};
use camvault_core::config::{Config, ConfigBuilder};
use clap::Subcommand;
use tracing::info;

use super::CommandContext;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Write a default configuration file
    Init {
        /// OneDrive application client ID
        #[arg(long)]
        client_id: Option<String>,
        /// OneDrive application client secret
        #[arg(long)]
        client_secret: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Validate => self.execute_validate(ctx),
            ConfigCommand::Init {
                client_id,
                client_secret,
                force,
            } => self.execute_init(ctx, client_id.as_deref(), client_secret.as_deref(), *force),
        }
    }

    /// Show current configuration, with the client secret masked
    fn execute_show(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let mut config = ctx.load_config()?;
        if !config.onedrive.client_secret.is_empty() {
            config.onedrive.client_secret = "********".to_string();
        }

        info!(config_path = %ctx.config_path().display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path().display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    /// Validate configuration file
    fn execute_validate(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = ctx.config_path();

        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let message = if config_path.exists() {
                    format!("Failed to parse configuration: {:#}", e)
                } else {
                    "Configuration file not found".to_string()
                };
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [message],
                    }));
                } else {
                    formatter.error(&message);
                    formatter.info(&format!("File: {}", config_path.display()));
                    formatter.info("Run 'camvault config init' to create one.");
                }
                return Ok(());
            }
        };

        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
            if config.onedrive.client_id.is_empty() {
                formatter.warn("onedrive.client_id is empty; login will not be possible");
            }
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }

    fn execute_init(
        &self,
        ctx: &CommandContext,
        client_id: Option<&str>,
        client_secret: Option<&str>,
        force: bool,
    ) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = ctx.config_path();

        if config_path.exists() && !force {
            anyhow::bail!(
                "{} already exists. Use --force to overwrite.",
                config_path.display()
            );
        }

        let config = init_config(client_id, client_secret);
        config
            .save(config_path)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Wrote {}", config_path.display()));
            formatter.info("Next: 'camvault auth login'");
        }
        Ok(())
    }
}

fn init_config(client_id: Option<&str>, client_secret: Option<&str>) -> Config {
    let mut builder = ConfigBuilder::new();
    if let Some(id) = client_id {
        builder = builder.client_id(id);
    }
    if let Some(secret) = client_secret {
        builder = builder.client_secret(secret);
    }
    builder.build()
}
