//! Auth commands - consent URL, login, logout and status
//!
//! 1. `url`    - Prints the provider consent URL, optionally opening it.
//! 2. `login`  - Exchanges an authorization code (flag, pasted redirect URL or
//!    bare code on stdin) and stores the token pair in the system keyring.
//! 3. `logout` - Signs out at the provider and clears the keyring.
//! 4. `status` - Shows whether a credential is stored, optionally verifying it.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use camvault_onedrive::auth::parse_code_from_redirect;
use clap::Subcommand;
use tracing::info;

use super::{CommandContext, RemoteContext};
use crate::output::OutputFormatter;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Print the OneDrive consent URL
    Url {
        /// Open the URL in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Log in with an authorization code
    Login {
        /// Authorization code or the full redirect URL; prompted when omitted
        #[arg(long)]
        code: Option<String>,
        /// Do not try to open a browser when prompting
        #[arg(long)]
        no_browser: bool,
    },
    /// Sign out and remove stored credentials
    Logout,
    /// Check authentication status
    Status {
        /// Exchange the stored refresh token to prove it still works
        #[arg(long)]
        verify: bool,
    },
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let remote = RemoteContext::new(ctx.load_config()?);
        match self {
            AuthCommand::Url { open } => execute_url(&remote, *open, ctx, &*fmt),
            AuthCommand::Login { code, no_browser } => {
                execute_login(&remote, code.as_deref(), *no_browser, ctx, &*fmt).await
            }
            AuthCommand::Logout => execute_logout(&remote, ctx, &*fmt).await,
            AuthCommand::Status { verify } => execute_status(&remote, *verify, ctx, &*fmt).await,
        }
    }
}

fn require_client_id(remote: &RemoteContext) -> Result<()> {
    if remote.config.onedrive.client_id.is_empty() {
        anyhow::bail!("No client_id configured. Set onedrive.client_id in config.yaml");
    }
    Ok(())
}

fn execute_url(
    remote: &RemoteContext,
    open: bool,
    ctx: &CommandContext,
    fmt: &dyn OutputFormatter,
) -> Result<()> {
    require_client_id(remote)?;
    let url = remote
        .auth
        .authorize_url()
        .context("Failed to build consent URL")?;

    if ctx.is_json() {
        fmt.print_json(&serde_json::json!({ "url": url }));
    } else {
        println!("{}", url);
    }

    if open {
        if let Err(e) = webbrowser::open(&url) {
            fmt.warn(&format!("Could not open a browser: {}", e));
        }
    }
    Ok(())
}

/// Asks for the redirect URL (or bare code) on stdin
fn prompt_for_code(url: &str, no_browser: bool, fmt: &dyn OutputFormatter) -> Result<String> {
    if no_browser || webbrowser::open(url).is_err() {
        fmt.info("Open this URL in a browser and sign in:");
        fmt.info(url);
    } else {
        fmt.info("Opening browser for Microsoft login...");
    }

    eprint!("Paste the redirect URL or code: ");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read authorization code")?;
    Ok(line)
}

async fn execute_login(
    remote: &RemoteContext,
    code: Option<&str>,
    no_browser: bool,
    ctx: &CommandContext,
    fmt: &dyn OutputFormatter,
) -> Result<()> {
    require_client_id(remote)?;

    let input = match code {
        Some(code) => code.to_string(),
        None => {
            let url = remote
                .auth
                .authorize_url()
                .context("Failed to build consent URL")?;
            prompt_for_code(&url, no_browser, fmt)?
        }
    };
    let code = parse_code_from_redirect(&input)
        .context("No authorization code found in the input")?;

    info!(client_id = %remote.config.onedrive.client_id, "Exchanging authorization code");
    remote
        .auth
        .authorize_with_code(&code)
        .await
        .context("Login failed")?;

    if ctx.is_json() {
        fmt.print_json(&serde_json::json!({
            "success": true,
            "logged_in": true,
            "client_id": remote.config.onedrive.client_id,
        }));
    } else {
        fmt.success("Logged in to OneDrive");
        fmt.info("Tokens stored in the system keyring");
    }
    Ok(())
}

async fn execute_logout(
    remote: &RemoteContext,
    ctx: &CommandContext,
    fmt: &dyn OutputFormatter,
) -> Result<()> {
    let stored = remote
        .store
        .load()
        .context("Failed to read credentials from keyring")?;
    if stored.is_none() {
        fmt.info("No stored credentials. Nothing to log out.");
        return Ok(());
    }

    remote.auth.logout().await.context("Logout failed")?;

    if ctx.is_json() {
        fmt.print_json(&serde_json::json!({ "success": true, "logged_in": false }));
    } else {
        fmt.success("Logged out");
    }
    Ok(())
}

async fn execute_status(
    remote: &RemoteContext,
    verify: bool,
    ctx: &CommandContext,
    fmt: &dyn OutputFormatter,
) -> Result<()> {
    let stored = remote
        .store
        .load()
        .context("Failed to read credentials from keyring")?
        .is_some();

    let verified = if stored && verify {
        Some(remote.auth.restore_session().await.map_err(|e| e.to_string()))
    } else {
        None
    };

    if ctx.is_json() {
        let mut json = serde_json::json!({
            "client_id": remote.config.onedrive.client_id,
            "credential_stored": stored,
        });
        if let Some(result) = &verified {
            json["verified"] = serde_json::json!(result.is_ok());
            if let Err(e) = result {
                json["error"] = serde_json::json!(e);
            }
        }
        fmt.print_json(&json);
        return Ok(());
    }

    if !stored {
        fmt.warn("Not logged in. Run 'camvault auth login'.");
        return Ok(());
    }

    fmt.success("Credential stored in keyring");
    fmt.fields(&[("Client ID", remote.config.onedrive.client_id.clone())]);
    match verified {
        Some(Ok(_)) => fmt.success("Refresh token accepted by OneDrive"),
        Some(Err(e)) => fmt.error(&format!("Refresh token rejected: {}", e)),
        None => {}
    }
    Ok(())
}
