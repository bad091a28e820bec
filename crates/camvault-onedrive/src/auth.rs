//! OAuth2 authentication against the Live endpoints
//!
//! The provider's desktop flow issues an authorization code on a consent
//! page; everything after that happens here.
//!
//! ## Components
//!
//! - [`OAuthEndpoints`] - Token, logout and consent endpoints plus scopes
//! - [`authorize_url`] - Builds the consent URL the operator visits
//! - [`parse_code_from_redirect`] - Pulls the code out of the pasted redirect
//! - [`exchange_tokens`] - One form POST to the token endpoint
//! - [`Authenticator`] - Owns the credential and the transport session

use std::{
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use camvault_core::{
    config::OneDriveConfig,
    domain::{events::names, ClientCredentials, Credential, TelemetryEvent, TokenPair},
    ports::{ICredentialStore, ITelemetrySink},
};
use oauth2::{basic::BasicClient, AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use reqwest::Client;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::{session::TransportSession, token::parse_token_response, OneDriveError, Result};

/// Longest slice of an error body echoed back in [`OneDriveError::Auth`]
const MAX_ERROR_BODY: usize = 200;

// ============================================================================
// OAuthEndpoints
// ============================================================================

/// Endpoints and scopes of the OAuth2 desktop flow
#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub logout_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl OAuthEndpoints {
    /// Reads the endpoints from the `onedrive` configuration section
    pub fn from_config(config: &OneDriveConfig) -> Self {
        Self {
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            logout_url: config.logout_url.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.split_whitespace().map(str::to_string).collect(),
        }
    }
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self::from_config(&OneDriveConfig::default())
    }
}

// ============================================================================
// Consent URL and redirect parsing
// ============================================================================

/// Builds the consent page URL for `client_id`
///
/// The operator opens it in a browser, signs in, and is redirected to
/// `redirect_uri?code=...`.
pub fn authorize_url(endpoints: &OAuthEndpoints, client_id: &str) -> Result<String> {
    let client = BasicClient::new(ClientId::new(client_id.to_string()))
        .set_auth_uri(
            AuthUrl::new(endpoints.authorize_url.clone())
                .map_err(|e| OneDriveError::InvalidUrl(format!("authorize_url: {}", e)))?,
        )
        .set_redirect_uri(
            RedirectUrl::new(endpoints.redirect_uri.clone())
                .map_err(|e| OneDriveError::InvalidUrl(format!("redirect_uri: {}", e)))?,
        );

    let mut request = client.authorize_url(CsrfToken::new_random);
    for scope in &endpoints.scopes {
        request = request.add_scope(Scope::new(scope.clone()));
    }
    let (url, _state) = request.url();

    debug!("Generated authorization URL");
    Ok(url.to_string())
}

/// Extracts the authorization code from a pasted redirect URL
///
/// Accepts either the full redirect (`...oauth20_desktop.srf?code=M.abc&lc=1033`)
/// or the bare code. Returns `None` when nothing usable is found.
pub fn parse_code_from_redirect(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .filter(|code| !code.is_empty()),
        Err(_) if !trimmed.contains(char::is_whitespace) && !trimmed.contains('=') => {
            Some(trimmed.to_string())
        }
        Err(_) => None,
    }
}

// ============================================================================
// Token exchange
// ============================================================================

/// What is traded at the token endpoint
#[derive(Debug, Clone, Copy)]
pub enum TokenGrant<'a> {
    AuthorizationCode(&'a str),
    RefreshToken(&'a str),
}

impl<'a> TokenGrant<'a> {
    pub fn grant_type(&self) -> &'static str {
        match self {
            TokenGrant::AuthorizationCode(_) => "authorization_code",
            TokenGrant::RefreshToken(_) => "refresh_token",
        }
    }

    fn parameter(&self) -> (&'static str, &'a str) {
        match self {
            TokenGrant::AuthorizationCode(code) => ("code", code),
            TokenGrant::RefreshToken(token) => ("refresh_token", token),
        }
    }
}

/// Exchanges a code or refresh token for a new token pair
///
/// Sends a url-encoded form with `client_id`, `redirect_uri`,
/// `client_secret`, `grant_type` and the grant itself.
///
/// # Errors
/// - [`OneDriveError::Auth`] on a non-success status
/// - [`OneDriveError::TokenParse`] when a token field is missing
/// - [`OneDriveError::Transport`] on network failure
pub async fn exchange_tokens(
    http: &Client,
    endpoints: &OAuthEndpoints,
    client: &ClientCredentials,
    grant: TokenGrant<'_>,
) -> Result<TokenPair> {
    let (grant_key, grant_value) = grant.parameter();
    let form = [
        ("client_id", client.client_id.as_str()),
        ("redirect_uri", endpoints.redirect_uri.as_str()),
        ("client_secret", client.client_secret.as_str()),
        ("grant_type", grant.grant_type()),
        (grant_key, grant_value),
    ];

    debug!(grant_type = grant.grant_type(), "Requesting tokens");
    let response = http.post(&endpoints.token_url).form(&form).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let excerpt: String = body.chars().take(MAX_ERROR_BODY).collect();
        return Err(OneDriveError::Auth(format!(
            "token endpoint returned {}: {}",
            status, excerpt
        )));
    }

    parse_token_response(&body)
}

// ============================================================================
// Authenticator
// ============================================================================

struct AuthState {
    credential: Credential,
    session: Option<Arc<TransportSession>>,
}

/// Owns the credential and the transport session built from it
///
/// Token exchanges are serialized. Every exchange builds a brand new
/// [`TransportSession`]; the shared reference is swapped only once the new
/// session is complete, so callers of [`session`](Self::session) see either
/// the old credential or the new one, never a mix.
pub struct Authenticator {
    endpoints: OAuthEndpoints,
    request_timeout: Duration,
    state: RwLock<AuthState>,
    exchange_lock: tokio::sync::Mutex<()>,
    store: Arc<dyn ICredentialStore>,
    telemetry: Arc<dyn ITelemetrySink>,
}

impl Authenticator {
    pub fn new(
        endpoints: OAuthEndpoints,
        client: ClientCredentials,
        request_timeout: Duration,
        store: Arc<dyn ICredentialStore>,
        telemetry: Arc<dyn ITelemetrySink>,
    ) -> Self {
        Self {
            endpoints,
            request_timeout,
            state: RwLock::new(AuthState {
                credential: Credential::new(client),
                session: None,
            }),
            exchange_lock: tokio::sync::Mutex::new(()),
            store,
            telemetry,
        }
    }

    /// Creates an authenticator from the `onedrive` configuration section
    pub fn from_config(
        config: &OneDriveConfig,
        store: Arc<dyn ICredentialStore>,
        telemetry: Arc<dyn ITelemetrySink>,
    ) -> Self {
        Self::new(
            OAuthEndpoints::from_config(config),
            ClientCredentials::new(config.client_id.clone(), config.client_secret.clone()),
            Duration::from_secs(config.request_timeout_secs),
            store,
            telemetry,
        )
    }

    fn read_state(&self) -> RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn endpoints(&self) -> &OAuthEndpoints {
        &self.endpoints
    }

    pub fn is_logged_in(&self) -> bool {
        self.read_state().credential.is_logged_in()
    }

    /// Current transport session, `None` while logged out
    pub fn session(&self) -> Option<Arc<TransportSession>> {
        let state = self.read_state();
        if state.credential.is_logged_in() {
            state.session.clone()
        } else {
            None
        }
    }

    /// Stored refresh token, if any
    pub fn refresh_token(&self) -> Option<String> {
        self.read_state()
            .credential
            .refresh_token()
            .map(str::to_string)
    }

    /// Consent URL for this authenticator's client
    pub fn authorize_url(&self) -> Result<String> {
        let client_id = self.read_state().credential.client().client_id.clone();
        authorize_url(&self.endpoints, &client_id)
    }

    /// Exchanges an authorization code for the initial token pair
    ///
    /// On success the tokens are stored and persisted, the credential is
    /// marked logged in and a session carrying the new bearer is installed.
    pub async fn authorize_with_code(&self, code: &str) -> Result<()> {
        let _exchange = self.exchange_lock.lock().await;
        let client = self.read_state().credential.client().clone();

        let fresh = TransportSession::new(self.request_timeout)?;
        let tokens = fresh
            .run(exchange_tokens(
                fresh.client(),
                &self.endpoints,
                &client,
                TokenGrant::AuthorizationCode(code),
            ))
            .await?;

        self.install(fresh, tokens);
        info!("Logged in with authorization code");
        self.telemetry
            .record(TelemetryEvent::new(names::LOGIN_SUCCEEDED).with("grant", "authorization_code"));
        Ok(())
    }

    /// Re-authorizes with a refresh token, rebuilding the transport session
    ///
    /// A fresh session is built for the exchange and swapped in only once
    /// the new token pair is in hand; the previous session is then canceled,
    /// so any request still using it resolves to [`OneDriveError::Canceled`].
    /// Until the swap, [`session`](Self::session) keeps handing out the
    /// previous, live session. If the exchange fails, the credential and the
    /// previous session are left untouched.
    pub async fn authorize_with_refresh_token(&self, refresh_token: &str) -> Result<()> {
        let _exchange = self.exchange_lock.lock().await;
        self.exchange_refresh_token(refresh_token).await
    }

    /// Refresh-token exchange; the caller holds `exchange_lock`
    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<()> {
        let fresh = TransportSession::new(self.request_timeout)?;
        let client = self.read_state().credential.client().clone();

        let exchanged = fresh
            .run(exchange_tokens(
                fresh.client(),
                &self.endpoints,
                &client,
                TokenGrant::RefreshToken(refresh_token),
            ))
            .await;

        match exchanged {
            Ok(tokens) => {
                self.install(fresh, tokens);
                info!("Access token refreshed");
                self.telemetry
                    .record(TelemetryEvent::new(names::TOKEN_REFRESHED));
                Ok(())
            }
            Err(e) => {
                self.telemetry.record(
                    TelemetryEvent::new(names::TOKEN_REFRESH_FAILED).with("error", &e),
                );
                Err(e)
            }
        }
    }

    /// Swaps in the new token pair and a session carrying it
    fn install(&self, fresh: TransportSession, tokens: TokenPair) {
        let session = Arc::new(fresh.with_bearer(tokens.access_token.clone()));
        let previous = {
            let mut state = self.write_state();
            state.credential.replace_tokens(tokens.clone());
            state.session.replace(session)
        };
        if let Some(previous) = previous {
            previous.cancel();
        }

        if let Err(e) = self.store.save(&tokens) {
            warn!(error = %e, "Failed to persist tokens");
        }
    }

    /// Signs out
    ///
    /// The provider's logout endpoint is called best-effort. Local state is
    /// always reset: tokens cleared, logged out, session canceled and dropped.
    ///
    /// # Errors
    /// [`OneDriveError::CredentialStore`] when the persisted tokens could not
    /// be removed. Local state is reset regardless.
    pub async fn logout(&self) -> Result<()> {
        let _exchange = self.exchange_lock.lock().await;
        let client_id = self.read_state().credential.client().client_id.clone();

        if let Err(e) = self.call_logout_endpoint(&client_id).await {
            warn!(error = %e, "Logout request failed, clearing local credential anyway");
            self.telemetry
                .record(TelemetryEvent::new(names::LOGOUT_REQUEST_FAILED).with("error", &e));
        }

        let previous = {
            let mut state = self.write_state();
            state.credential.clear();
            state.session.take()
        };
        if let Some(previous) = previous {
            previous.cancel();
        }

        let cleared = self
            .store
            .clear()
            .map_err(|e| OneDriveError::CredentialStore(e.to_string()));

        info!("Logged out");
        self.telemetry
            .record(TelemetryEvent::new(names::LOGOUT_COMPLETED));
        cleared
    }

    async fn call_logout_endpoint(&self, client_id: &str) -> Result<()> {
        let url = Url::parse_with_params(
            &self.endpoints.logout_url,
            &[
                ("client_id", client_id),
                ("redirect_uri", self.endpoints.redirect_uri.as_str()),
            ],
        )
        .map_err(|e| OneDriveError::InvalidUrl(format!("logout_url: {}", e)))?;

        let session = TransportSession::new(self.request_timeout)?;
        session
            .run(async {
                session
                    .client()
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok::<_, OneDriveError>(())
            })
            .await
    }

    /// Restores the session from the credential store
    ///
    /// Returns `Ok(false)` when nothing is stored.
    pub async fn restore_session(&self) -> Result<bool> {
        let _exchange = self.exchange_lock.lock().await;
        let stored = self
            .store
            .load()
            .map_err(|e| OneDriveError::CredentialStore(e.to_string()))?;

        match stored {
            Some(tokens) => {
                self.exchange_refresh_token(&tokens.refresh_token).await?;
                Ok(true)
            }
            None => {
                debug!("No stored credential to restore");
                Ok(false)
            }
        }
    }

    /// One background refresh tick
    ///
    /// While logged in, exchanges the current refresh token. While logged
    /// out, retries the token pair left in the credential store, so a
    /// restore that failed at startup is picked up by a later tick; after a
    /// logout the store is empty and the tick does nothing. Failures are
    /// logged and swallowed; returns whether a new token pair was installed.
    pub async fn refresh_now(&self) -> bool {
        // Checked under the lock so a tick queued behind logout sees its result
        let _exchange = self.exchange_lock.lock().await;

        let current = {
            let state = self.read_state();
            if state.credential.is_logged_in() {
                state.credential.refresh_token().map(str::to_string)
            } else {
                None
            }
        };

        let refresh_token = match current {
            Some(token) => token,
            None => match self.store.load() {
                Ok(Some(tokens)) => {
                    info!("Not logged in, retrying stored credential");
                    tokens.refresh_token
                }
                Ok(None) => {
                    debug!("Not logged in, skipping token refresh");
                    return false;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stored credential");
                    return false;
                }
            },
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Background token refresh failed");
                false
            }
        }
    }

    /// Refreshes the token every `period` until `shutdown` is canceled
    ///
    /// The first refresh happens one full period after the call.
    pub async fn run_refresh_loop(&self, period: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_secs = period.as_secs(), "Token refresh loop started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Token refresh loop stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.refresh_now().await;
                }
            }
        }
    }
}
