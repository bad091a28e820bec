//! Transport session
//!
//! A [`TransportSession`] owns one `reqwest::Client` and one cancellation
//! scope. Sessions are immutable once built: replacing the credential means
//! building a new session and canceling the old one, which makes every
//! request still running on the old client resolve to
//! [`OneDriveError::Canceled`].

use std::{fmt, future::Future, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA},
    Client, Method, RequestBuilder,
};
use tokio_util::sync::CancellationToken;

use crate::{OneDriveError, Result};

/// HTTP client, bearer token and cancellation scope used for API calls
pub struct TransportSession {
    client: Client,
    cancel: CancellationToken,
    bearer: Option<String>,
}

impl TransportSession {
    /// Builds a session without a bearer token
    ///
    /// Responses are never served from intermediate caches; every request
    /// carries `Cache-Control: no-cache`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            cancel: CancellationToken::new(),
            bearer: None,
        })
    }

    /// Attaches the access token sent as `Authorization: Bearer` on API calls
    pub fn with_bearer(mut self, access_token: impl Into<String>) -> Self {
        let token = access_token.into();
        self.bearer = if token.is_empty() { None } else { Some(token) };
        self
    }

    /// The underlying HTTP client, without authentication attached
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Starts a request with the bearer token attached, if any
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Cancels every in-flight and future call made through [`run`](Self::run)
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drives `request` to completion unless the session is canceled first
    pub async fn run<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(OneDriveError::Canceled),
            result = request => result,
        }
    }
}

impl fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSession")
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
