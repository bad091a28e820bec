//! Shared helpers for OneDrive integration tests
//!
//! Each helper mounts the endpoints a test needs on a wiremock server and
//! returns components pointed at it.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use camvault_core::{
    domain::{ClientCredentials, TelemetryEvent},
    ports::{ITelemetrySink, InMemoryCredentialStore},
};
use camvault_onedrive::{
    auth::{Authenticator, OAuthEndpoints},
    client::OneDriveClient,
    listing::LenientChildrenParser,
    session::TransportSession,
};
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const CLIENT_ID: &str = "000000004C12AB34";
pub const CLIENT_SECRET: &str = "test-secret";
pub const TOKEN_PATH: &str = "/oauth20_token.srf";
pub const LOGOUT_PATH: &str = "/oauth20_logout.srf";
pub const API_PREFIX: &str = "/v1.0/drive/root:";

/// Telemetry sink that keeps every event for later assertions
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }
}

impl ITelemetrySink for RecordingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// OAuth endpoints served by the mock server
pub fn endpoints(server: &MockServer) -> OAuthEndpoints {
    OAuthEndpoints {
        authorize_url: format!("{}/oauth20_authorize.srf", server.uri()),
        token_url: format!("{}{}", server.uri(), TOKEN_PATH),
        logout_url: format!("{}{}", server.uri(), LOGOUT_PATH),
        ..OAuthEndpoints::default()
    }
}

/// Picture client pointed at the mock server, lenient listing parser
pub fn api_client(server: &MockServer) -> OneDriveClient {
    OneDriveClient::new(
        format!("{}{}", server.uri(), API_PREFIX),
        "SecuritySystem",
        Box::new(LenientChildrenParser),
    )
}

/// A session carrying `test-access-token`
pub fn session() -> TransportSession {
    TransportSession::new(Duration::from_secs(5))
        .unwrap()
        .with_bearer("test-access-token")
}

pub struct AuthFixture {
    pub auth: Arc<Authenticator>,
    pub store: Arc<InMemoryCredentialStore>,
    pub telemetry: Arc<RecordingTelemetry>,
}

/// Authenticator pointed at the mock server, with an empty store
pub fn auth_fixture(server: &MockServer) -> AuthFixture {
    auth_fixture_with_store(server, InMemoryCredentialStore::new())
}

pub fn auth_fixture_with_store(server: &MockServer, store: InMemoryCredentialStore) -> AuthFixture {
    let store = Arc::new(store);
    let telemetry = Arc::new(RecordingTelemetry::default());
    let auth = Arc::new(Authenticator::new(
        endpoints(server),
        ClientCredentials::new(CLIENT_ID, CLIENT_SECRET),
        Duration::from_secs(5),
        store.clone(),
        telemetry.clone(),
    ));
    AuthFixture {
        auth,
        store,
        telemetry,
    }
}

/// Mounts a token endpoint answering the given grant type with a token pair
pub async fn mount_token_exchange(server: &MockServer, grant_type: &str, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains(format!("grant_type={}", grant_type)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "bearer",
            "expires_in": 3600,
            "scope": "wl.offline_access onedrive.readwrite",
            "access_token": access,
            "refresh_token": refresh,
            "user_id": "5f1c9ab2"
        })))
        .mount(server)
        .await;
}

/// Logs the fixture in with code `login-code`, yielding tokens `A1` / `B2`
pub async fn log_in(server: &MockServer, fixture: &AuthFixture) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"token_type":"bearer","access_token":"A1","refresh_token":"B2"}"#,
        ))
        .up_to_n_times(1)
        .mount(server)
        .await;

    fixture
        .auth
        .authorize_with_code("login-code")
        .await
        .expect("login failed");
}
