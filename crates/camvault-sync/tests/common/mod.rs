//! Shared fixtures for sync integration tests
//!
//! Every fixture logs an authenticator in against a wiremock server that
//! stands in for both the token endpoint and the OneDrive API.

#![allow(dead_code)]

use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use camvault_core::{
    domain::{CameraName, ClientCredentials, TelemetryEvent},
    ports::{ITelemetrySink, InMemoryCredentialStore},
};
use camvault_onedrive::{
    auth::{Authenticator, OAuthEndpoints},
    client::OneDriveClient,
    listing::LenientChildrenParser,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const API_PREFIX: &str = "/v1.0/drive/root:/Pictures/SecuritySystem";

#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name == name)
            .count()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ITelemetrySink for RecordingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn cam1() -> CameraName {
    CameraName::new("Cam1").unwrap()
}

pub struct Fixture {
    pub server: MockServer,
    pub auth: Arc<Authenticator>,
    pub client: Arc<OneDriveClient>,
    pub telemetry: Arc<RecordingTelemetry>,
}

/// Starts a mock provider and returns a logged-out fixture
pub async fn logged_out() -> Fixture {
    let server = MockServer::start().await;
    let telemetry = Arc::new(RecordingTelemetry::default());
    let endpoints = OAuthEndpoints {
        token_url: format!("{}/oauth20_token.srf", server.uri()),
        logout_url: format!("{}/oauth20_logout.srf", server.uri()),
        ..OAuthEndpoints::default()
    };
    let auth = Arc::new(Authenticator::new(
        endpoints,
        ClientCredentials::new("client", "secret"),
        Duration::from_secs(5),
        Arc::new(InMemoryCredentialStore::new()),
        telemetry.clone(),
    ));
    let client = Arc::new(OneDriveClient::new(
        format!("{}/v1.0/drive/root:", server.uri()),
        "SecuritySystem",
        Box::new(LenientChildrenParser),
    ));
    Fixture {
        server,
        auth,
        client,
        telemetry,
    }
}

/// Starts a mock provider and logs in with access token `A1`
pub async fn logged_in() -> Fixture {
    let fixture = logged_out().await;
    Mock::given(method("POST"))
        .and(path("/oauth20_token.srf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token":"A1","refresh_token":"B2"}"#),
        )
        .mount(&fixture.server)
        .await;
    fixture
        .auth
        .authorize_with_code("code")
        .await
        .expect("login failed");
    fixture
}

/// Writes `content` to `relative` under `root`, creating folders
pub fn write_picture(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Counts files left under `root`, recursively
pub fn remaining_files(root: &Path) -> usize {
    let mut count = 0;
    for entry in std::fs::read_dir(root).unwrap() {
        let entry = entry.unwrap();
        if entry.file_type().unwrap().is_dir() {
            count += remaining_files(&entry.path());
        } else {
            count += 1;
        }
    }
    count
}
