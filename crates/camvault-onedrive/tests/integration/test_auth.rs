//! Integration tests for the authenticator: code login, refresh, logout

use std::{sync::Arc, time::Duration};

use camvault_core::{
    domain::{CameraName, RemoteFolderPath, RemotePictureName, TokenPair},
    ports::{ICredentialStore, InMemoryCredentialStore},
};
use camvault_onedrive::OneDriveError;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use wiremock::{
    matchers::{body_string_contains, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

fn cam1() -> CameraName {
    CameraName::new("Cam1").unwrap()
}

// ============================================================================
// Authorization code
// ============================================================================

#[tokio::test]
async fn test_authorize_with_code_logs_in_and_persists() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(body_string_contains("client_id=000000004C12AB34"))
        .and(body_string_contains("client_secret=test-secret"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=M.abc-123"))
        .and(body_string_contains(
            "redirect_uri=https%3A%2F%2Flogin.live.com%2Foauth20_desktop.srf",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"access_token":"A1","refresh_token":"B2","expires_in":3600}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    fixture
        .auth
        .authorize_with_code("M.abc-123")
        .await
        .expect("login failed");

    assert!(fixture.auth.is_logged_in());
    assert_eq!(fixture.auth.refresh_token().as_deref(), Some("B2"));
    let session = fixture.auth.session().expect("session installed");
    assert!(!session.is_canceled());
    assert_eq!(
        fixture.store.load().unwrap(),
        Some(TokenPair::new("A1", "B2"))
    );
    assert!(fixture
        .telemetry
        .names()
        .contains(&"LoginSucceeded".to_string()));
}

#[tokio::test]
async fn test_authorize_with_code_rejected() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error":"invalid_grant","error_description":"The provided value for the 'code' parameter is not valid."}"#,
        ))
        .mount(&server)
        .await;

    let err = fixture.auth.authorize_with_code("bad-code").await.unwrap_err();
    match err {
        OneDriveError::Auth(message) => assert!(message.contains("invalid_grant")),
        other => panic!("expected Auth error, got {:?}", other),
    }
    assert!(!fixture.auth.is_logged_in());
    assert!(fixture.auth.session().is_none());
    assert!(fixture.store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_authorize_with_code_malformed_body() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"access_token":"A1","expires_in":3600}"#),
        )
        .mount(&server)
        .await;

    let err = fixture.auth.authorize_with_code("code").await.unwrap_err();
    assert!(matches!(
        err,
        OneDriveError::TokenParse {
            field: "refresh_token"
        }
    ));
    assert!(!fixture.auth.is_logged_in());
}

// ============================================================================
// Refresh token
// ============================================================================

#[tokio::test]
async fn test_refresh_replaces_tokens_and_session() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;
    let old_session = fixture.auth.session().unwrap();

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=B2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token":"A3","refresh_token":"B4"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    fixture
        .auth
        .authorize_with_refresh_token("B2")
        .await
        .expect("refresh failed");

    let new_session = fixture.auth.session().unwrap();
    assert!(!Arc::ptr_eq(&old_session, &new_session));
    assert!(old_session.is_canceled());
    assert!(!new_session.is_canceled());
    assert_eq!(fixture.auth.refresh_token().as_deref(), Some("B4"));
    assert_eq!(
        fixture.store.load().unwrap(),
        Some(TokenPair::new("A3", "B4"))
    );
    assert!(fixture
        .telemetry
        .names()
        .contains(&"TokenRefreshed".to_string()));
}

#[tokio::test]
async fn test_refresh_cancels_in_flight_request_on_old_session() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;
    common::mount_token_exchange(&server, "refresh_token", "A3", "B4").await;

    // Upload endpoint that answers far later than the test waits
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let client = Arc::new(common::api_client(&server));
    let old_session = fixture.auth.session().unwrap();
    let upload = {
        let client = client.clone();
        tokio::spawn(async move {
            let name = RemotePictureName::new(
                &cam1(),
                NaiveDate::from_ymd_opt(2024, 3, 15)
                    .unwrap()
                    .and_hms_opt(7, 0, 0)
                    .unwrap(),
                1,
            );
            client
                .upload_picture(&old_session, &name, b"jpeg".to_vec())
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    fixture
        .auth
        .authorize_with_refresh_token("B2")
        .await
        .expect("refresh failed");

    let result = tokio::time::timeout(Duration::from_secs(5), upload)
        .await
        .expect("upload was not canceled")
        .unwrap();
    assert!(matches!(result, Err(OneDriveError::Canceled)));
}

#[tokio::test]
async fn test_session_stays_live_until_refresh_completes() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token":"A3","refresh_token":"B4"}"#)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let old_session = fixture.auth.session().unwrap();
    let refresh = {
        let auth = fixture.auth.clone();
        tokio::spawn(async move { auth.authorize_with_refresh_token("B2").await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    let during = fixture.auth.session().expect("session during refresh");
    assert!(Arc::ptr_eq(&during, &old_session));
    assert!(!during.is_canceled());

    refresh.await.unwrap().expect("refresh failed");
    assert!(old_session.is_canceled());
    let after = fixture.auth.session().unwrap();
    assert!(!Arc::ptr_eq(&after, &old_session));
}

#[tokio::test]
async fn test_refresh_failure_keeps_previous_credential() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    // Listing only succeeds when the previous access token is still attached
    Mock::given(method("GET"))
        .and(path(
            "/v1.0/drive/root:/Pictures/SecuritySystem/Cam1/03_15_2024:/children",
        ))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let err = fixture
        .auth
        .authorize_with_refresh_token("B2")
        .await
        .unwrap_err();
    assert!(matches!(err, OneDriveError::Auth(_)));

    assert!(fixture.auth.is_logged_in());
    assert_eq!(fixture.auth.refresh_token().as_deref(), Some("B2"));
    let session = fixture.auth.session().expect("session reinstalled");
    assert!(!session.is_canceled());

    let client = common::api_client(&server);
    let folder = RemoteFolderPath::day_bucket(
        "SecuritySystem",
        &cam1(),
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
    );
    let names = client.list_pictures(&session, &folder).await.unwrap();
    assert!(names.is_empty());
    assert!(fixture
        .telemetry
        .names()
        .contains(&"TokenRefreshFailed".to_string()));
}

#[tokio::test]
async fn test_refresh_now_uses_stored_refresh_token() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(body_string_contains("refresh_token=B2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token":"A3","refresh_token":"B4"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert!(fixture.auth.refresh_now().await);
    assert_eq!(fixture.auth.refresh_token().as_deref(), Some("B4"));
}

#[tokio::test]
async fn test_refresh_now_swallows_failure() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    assert!(!fixture.auth.refresh_now().await);
    assert!(fixture.auth.is_logged_in());
}

#[tokio::test]
async fn test_refresh_now_retries_stored_credential_after_failed_restore() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture_with_store(
        &server,
        InMemoryCredentialStore::with_tokens(TokenPair::new("A0", "B0")),
    );

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    assert!(fixture.auth.restore_session().await.is_err());
    assert!(!fixture.auth.is_logged_in());
    assert!(fixture.auth.session().is_none());

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(body_string_contains("refresh_token=B0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token":"A1","refresh_token":"B1"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert!(fixture.auth.refresh_now().await);
    assert!(fixture.auth.is_logged_in());
    assert_eq!(fixture.auth.refresh_token().as_deref(), Some("B1"));
    assert_eq!(
        fixture.store.load().unwrap(),
        Some(TokenPair::new("A1", "B1"))
    );
}

#[tokio::test]
async fn test_refresh_now_does_nothing_without_credential() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!fixture.auth.refresh_now().await);
    assert!(!fixture.auth.is_logged_in());
}

#[tokio::test]
async fn test_refresh_loop_refreshes_until_shutdown() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;
    common::mount_token_exchange(&server, "refresh_token", "A3", "B2").await;

    let shutdown = CancellationToken::new();
    let refresher = {
        let auth = fixture.auth.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            auth.run_refresh_loop(Duration::from_millis(100), shutdown)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(450)).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), refresher)
        .await
        .expect("refresh loop did not stop")
        .unwrap();

    let refreshes = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| String::from_utf8_lossy(&r.body).contains("grant_type=refresh_token"))
        .count();
    assert!(refreshes >= 2, "expected periodic refreshes, saw {}", refreshes);
    assert!(fixture.auth.is_logged_in());
}

#[tokio::test]
async fn test_restore_session_from_store() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture_with_store(
        &server,
        InMemoryCredentialStore::with_tokens(TokenPair::new("A0", "B0")),
    );

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(body_string_contains("refresh_token=B0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token":"A1","refresh_token":"B1"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert!(fixture.auth.restore_session().await.unwrap());
    assert!(fixture.auth.is_logged_in());
    assert_eq!(
        fixture.store.load().unwrap(),
        Some(TokenPair::new("A1", "B1"))
    );
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_calls_endpoint_and_clears_state() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;
    let old_session = fixture.auth.session().unwrap();

    Mock::given(method("GET"))
        .and(path(common::LOGOUT_PATH))
        .and(query_param("client_id", common::CLIENT_ID))
        .and(query_param(
            "redirect_uri",
            "https://login.live.com/oauth20_desktop.srf",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    fixture.auth.logout().await.expect("logout failed");

    assert!(!fixture.auth.is_logged_in());
    assert!(fixture.auth.session().is_none());
    assert!(fixture.auth.refresh_token().is_none());
    assert!(old_session.is_canceled());
    assert!(fixture.store.load().unwrap().is_none());
    assert!(fixture
        .telemetry
        .names()
        .contains(&"LogoutCompleted".to_string()));
}

#[tokio::test]
async fn test_logout_clears_state_when_endpoint_fails() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;

    Mock::given(method("GET"))
        .and(path(common::LOGOUT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    fixture.auth.logout().await.expect("logout failed");

    assert!(!fixture.auth.is_logged_in());
    assert!(fixture.store.load().unwrap().is_none());
    let names = fixture.telemetry.names();
    assert!(names.contains(&"LogoutRequestFailed".to_string()));
    assert!(names.contains(&"LogoutCompleted".to_string()));
}

#[tokio::test]
async fn test_refresh_queued_behind_logout_stays_logged_out() {
    let server = MockServer::start().await;
    let fixture = common::auth_fixture(&server);
    common::log_in(&server, &fixture).await;
    common::mount_token_exchange(&server, "refresh_token", "A3", "B4").await;

    Mock::given(method("GET"))
        .and(path(common::LOGOUT_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let logout = {
        let auth = fixture.auth.clone();
        tokio::spawn(async move { auth.logout().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let refreshed = fixture.auth.refresh_now().await;

    logout.await.unwrap().expect("logout failed");
    assert!(!refreshed);
    assert!(!fixture.auth.is_logged_in());
    assert!(fixture.auth.session().is_none());
    assert!(fixture.store.load().unwrap().is_none());

    let refreshes = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| String::from_utf8_lossy(&r.body).contains("grant_type=refresh_token"))
        .count();
    assert_eq!(refreshes, 0);
}
