//! Integration tests for picture upload, listing and deletion

use camvault_core::domain::{CameraName, RemoteFolderPath, RemotePictureName};
use camvault_onedrive::{client::OneDriveClient, listing::JsonChildrenParser, OneDriveError};
use chrono::NaiveDate;
use wiremock::{
    matchers::{body_bytes, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

fn cam1() -> CameraName {
    CameraName::new("Cam1").unwrap()
}

fn day_bucket(y: i32, m: u32, d: u32) -> RemoteFolderPath {
    RemoteFolderPath::day_bucket(
        "SecuritySystem",
        &cam1(),
        NaiveDate::from_ymd_opt(y, m, d).unwrap(),
    )
}

const CHILDREN_BODY: &str = r#"{
  "value": [
    {"id": "1", "name": "07_638460828000000000.jpg", "size": 48213},
    {"id": "2", "name": "07_638460828010000000.jpg", "size": 47002},
    {"id": "3", "name": "thumbs.db", "size": 10}
  ]
}"#;

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_picture_puts_bytes_at_bucketed_path() {
    let server = MockServer::start().await;
    let client = common::api_client(&server);
    let timestamp = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(7, 42, 0)
        .unwrap();
    let name = RemotePictureName::new(&cam1(), timestamp, 638_461_237_200_000_000);

    Mock::given(method("PUT"))
        .and(path(
            "/v1.0/drive/root:/Pictures/SecuritySystem/Cam1/03_15_2024/07_638461237200000000.jpg:/content",
        ))
        .and(header("Authorization", "Bearer test-access-token"))
        .and(header("Cache-Control", "no-cache"))
        .and(body_bytes(b"\xff\xd8\xff\xe0jpeg".to_vec()))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "item-001",
            "name": "07_638461237200000000.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .upload_picture(&common::session(), &name, b"\xff\xd8\xff\xe0jpeg".to_vec())
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_upload_requires_created_status() {
    let server = MockServer::start().await;
    let client = common::api_client(&server);
    let name = RemotePictureName::new(
        &cam1(),
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap(),
        1,
    );

    // 200 is a success status but not "created"
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client
        .upload_picture(&common::session(), &name, vec![1, 2, 3])
        .await
        .unwrap_err();
    match err {
        OneDriveError::Upload { name, status } => {
            assert_eq!(status, 200);
            assert_eq!(name, "Cam1/03_15_2024/07_1.jpg");
        }
        other => panic!("expected Upload error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_on_canceled_session() {
    let server = MockServer::start().await;
    let client = common::api_client(&server);
    let session = common::session();
    session.cancel();

    let name = RemotePictureName::new(
        &cam1(),
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap(),
        1,
    );
    let err = client
        .upload_picture(&session, &name, vec![1])
        .await
        .unwrap_err();
    assert!(err.is_canceled());
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_pictures_parses_children() {
    let server = MockServer::start().await;
    let client = common::api_client(&server);

    Mock::given(method("GET"))
        .and(path(
            "/v1.0/drive/root:/Pictures/SecuritySystem/Cam1/02_14_2024:/children",
        ))
        .and(header("Authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHILDREN_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let names = client
        .list_pictures(&common::session(), &day_bucket(2024, 2, 14))
        .await
        .unwrap();
    assert_eq!(
        names,
        vec!["07_638460828000000000.jpg", "07_638460828010000000.jpg"]
    );
}

#[tokio::test]
async fn test_list_pictures_with_json_parser() {
    let server = MockServer::start().await;
    let client = OneDriveClient::new(
        format!("{}{}", server.uri(), common::API_PREFIX),
        "SecuritySystem",
        Box::new(JsonChildrenParser),
    );

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHILDREN_BODY))
        .mount(&server)
        .await;

    let names = client
        .list_pictures(&common::session(), &day_bucket(2024, 2, 14))
        .await
        .unwrap();
    assert_eq!(names.len(), 2);
}

#[tokio::test]
async fn test_list_missing_folder_is_empty() {
    let server = MockServer::start().await;
    let client = common::api_client(&server);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": "itemNotFound", "message": "Item does not exist"}
        })))
        .mount(&server)
        .await;

    let names = client
        .list_pictures(&common::session(), &day_bucket(2024, 2, 14))
        .await
        .unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn test_list_failure_is_error() {
    let server = MockServer::start().await;
    let client = common::api_client(&server);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string(CHILDREN_BODY))
        .mount(&server)
        .await;

    let err = client
        .list_pictures(&common::session(), &day_bucket(2024, 2, 14))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OneDriveError::Listing { status: 503, .. }
    ));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_picture_expects_no_content() {
    let server = MockServer::start().await;
    let client = common::api_client(&server);

    Mock::given(method("DELETE"))
        .and(path(
            "/v1.0/drive/root:/Pictures/SecuritySystem/Cam1/02_14_2024/07_1.jpg",
        ))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(
            "/v1.0/drive/root:/Pictures/SecuritySystem/Cam1/02_14_2024/07_2.jpg",
        ))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let session = common::session();
    let folder = day_bucket(2024, 2, 14);
    client
        .delete_picture(&session, &folder, "07_1.jpg")
        .await
        .expect("delete failed");

    let err = client
        .delete_picture(&session, &folder, "07_2.jpg")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
}
