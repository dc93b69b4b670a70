//! Integration tests for the media upload proxy.

use std::sync::Arc;

use axum::http::StatusCode;

use savron_integration_tests::{FakeMediaHost, TestClient, multipart_boundary};
use savron_storefront::db::MemoryProductStore;
use savron_storefront::media::MediaHost;

const MIB: usize = 1024 * 1024;

fn client_with(media: &Arc<FakeMediaHost>) -> TestClient {
    TestClient::with(Arc::new(MemoryProductStore::new()), Arc::clone(media) as Arc<dyn MediaHost>)
}

#[tokio::test]
async fn test_upload_requires_admin() {
    let media = Arc::new(FakeMediaHost::default());
    let mut client = client_with(&media);

    let response = client.upload("image/png", "truffle.png", b"png").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(media.upload_count(), 0);
}

#[tokio::test]
async fn test_image_upload_returns_url() {
    let media = Arc::new(FakeMediaHost::default());
    let mut client = client_with(&media);
    client.login().await;

    let response = client.upload("image/png", "truffle.png", &[0x89, b'P', b'N', b'G']).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["message"], "File uploaded successfully");
    assert_eq!(body["imageUrl"], "https://media.test/image/truffle.png");
    assert_eq!(body["fileType"], "image");
    assert_eq!(media.upload_count(), 1);
}

#[tokio::test]
async fn test_text_plain_is_rejected() {
    let media = Arc::new(FakeMediaHost::default());
    let mut client = client_with(&media);
    client.login().await;

    let response = client.upload("text/plain", "notes.txt", b"hello").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.error(),
        "Invalid file type. Only images and videos are allowed."
    );
    assert_eq!(media.upload_count(), 0);
}

#[tokio::test]
async fn test_oversized_image_names_limit() {
    let media = Arc::new(FakeMediaHost::default());
    let mut client = client_with(&media);
    client.login().await;

    let response = client
        .upload("image/png", "huge.png", &vec![0u8; 6 * MIB])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.error().contains("5MB"));
    assert_eq!(media.upload_count(), 0);
}

#[tokio::test]
async fn test_six_mib_video_is_accepted() {
    let media = Arc::new(FakeMediaHost::default());
    let mut client = client_with(&media);
    client.login().await;

    let response = client
        .upload("video/mp4", "making-of.mp4", &vec![0u8; 6 * MIB])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["fileType"], "video");

    let uploads = media.uploads.lock().unwrap();
    assert_eq!(uploads[0].2, 6 * MIB);
}

#[tokio::test]
async fn test_missing_file_field() {
    let media = Arc::new(FakeMediaHost::default());
    let mut client = client_with(&media);
    client.login().await;

    let boundary = multipart_boundary();
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"caption\"\r\n\r\n\
         Dark truffles\r\n\
         --{boundary}--\r\n"
    );

    let response = client.send_multipart(body.into_bytes()).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), "No file provided");
}

#[tokio::test]
async fn test_media_host_failure_is_bad_gateway() {
    let media = Arc::new(FakeMediaHost::failing());
    let mut client = client_with(&media);
    client.login().await;

    let response = client.upload("image/jpeg", "bar.jpg", b"jpeg").await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.error(), "Failed to upload file");
}
