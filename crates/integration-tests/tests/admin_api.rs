//! Integration tests for admin login, logout and session status.

use axum::http::{StatusCode, header};
use serde_json::json;

use savron_integration_tests::{ADMIN_PASSWORD, ADMIN_USERNAME, TestClient};

#[tokio::test]
async fn test_login_starts_session() {
    let mut client = TestClient::new();

    let response = client.login().await;
    assert!(response.headers.contains_key(header::SET_COOKIE));

    let body = response.json();
    assert_eq!(body["username"], ADMIN_USERNAME);
    assert!(body["expiresAt"].is_string());

    let session = client.get("/api/admin/session").await;
    assert_eq!(session.status, StatusCode::OK);
    assert_eq!(session.json()["username"], ADMIN_USERNAME);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let mut client = TestClient::new();

    let response = client
        .post(
            "/api/admin/login",
            json!({ "username": ADMIN_USERNAME, "password": "milk-chocolate" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "Invalid credentials");

    assert_eq!(
        client.get("/api/admin/session").await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_unknown_username_is_rejected() {
    let mut client = TestClient::new();

    let response = client
        .post(
            "/api/admin/login",
            json!({ "username": "chocolatier", "password": ADMIN_PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "Invalid credentials");
}

#[tokio::test]
async fn test_session_requires_login() {
    let mut client = TestClient::new();

    let response = client.get("/api/admin/session").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "Admin login required");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let mut client = TestClient::new();
    client.login().await;

    let response = client.post("/api/admin/logout", json!({})).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    assert_eq!(
        client.get("/api/admin/session").await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_admin_login_keeps_cart() {
    let mut client = TestClient::new();
    client
        .post("/api/cart/items", json!({ "productId": "default-1" }))
        .await;

    client.login().await;

    assert_eq!(client.get("/api/cart").await.json()["itemCount"], 1);
}
