//! Integration tests for the Savron storefront.
//!
//! Tests drive the full router (middleware, sessions, handlers) in process
//! with `tower::ServiceExt::oneshot`; no network or database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p savron-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `products_api` - Product administration and admin guard
//! - `upload_api` - Media upload policy and proxying
//! - `catalog_api` - Merged catalog, filters and degraded mode
//! - `cart_api` - Session cart transitions
//! - `checkout_api` - Quotes, checkout, payment and confirmations
//! - `admin_api` - Admin login, logout and session status

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use savron_core::{Product, ProductFields, ProductId};
use savron_storefront::catalog::seed_products;
use savron_storefront::config::{AdminConfig, CloudinaryConfig, StorefrontConfig};
use savron_storefront::db::{MemoryProductStore, ProductStore, StoreError};
use savron_storefront::media::{MediaError, MediaHost, MediaKind, MediaUpload};
use savron_storefront::services::auth::hash_password;
use savron_storefront::state::AppState;

/// Username of the test administrator.
pub const ADMIN_USERNAME: &str = "admin";

/// Password of the test administrator.
pub const ADMIN_PASSWORD: &str = "ganache-and-praline";

const MULTIPART_BOUNDARY: &str = "savron-test-boundary";

/// Storefront configuration for tests: no database, no payment delay.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: None,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: Url::parse("http://localhost:3000").unwrap(),
        admin: AdminConfig {
            username: ADMIN_USERNAME.to_string(),
            password_hash: SecretString::from(hash_password(ADMIN_PASSWORD).unwrap()),
        },
        cloudinary: CloudinaryConfig {
            cloud_name: "savron".to_string(),
            api_key: "123456789012345".to_string(),
            api_secret: SecretString::from("kQ9vZ2xL7pR4tW1yB8nM3cF6hJ0dS5gA"),
            folder: "products".to_string(),
            api_base: Url::parse("http://127.0.0.1:9").unwrap(),
        },
        payment_delay: Duration::ZERO,
        catalog_cache_ttl: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Media host that records uploads instead of sending them.
#[derive(Default)]
pub struct FakeMediaHost {
    pub uploads: Mutex<Vec<(MediaKind, String, usize)>>,
    pub fail: bool,
}

impl FakeMediaHost {
    /// A host that rejects every upload.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of uploads received.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload(&self, upload: MediaUpload) -> Result<String, MediaError> {
        if self.fail {
            return Err(MediaError::Upstream {
                status: 500,
                message: "media host down".to_string(),
            });
        }

        let url = format!(
            "https://media.test/{}/{}",
            upload.kind.as_str(),
            upload.file_name
        );
        self.uploads
            .lock()
            .unwrap()
            .push((upload.kind, upload.file_name, upload.bytes.len()));
        Ok(url)
    }
}

/// Product store that is always unreachable.
pub struct FailingProductStore;

fn unreachable_store() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl ProductStore for FailingProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        Err(unreachable_store())
    }

    async fn get(&self, _id: &ProductId) -> Result<Product, StoreError> {
        Err(unreachable_store())
    }

    async fn create(&self, _fields: ProductFields) -> Result<ProductId, StoreError> {
        Err(unreachable_store())
    }

    async fn update(&self, _id: &ProductId, _patch: ProductFields) -> Result<Product, StoreError> {
        Err(unreachable_store())
    }

    async fn delete(&self, _id: &ProductId) -> Result<(), StoreError> {
        Err(unreachable_store())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(unreachable_store())
    }
}

/// A captured response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// The `error` message of a JSON error body.
    #[must_use]
    pub fn error(&self) -> String {
        self.json()["error"].as_str().unwrap().to_owned()
    }
}

/// One browser talking to the storefront: a router plus a cookie jar holding
/// the session cookie.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    /// Client over a fresh in-memory store and a recording media host.
    #[must_use]
    pub fn new() -> Self {
        Self::with(
            Arc::new(MemoryProductStore::new()),
            Arc::new(FakeMediaHost::default()),
        )
    }

    /// Client over the given store and media host.
    #[must_use]
    pub fn with(products: Arc<dyn ProductStore>, media: Arc<dyn MediaHost>) -> Self {
        Self::build(test_config(), products, media)
    }

    /// Client over a fresh in-memory store with a custom configuration.
    #[must_use]
    pub fn with_config(config: StorefrontConfig) -> Self {
        Self::build(
            config,
            Arc::new(MemoryProductStore::new()),
            Arc::new(FakeMediaHost::default()),
        )
    }

    fn build(
        config: StorefrontConfig,
        products: Arc<dyn ProductStore>,
        media: Arc<dyn MediaHost>,
    ) -> Self {
        let state = AppState::new(config, products, media, seed_products().unwrap());
        Self::for_router(savron_storefront::app(state))
    }

    /// Another browser on the same running app (no cookies).
    #[must_use]
    pub fn for_router(router: Router) -> Self {
        Self {
            router,
            cookie: None,
        }
    }

    /// A second tab of the same browser: same app, same session cookie.
    #[must_use]
    pub fn same_session(&self) -> Self {
        Self {
            router: self.router.clone(),
            cookie: self.cookie.clone(),
        }
    }

    /// The router, to open a second client against the same app.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Send a request, keeping the session cookie up to date.
    pub async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let mut request = request;
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_owned());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request with an optional JSON body.
    pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Log in as the test administrator.
    pub async fn login(&mut self) -> TestResponse {
        let response = self
            .post(
                "/api/admin/login",
                serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "admin login failed");
        response
    }

    /// Upload a file through the multipart endpoint.
    pub async fn upload(&mut self, mime: &str, file_name: &str, bytes: &[u8]) -> TestResponse {
        let mut body = Vec::with_capacity(bytes.len() + 256);
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

        self.send_multipart(body).await
    }

    /// Post a multipart body built by the caller.
    pub async fn send_multipart(&mut self, body: Vec<u8>) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Create a product as admin and return its id.
    pub async fn create_product(&mut self, fields: Value) -> String {
        let response = self.post("/api/products", fields).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.json()["productId"].as_str().unwrap().to_owned()
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Boundary used by [`TestClient::upload`], for hand-built bodies.
#[must_use]
pub const fn multipart_boundary() -> &'static str {
    MULTIPART_BOUNDARY
}

/// A complete, valid product body.
#[must_use]
pub fn product_body(name: &str, category: &str, price: &str) -> Value {
    serde_json::json!({
        "name": name,
        "description": format!("{name}, made in small batches"),
        "price": price,
        "category": category,
        "images": [format!("https://media.test/image/{}.jpg", name.to_lowercase().replace(' ', "-"))],
        "ingredients": ["Cocoa Mass", "Cane Sugar"],
        "allergens": ["Milk"],
        "weight": "90g",
        "origin": "Ecuador",
    })
}

/// A valid checkout form.
#[must_use]
pub fn checkout_body(shipping_method: &str, gift_wrap: bool) -> Value {
    serde_json::json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "address": "12 Cocoa Lane",
        "city": "Portland",
        "state": "OR",
        "zipCode": "97201",
        "country": "United States",
        "email": "ada@example.com",
        "phone": "555-0100",
        "shippingMethod": shipping_method,
        "sameAsShipping": true,
        "isGift": gift_wrap,
        "giftMessage": if gift_wrap { "Happy birthday" } else { "" },
        "giftWrap": gift_wrap,
    })
}

/// A valid payment form (Visa test number, expiry far in the future).
#[must_use]
pub fn payment_body() -> Value {
    serde_json::json!({
        "paymentMethod": "card",
        "cardNumber": "4111 1111 1111 1111",
        "expiryDate": "12/49",
        "cvv": "123",
        "cardholderName": "Ada Lovelace",
        "saveCard": false,
        "termsAccepted": true,
    })
}
