//! Cloudinary upload client.
//!
//! Uploads are signed: the parameters other than the file and the API key
//! are sorted by name, joined as `key=value&...`, suffixed with the API
//! secret and hashed with SHA-256.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use super::{MediaError, MediaHost, MediaKind, MediaUpload};
use crate::config::CloudinaryConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Cloudinary upload API.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    folder: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &CloudinaryConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_base: config.api_base.as_str().trim_end_matches('/').to_owned(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
        })
    }

    fn upload_url(&self, kind: MediaKind) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.api_base,
            self.cloud_name,
            kind.as_str()
        )
    }

    /// Sign `params` with the API secret.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let joined = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    #[instrument(skip(self, upload), fields(kind = upload.kind.as_str(), size = upload.bytes.len()))]
    async fn upload(&self, upload: MediaUpload) -> Result<String, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())]);

        let file = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime)?;

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.upload_url(upload.kind))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or(body, |e| e.error.message);
            tracing::warn!(status = %status, message = %message, "Cloudinary upload rejected");
            return Err(MediaError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::info!(url = %uploaded.secure_url, "Media uploaded");
        Ok(uploaded.secure_url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const SECRET: &str = "kQ9vZ2xL7pR4tW1yB8nM3cF6hJ0dS5gA";

    fn client(api_base: &str) -> CloudinaryClient {
        CloudinaryClient::new(&CloudinaryConfig {
            cloud_name: "savron".to_string(),
            api_key: "123456789012345".to_string(),
            api_secret: SecretString::from(SECRET),
            folder: "products".to_string(),
            api_base: Url::parse(api_base).unwrap(),
        })
        .unwrap()
    }

    fn png() -> MediaUpload {
        MediaUpload::new("image/png", "truffle.png", vec![0x89, b'P', b'N', b'G']).unwrap()
    }

    #[test]
    fn test_signature_sorts_params() {
        let client = client("https://api.cloudinary.com");
        let forward = client.sign(&[("folder", "products"), ("timestamp", "1700000000")]);
        let reversed = client.sign(&[("timestamp", "1700000000"), ("folder", "products")]);

        assert_eq!(forward, reversed);
        assert_eq!(
            forward,
            "319937439245d54c9da784d0a6323c1e97cc86420dbd63289609605260eb779c"
        );
    }

    #[test]
    fn test_upload_url_per_kind() {
        let client = client("https://api.cloudinary.com/");
        assert_eq!(
            client.upload_url(MediaKind::Video),
            "https://api.cloudinary.com/v1_1/savron/video/upload"
        );
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/savron/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "products/truffle",
                "secure_url": "https://res.cloudinary.com/savron/image/upload/products/truffle.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server.uri()).upload(png()).await.unwrap();
        assert_eq!(
            url,
            "https://res.cloudinary.com/savron/image/upload/products/truffle.png"
        );

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"signature\""));
        assert!(body.contains("name=\"api_key\""));
        assert!(body.contains("sha256"));
    }

    #[tokio::test]
    async fn test_upload_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Invalid Signature" }
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri()).upload(png()).await.unwrap_err();
        match err {
            MediaError::Upstream { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            MediaError::Network(e) => panic!("unexpected network error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) is not listening on loopback.
        let err = client("http://127.0.0.1:9").upload(png()).await.unwrap_err();
        assert!(matches!(err, MediaError::Network(_)));
    }
}
