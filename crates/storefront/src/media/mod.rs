//! Media upload proxy.
//!
//! The admin panel uploads product images and videos through the storefront,
//! which checks them against the upload policy and forwards them to the media
//! host. The policy runs before any network traffic.
//!
//! | Kind  | MIME types                                          | Ceiling |
//! |-------|-----------------------------------------------------|---------|
//! | image | `image/jpeg`, `image/png`, `image/webp`, `image/gif` | 5 MiB  |
//! | video | `video/mp4`, `video/quicktime`, `video/x-msvideo`   | 10 MiB  |

pub mod cloudinary;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use cloudinary::CloudinaryClient;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];
const VIDEO_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/x-msvideo"];

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Largest accepted video, in bytes.
pub const MAX_VIDEO_BYTES: usize = 10 * 1024 * 1024;

/// Kind of media, which decides the size ceiling and the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type, or `None` when it is not allowed.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if IMAGE_TYPES.contains(&mime.as_str()) {
            Some(Self::Image)
        } else if VIDEO_TYPES.contains(&mime.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Size ceiling in bytes.
    #[must_use]
    pub const fn max_bytes(self) -> usize {
        match self {
            Self::Image => MAX_IMAGE_BYTES,
            Self::Video => MAX_VIDEO_BYTES,
        }
    }

    /// Size ceiling as shown to users.
    #[must_use]
    pub const fn limit_label(self) -> &'static str {
        match self {
            Self::Image => "5MB",
            Self::Video => "10MB",
        }
    }

    /// Resource type segment of the media host's upload URL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// Upload rejected by policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadPolicyError {
    #[error("Invalid file type. Only images and videos are allowed.")]
    UnsupportedMediaType(String),

    #[error("File too large. Maximum size is {limit}.")]
    PayloadTooLarge { limit: &'static str, size: usize },
}

/// Check a file's declared type and size.
///
/// # Errors
///
/// [`UploadPolicyError::UnsupportedMediaType`] for types outside the
/// allow-list, [`UploadPolicyError::PayloadTooLarge`] above the ceiling for
/// its kind.
pub fn check_upload(mime: &str, size: usize) -> Result<MediaKind, UploadPolicyError> {
    let kind = MediaKind::from_mime(mime)
        .ok_or_else(|| UploadPolicyError::UnsupportedMediaType(mime.to_owned()))?;
    if size > kind.max_bytes() {
        return Err(UploadPolicyError::PayloadTooLarge {
            limit: kind.limit_label(),
            size,
        });
    }
    Ok(kind)
}

/// Errors from the media host.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The request never completed.
    #[error("media host unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The media host answered with an error.
    #[error("media host returned {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// A file that passed the upload policy.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub kind: MediaKind,
    pub mime: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    /// Apply the upload policy to a received file.
    ///
    /// # Errors
    ///
    /// See [`check_upload`].
    pub fn new(
        mime: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, UploadPolicyError> {
        let mime = mime.into();
        let kind = check_upload(&mime, bytes.len())?;
        Ok(Self {
            kind,
            mime,
            file_name: file_name.into(),
            bytes,
        })
    }
}

/// A service that stores media and hands back a durable URL.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Store the file and return its public URL.
    async fn upload(&self, upload: MediaUpload) -> Result<String, MediaError>;
}
