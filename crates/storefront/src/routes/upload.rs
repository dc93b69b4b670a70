//! Media upload proxy endpoint.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::media::{MAX_VIDEO_BYTES, MediaUpload};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Request body ceiling for the upload route: the largest file plus room for
/// the multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_VIDEO_BYTES + 2 * 1024 * 1024;

/// Accept a multipart `file` field and forward it to the media host.
#[instrument(skip(state, admin, multipart), fields(admin = %admin.username))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut received = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        received = Some((mime, file_name, bytes));
        break;
    }

    let (mime, file_name, bytes) =
        received.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let upload = MediaUpload::new(mime, file_name, bytes.to_vec())?;
    let kind = upload.kind;
    let image_url = state.media().upload(upload).await?;

    Ok(Json(json!({
        "message": "File uploaded successfully",
        "imageUrl": image_url,
        "fileType": kind,
    })))
}
