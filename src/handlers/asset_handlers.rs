//! HTTP handlers for asset uploads and object downloads.
//! The upload body is taken as-is (no multipart); object bodies are streamed
//! back from disk.

use crate::{errors::AppError, models::asset::UploadRequest, state::AppState};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use image::ImageFormat;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Query params accepted by `PUT /assets/{*filename}`.
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Also store a thumbnail of the payload.
    #[serde(default)]
    pub thumbnail: bool,
    /// Destination prefix inside the store.
    pub prefix: Option<String>,
}

/// Upload a file to `/assets/{*filename}`.
///
/// Only the extension of `filename` survives; the stored name is derived
/// from a fresh identity.
pub async fn upload_asset(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(q): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::bad_request("request body is empty"));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let mut request = UploadRequest::new(body, filename, content_type).with_thumbnail(q.thumbnail);
    if let Some(prefix) = q.prefix.filter(|p| !p.is_empty()) {
        request = request.with_path_prefix(prefix);
    }

    let result = state.uploads.upload(request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Download a stored object `/objects/{*key}` as a streaming response.
pub async fn get_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let (file, len) = state.objects.open(&key).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&key)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    Ok(response)
}

/// Guess a MIME type from the key's extension.
fn content_type_for(key: &str) -> &'static str {
    ImageFormat::from_path(key)
        .map(|format| format.to_mime_type())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("a/b/c.png"), "image/png");
        assert_eq!(content_type_for("c.JPG"), "image/jpeg");
        assert_eq!(content_type_for("report.pdf"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("noext."), DEFAULT_CONTENT_TYPE);
    }
}
