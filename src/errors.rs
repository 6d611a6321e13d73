use crate::services::{
    storage_adapter::StoreError,
    upload_service::{UploadError, UploadFailure},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::not_found(err.to_string()),
            StoreError::InvalidKey(_) => AppError::bad_request(err.to_string()),
            StoreError::Unavailable(_) | StoreError::Io(_) => AppError::internal(err.to_string()),
        }
    }
}

/// Upload failures keep their opaque message; only the status reflects the cause.
impl From<UploadFailure> for AppError {
    fn from(err: UploadFailure) -> Self {
        let status = match err.cause() {
            UploadError::ThumbnailGeneration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            UploadError::PrimaryUpload(StoreError::InvalidKey(_))
            | UploadError::ThumbnailUpload(StoreError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            UploadError::PrimaryUpload(_) | UploadError::ThumbnailUpload(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        AppError::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::thumbnail::ThumbnailError;

    #[test]
    fn thumbnail_failures_are_unprocessable() {
        let failure = UploadFailure::from(UploadError::ThumbnailGeneration(
            ThumbnailError::UnknownFormat,
        ));
        let err = AppError::from(failure);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "failed to upload file");
    }

    #[test]
    fn store_failures_are_bad_gateway() {
        let failure = UploadFailure::from(UploadError::ThumbnailUpload(StoreError::unavailable(
            "timeout",
        )));
        assert_eq!(AppError::from(failure).status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn rejected_keys_are_bad_request() {
        for cause in [
            UploadError::PrimaryUpload(StoreError::InvalidKey("../x.jpg".into())),
            UploadError::ThumbnailUpload(StoreError::InvalidKey("../x-thumbnail.jpg".into())),
        ] {
            let err = AppError::from(UploadFailure::from(cause));
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.message, "failed to upload file");
        }
    }

    #[test]
    fn missing_object_is_not_found() {
        let err = AppError::from(StoreError::NotFound("a.jpg".into()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
