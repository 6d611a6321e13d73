//! Request and result types for a single asset upload.

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

/// An upload as handed to the orchestrator by its caller.
///
/// Lives for one request only; nothing here is persisted.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    /// Raw payload bytes.
    pub data: Bytes,

    /// Filename supplied by the client; only its extension is kept.
    pub original_filename: String,

    /// MIME type of the payload (e.g. "image/jpeg").
    pub content_type: String,

    /// Optional destination prefix inside the store (e.g. "avatars/2025").
    pub path_prefix: Option<String>,

    /// Whether a resized derivative should be stored alongside the payload.
    pub generate_thumbnail: bool,
}

impl UploadRequest {
    pub fn new(
        data: impl Into<Bytes>,
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            original_filename: original_filename.into(),
            content_type: content_type.into(),
            path_prefix: None,
            generate_thumbnail: false,
        }
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn with_thumbnail(mut self, generate: bool) -> Self {
        self.generate_thumbnail = generate;
        self
    }
}

/// Object names derived from one freshly generated identity.
///
/// `primary == "{identity}.{extension}"` and
/// `thumbnail == "{identity}-thumbnail.{extension}"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetNames {
    pub identity: Uuid,
    pub primary: String,
    pub thumbnail: String,
}

/// What the store hands back for one successfully written blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAsset {
    /// Full object key as written, including any path prefix.
    pub key: String,

    /// Public URL the object can be fetched from.
    pub url: String,

    /// Payload size in bytes.
    pub size_bytes: u64,

    /// Hex MD5 of the payload, when the backend computes one.
    pub etag: Option<String>,
}

/// The only success value callers ever see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub name: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_result_serializes_null_thumbnail() {
        let result = UploadResult {
            name: "abc.pdf".into(),
            url: "http://localhost/objects/abc.pdf".into(),
            thumbnail_url: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["name"], "abc.pdf");
        assert_eq!(json["url"], "http://localhost/objects/abc.pdf");
        assert!(json["thumbnailUrl"].is_null());
    }

    #[test]
    fn request_builder_defaults() {
        let req = UploadRequest::new(vec![1u8, 2, 3], "a.png", "image/png");
        assert!(!req.generate_thumbnail);
        assert!(req.path_prefix.is_none());

        let req = req.with_thumbnail(true).with_path_prefix("avatars");
        assert!(req.generate_thumbnail);
        assert_eq!(req.path_prefix.as_deref(), Some("avatars"));
    }
}
