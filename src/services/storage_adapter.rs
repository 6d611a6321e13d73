//! The capability boundary toward the object store.

use crate::models::asset::StoredAsset;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid object key `{0}`")]
    InvalidKey(String),
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Named-blob storage used by the upload orchestrator.
///
/// Implementations must be safe to call concurrently; the orchestrator
/// issues two `upload`s at once for every request that wants a thumbnail.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Store `data` under `name`, optionally beneath `path_prefix`.
    async fn upload(
        &self,
        data: Bytes,
        name: &str,
        content_type: &str,
        path_prefix: Option<&str>,
    ) -> StoreResult<StoredAsset>;

    /// Remove the object stored under `key`.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Join an optional prefix and a name into a single object key.
pub fn object_key(name: &str, path_prefix: Option<&str>) -> String {
    match path_prefix.map(|p| p.trim_matches('/')) {
        Some(prefix) if !prefix.is_empty() => format!("{}/{}", prefix, name),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_joins_prefix() {
        assert_eq!(object_key("a.jpg", None), "a.jpg");
        assert_eq!(object_key("a.jpg", Some("")), "a.jpg");
        assert_eq!(object_key("a.jpg", Some("avatars")), "avatars/a.jpg");
        assert_eq!(object_key("a.jpg", Some("/avatars/2025/")), "avatars/2025/a.jpg");
    }
}
