//! src/services/upload_service.rs
//!
//! UploadService — stores an uploaded file and, on request, a thumbnail of
//! it as one all-or-nothing operation.
//!
//! Both store writes are started together and the service waits for both to
//! settle before deciding anything. If exactly one of them went through, the
//! stored object is deleted again (best effort) so callers never end up with
//! half of a pair. Callers receive either a complete `UploadResult` or a
//! single `UploadFailure`.

use crate::{
    models::asset::{AssetNames, StoredAsset, UploadRequest, UploadResult},
    services::{
        naming::derive_names,
        storage_adapter::{StorageAdapter, StoreError},
        thumbnail::{Thumbnail, ThumbnailError, ThumbnailSize, generate_thumbnail},
    },
};
use bytes::Bytes;
use futures::future::OptionFuture;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Which step of an upload went wrong.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("thumbnail generation failed: {0}")]
    ThumbnailGeneration(#[source] ThumbnailError),
    #[error("primary upload failed: {0}")]
    PrimaryUpload(#[source] StoreError),
    #[error("thumbnail upload failed: {0}")]
    ThumbnailUpload(#[source] StoreError),
}

/// The single error returned to callers of [`UploadService::upload`].
///
/// The message is deliberately generic; the underlying cause is kept for
/// logging and status mapping.
#[derive(Debug, Error)]
#[error("failed to upload file")]
pub struct UploadFailure {
    #[source]
    cause: UploadError,
}

impl UploadFailure {
    pub fn cause(&self) -> &UploadError {
        &self.cause
    }
}

impl From<UploadError> for UploadFailure {
    fn from(cause: UploadError) -> Self {
        Self { cause }
    }
}

/// Coordinates thumbnail generation, concurrent storage and rollback.
///
/// Holds no per-request state; clones share the same store.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn StorageAdapter>,
    thumbnail_size: ThumbnailSize,
}

impl UploadService {
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self {
            store,
            thumbnail_size: ThumbnailSize::default(),
        }
    }

    pub fn with_thumbnail_size(mut self, size: ThumbnailSize) -> Self {
        self.thumbnail_size = size;
        self
    }

    pub fn thumbnail_size(&self) -> ThumbnailSize {
        self.thumbnail_size
    }

    /// Store `request.data` and, if requested, its thumbnail.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadFailure> {
        let names = derive_names(&request.original_filename);
        info!(
            name = %names.primary,
            thumbnail = request.generate_thumbnail,
            size = request.data.len(),
            "uploading asset"
        );

        let thumbnail = if request.generate_thumbnail {
            let thumb = self
                .render_thumbnail(request.data.clone())
                .await
                .map_err(|err| {
                    error!(name = %names.primary, error = %err, "thumbnail generation failed");
                    UploadError::ThumbnailGeneration(err)
                })?;
            debug!(
                name = %names.thumbnail,
                format = ?thumb.format,
                width = thumb.width,
                height = thumb.height,
                "thumbnail generated"
            );
            Some(thumb)
        } else {
            None
        };

        let prefix = request.path_prefix.as_deref();
        let primary_leg = self.store.upload(
            request.data.clone(),
            &names.primary,
            &request.content_type,
            prefix,
        );
        let thumbnail_leg: OptionFuture<_> = thumbnail
            .map(|thumb| {
                self.store
                    .upload(thumb.data, &names.thumbnail, &request.content_type, prefix)
            })
            .into();

        // Wait for both legs; neither outcome is acted on alone.
        let (primary, thumbnail) = tokio::join!(primary_leg, thumbnail_leg);

        self.reconcile(&names, primary, thumbnail)
            .await
            .map_err(UploadFailure::from)
    }

    async fn render_thumbnail(&self, data: Bytes) -> Result<Thumbnail, ThumbnailError> {
        let ThumbnailSize { width, height } = self.thumbnail_size;
        tokio::task::spawn_blocking(move || generate_thumbnail(&data, width, height))
            .await
            .map_err(|err| ThumbnailError::Worker(err.to_string()))?
    }

    async fn reconcile(
        &self,
        names: &AssetNames,
        primary: Result<StoredAsset, StoreError>,
        thumbnail: Option<Result<StoredAsset, StoreError>>,
    ) -> Result<UploadResult, UploadError> {
        match (primary, thumbnail) {
            (Ok(primary), None) => {
                debug!(
                    name = %names.primary,
                    size = primary.size_bytes,
                    etag = ?primary.etag,
                    "asset stored"
                );
                Ok(UploadResult {
                    name: names.primary.clone(),
                    url: primary.url,
                    thumbnail_url: None,
                })
            }
            (Ok(primary), Some(Ok(thumb))) => {
                debug!(
                    name = %names.primary,
                    size = primary.size_bytes,
                    etag = ?primary.etag,
                    thumbnail = %names.thumbnail,
                    thumbnail_size = thumb.size_bytes,
                    thumbnail_etag = ?thumb.etag,
                    "asset and thumbnail stored"
                );
                Ok(UploadResult {
                    name: names.primary.clone(),
                    url: primary.url,
                    thumbnail_url: Some(thumb.url),
                })
            }
            (Ok(primary), Some(Err(err))) => {
                error!(name = %names.thumbnail, error = %err, "thumbnail upload failed");
                self.compensate(&primary).await;
                Err(UploadError::ThumbnailUpload(err))
            }
            (Err(err), Some(Ok(thumb))) => {
                error!(name = %names.primary, error = %err, "primary upload failed");
                self.compensate(&thumb).await;
                Err(UploadError::PrimaryUpload(err))
            }
            (Err(err), Some(Err(thumb_err))) => {
                error!(
                    name = %names.primary,
                    error = %err,
                    thumbnail_error = %thumb_err,
                    "primary and thumbnail uploads failed"
                );
                Err(UploadError::PrimaryUpload(err))
            }
            (Err(err), None) => {
                error!(name = %names.primary, error = %err, "primary upload failed");
                Err(UploadError::PrimaryUpload(err))
            }
        }
    }

    /// Best-effort removal of an object whose counterpart failed to store.
    async fn compensate(&self, orphan: &StoredAsset) {
        match self.store.delete(&orphan.key).await {
            Ok(()) => debug!(
                key = %orphan.key,
                size = orphan.size_bytes,
                "rolled back stored object"
            ),
            Err(err) => warn!(
                key = %orphan.key,
                error = %err,
                "compensating delete failed; object may be orphaned"
            ),
        }
    }
}
