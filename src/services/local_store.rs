//! src/services/local_store.rs
//!
//! LocalDiskStore — a `StorageAdapter` that keeps objects on local disk,
//! sharded beneath `base_path/{shard}/{shard}/{key}`, and hands out URLs
//! under a configurable public base.

use crate::{
    models::asset::StoredAsset,
    services::storage_adapter::{StorageAdapter, StoreError, StoreResult, object_key},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_OBJECT_KEY_LEN: usize = 1024;

/// Filesystem-backed object store.
///
/// Writes go to a temp file in the target directory, are fsynced, and are
/// then renamed into place so readers never observe a partial object.
#[derive(Clone, Debug)]
pub struct LocalDiskStore {
    /// Base directory on disk where object payloads are stored.
    base_path: PathBuf,

    /// Public URL prefix that object keys are appended to.
    public_url: String,
}

impl LocalDiskStore {
    pub fn new(base_path: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_url: public_url.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Public URL for an object key.
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), key)
    }

    /// Basic key validation to avoid trivial path traversal vectors.
    ///
    /// Rejects empty or oversized keys, keys that begin with `/`, contain
    /// `..`, backslashes or control characters.
    fn ensure_key_safe(key: &str) -> StoreResult<()> {
        if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        if key.starts_with('/') || key.contains("..") {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        if key
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    /// Generate two-level shard identifiers for an object key.
    ///
    /// First two bytes of MD5(key) as lowercase hex (00–ff).
    fn object_shards(key: &str) -> (String, String) {
        let digest = md5::compute(key);
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Physical path of an object. Parent directories may not exist yet.
    fn object_path(&self, key: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::object_shards(key);
        let mut path = self.base_path.clone();
        path.push(shard_a);
        path.push(shard_b);
        path.push(key);
        path
    }

    /// Open a stored object for reading, returning the handle and its length.
    pub async fn open(&self, key: &str) -> StoreResult<(File, u64)> {
        Self::ensure_key_safe(key)?;
        let path = self.object_path(key);
        let file = File::open(&path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::Io(err)
            }
        })?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    async fn write_atomic(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        let file_path = self.object_path(key);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StoreError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let (tmp_path, file) = create_temp_file(&parent).await?;

        if let Err(err) = write_synced(file, data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StoreError::Io(err));
            }
        }
        Ok(())
    }

    /// Remove empty shard directories up to (not including) the base path.
    async fn prune_empty_dirs(&self, start: &Path) {
        let stop = self.base_path.as_path();
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

/// Create a uniquely named temp file inside `parent`.
///
/// A concurrent delete may prune `parent` between `create_dir_all` and the
/// create call; in that case the directory is recreated once.
async fn create_temp_file(parent: &Path) -> io::Result<(PathBuf, File)> {
    let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
    match File::create(&tmp_path).await {
        Ok(file) => Ok((tmp_path, file)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("shard directory {} vanished, recreating", parent.display());
            fs::create_dir_all(parent).await?;
            let file = File::create(&tmp_path).await?;
            Ok((tmp_path, file))
        }
        Err(err) => Err(err),
    }
}

async fn write_synced(mut file: File, data: &[u8]) -> io::Result<()> {
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

#[async_trait]
impl StorageAdapter for LocalDiskStore {
    async fn upload(
        &self,
        data: Bytes,
        name: &str,
        content_type: &str,
        path_prefix: Option<&str>,
    ) -> StoreResult<StoredAsset> {
        let key = object_key(name, path_prefix);
        Self::ensure_key_safe(&key)?;

        self.write_atomic(&key, &data).await?;
        let etag = format!("{:x}", md5::compute(&data));
        debug!(
            key = %key,
            content_type = %content_type,
            size = data.len(),
            "object written"
        );

        Ok(StoredAsset {
            url: self.url_for(&key),
            key,
            size_bytes: data.len() as u64,
            etag: Some(etag),
        })
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        Self::ensure_key_safe(key)?;
        let file_path = self.object_path(key);
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed physical file {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()));
            }
            Err(err) => return Err(StoreError::Io(err)),
        }

        if let Some(parent) = file_path.parent() {
            self.prune_empty_dirs(parent).await;
        }
        Ok(())
    }
}
