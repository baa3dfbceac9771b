//! Origin resolution
//!
//! Guarantees a byte-complete local file for an asset before anything
//! decodes it. Local assets are used in place; remote assets are mirrored
//! once into the cache directory as `<uuid>.<ext>` and reused afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::asset::AssetDescriptor;
use crate::cache::entry::{CacheEntry, CacheKey};
use crate::error::MediaError;
use crate::storage::RemoteStorage;

pub struct OriginResolver {
    cache_dir: PathBuf,
    local_root: PathBuf,
    remote: Arc<dyn RemoteStorage>,
}

impl OriginResolver {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        local_root: impl Into<PathBuf>,
        remote: Arc<dyn RemoteStorage>,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            local_root: local_root.into(),
            remote,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the original of a local asset lives
    pub fn local_path(&self, asset: &AssetDescriptor) -> PathBuf {
        self.local_root.join(&asset.relative_path)
    }

    /// Where the mirror of a remote asset lives
    pub fn mirror_path(&self, asset: &AssetDescriptor) -> PathBuf {
        CacheKey::mirror(asset).path_in(&self.cache_dir)
    }

    /// Return a local path holding the asset's complete original bytes
    pub async fn resolve(&self, asset: &AssetDescriptor) -> Result<PathBuf, MediaError> {
        if asset.is_local() {
            let path = self.local_path(asset);
            return match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => Ok(path),
                Ok(_) => Err(MediaError::retrieval(
                    asset.id,
                    format!("{} is not a regular file", path.display()),
                )),
                Err(e) => Err(MediaError::retrieval(
                    asset.id,
                    format!("{}: {}", path.display(), e),
                )),
            };
        }

        self.ensure_mirror(asset).await
    }

    async fn ensure_mirror(&self, asset: &AssetDescriptor) -> Result<PathBuf, MediaError> {
        let path = self.mirror_path(asset);
        if CacheEntry::probe(&path).await.is_some() {
            tracing::debug!(uuid = %asset.uuid, path = %path.display(), "Reusing local mirror");
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;

        tracing::info!(
            asset_id = asset.id,
            uuid = %asset.uuid,
            path = %path.display(),
            "Mirroring remote original"
        );

        if let Err(e) = self.remote.copy_to_local(asset, &path).await {
            discard(&path).await;
            return Err(MediaError::from_storage(asset.id, e));
        }

        // Trust the file on disk, not the backend's byte count
        let size = tokio::fs::metadata(&path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            discard(&path).await;
            return Err(MediaError::retrieval(
                asset.id,
                "Unable to retrieve the file (size=0)",
            ));
        }

        Ok(path)
    }
}

/// Remove a partial mirror, logging instead of failing
async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::warn!(path = %path.display(), "Removed partial mirror");
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial mirror");
        }
    }
}
