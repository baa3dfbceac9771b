//! Remote storage backed by a directory (mounted bucket, NFS share)

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::StorageError;
use super::RemoteStorage;
use crate::asset::AssetDescriptor;

/// Reads assets from `root/<relative_path>` with tokio::fs
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl RemoteStorage for FsStorage {
    async fn copy_to_local(
        &self,
        asset: &AssetDescriptor,
        dest: &Path,
    ) -> Result<u64, StorageError> {
        let source = self.root.join(&asset.relative_path);
        match tokio::fs::copy(&source, dest).await {
            Ok(written) => Ok(written),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(asset.relative_path.clone()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
