//! Cache key and entry types
//!
//! - `CacheKey`: file name of a cache artifact inside the flat cache directory
//! - `CacheEntry`: an artifact found on disk, valid only when non-empty

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::asset::AssetDescriptor;
use crate::transform::TransformationSpec;

/// Name of a cache artifact, unique for `(uuid, canonical parameters)`
///
/// Derivatives are `<uuid><suffix>.<ext>`, local mirrors of remote
/// originals are `<uuid>.<ext>`. Both live side by side in one directory.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key of the derivative produced by `spec`
    pub fn derivative(asset: &AssetDescriptor, spec: &TransformationSpec) -> Self {
        Self::compose(
            &asset.uuid,
            &spec.suffix(),
            &spec.output_extension(&asset.extension),
        )
    }

    /// Key of the untransformed local mirror of a remote original
    pub fn mirror(asset: &AssetDescriptor) -> Self {
        Self::compose(&asset.uuid, "", &asset.normalized_extension())
    }

    fn compose(uuid: &str, suffix: &str, extension: &str) -> Self {
        CacheKey(artifact_name(uuid, suffix, extension))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location of this key inside `cache_dir`
    pub fn path_in(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(&self.0)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `<stem><suffix>.<extension>`, without the dot when there is no extension
pub(crate) fn artifact_name(stem: &str, suffix: &str, extension: &str) -> String {
    if extension.is_empty() {
        format!("{}{}", stem, suffix)
    } else {
        format!("{}{}.{}", stem, suffix, extension)
    }
}

/// A cache artifact on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

impl CacheEntry {
    /// Look up a valid entry at `path`
    ///
    /// Returns `None` when the file is missing, not a regular file,
    /// unreadable or empty. Empty files are leftovers of failed writes and
    /// count as absent.
    pub async fn probe(path: &Path) -> Option<CacheEntry> {
        let file = tokio::fs::File::open(path).await.ok()?;
        let metadata = file.metadata().await.ok()?;
        if !metadata.is_file() || metadata.len() == 0 {
            return None;
        }
        Some(CacheEntry {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }
}

/// Remove `path` if it is an empty file. Missing files are fine.
pub(crate) async fn remove_if_empty(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() && metadata.len() == 0 => {
            tokio::fs::remove_file(path).await?;
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
