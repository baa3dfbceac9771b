//! Asset descriptors
//!
//! An asset is a stored original file owned by the surrounding application.
//! The cache only ever reads these descriptors; it never mutates them.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the original bytes of an asset live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Already on the local filesystem, usable as-is
    Local,
    /// On remote object storage, must be mirrored before transformation
    Remote,
}

/// Read-only view of an asset's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub id: u64,
    /// Stable, globally unique identifier used as the cache key root
    pub uuid: String,
    pub storage: StorageKind,
    /// Path of the original relative to its storage root
    pub relative_path: String,
    pub file_name: String,
    pub extension: String,
    pub size_bytes: u64,
}

impl AssetDescriptor {
    pub fn is_local(&self) -> bool {
        self.storage == StorageKind::Local
    }

    /// Lowercased extension of the original file
    pub fn normalized_extension(&self) -> String {
        self.extension.to_lowercase()
    }

    /// File name without its extension (`photo.JPG` -> `photo`)
    pub fn file_stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }
}
