//! Remote storage capability
//!
//! The cache never talks to object storage directly. Callers hand it a
//! [`RemoteStorage`] that knows how to copy an asset's bytes to a local path.

mod error;
mod fs_backend;
mod memory_backend;

pub use error::StorageError;
pub use fs_backend::FsStorage;
pub use memory_backend::InMemoryStorage;

use async_trait::async_trait;
use std::path::Path;

use crate::asset::AssetDescriptor;

/// Fetches original bytes of remote assets
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Copy the asset's bytes into `dest`, returning the number of bytes written
    ///
    /// `dest` is created or truncated. A short or empty copy is not an error
    /// at this level; the caller checks the returned size.
    async fn copy_to_local(&self, asset: &AssetDescriptor, dest: &Path)
        -> Result<u64, StorageError>;
}
