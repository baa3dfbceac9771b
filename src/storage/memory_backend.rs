//! In-memory remote storage (tests, benches, local development)

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::error::StorageError;
use super::RemoteStorage;
use crate::asset::AssetDescriptor;

/// Remote storage that keeps objects in a HashMap keyed by relative path
///
/// Counts every fetch so callers can assert that mirrors are reused.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
    fetch_count: Arc<RwLock<usize>>,
    /// Simulate an unreachable backend if true
    simulate_unavailable: Arc<RwLock<bool>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, relative_path: impl Into<String>, data: impl Into<Bytes>) {
        self.objects.write().insert(relative_path.into(), data.into());
    }

    /// Number of `copy_to_local` calls so far, successful or not
    pub fn fetch_count(&self) -> usize {
        *self.fetch_count.read()
    }

    pub fn set_unavailable(&self, enabled: bool) {
        *self.simulate_unavailable.write() = enabled;
    }
}

#[async_trait]
impl RemoteStorage for InMemoryStorage {
    async fn copy_to_local(
        &self,
        asset: &AssetDescriptor,
        dest: &Path,
    ) -> Result<u64, StorageError> {
        *self.fetch_count.write() += 1;

        if *self.simulate_unavailable.read() {
            return Err(StorageError::Backend("Simulated backend outage".to_string()));
        }

        let data = self
            .objects
            .read()
            .get(&asset.relative_path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(asset.relative_path.clone()))?;

        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }
}
