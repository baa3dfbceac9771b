//! Derivative generation
//!
//! `MediaOnTheFly` answers "give me this asset with these parameters" with a
//! servable file. Hits are served from the cache directory; misses resolve
//! the origin, transform it on a blocking thread and publish the result
//! with a temp-file-then-rename write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::entry::{artifact_name, remove_if_empty, CacheEntry, CacheKey};
use super::{DeliveryMode, ServedFile};
use crate::asset::AssetDescriptor;
use crate::config::MediaConfig;
use crate::error::MediaError;
use crate::origin::OriginResolver;
use crate::storage::RemoteStorage;
use crate::transform::{apply_operations, ImageError, TransformLimits, TransformationSpec};

pub struct MediaOnTheFly {
    cache_dir: PathBuf,
    origin: OriginResolver,
    /// Preset options, merged over the request parameters
    options: HashMap<String, String>,
    limits: TransformLimits,
}

impl MediaOnTheFly {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        local_root: impl Into<PathBuf>,
        remote: Arc<dyn RemoteStorage>,
    ) -> Self {
        let cache_dir = cache_dir.into();
        Self {
            origin: OriginResolver::new(cache_dir.clone(), local_root, remote),
            cache_dir,
            options: HashMap::new(),
            limits: TransformLimits::default(),
        }
    }

    pub fn from_config(config: &MediaConfig, remote: Arc<dyn RemoteStorage>) -> Self {
        Self::new(config.cache_dir(), config.local_root.clone(), remote).with_limits(config.limits)
    }

    /// Size limits for requested dimensions and decoded sources
    pub fn with_limits(mut self, limits: TransformLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Attach preset options. On a key collision the preset wins.
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options = options;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn origin(&self) -> &OriginResolver {
        &self.origin
    }

    /// Merge presets over `params` and normalize the result
    pub fn normalize(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<TransformationSpec, MediaError> {
        let mut merged = params.clone();
        merged.extend(self.options.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(TransformationSpec::normalize_within(&merged, &self.limits)?)
    }

    /// Resolve a request to a servable file
    ///
    /// Validation happens before any filesystem access.
    pub async fn resolve(
        &self,
        asset: &AssetDescriptor,
        params: &HashMap<String, String>,
        mode: DeliveryMode,
    ) -> Result<ServedFile, MediaError> {
        let spec = self.normalize(params)?;
        self.resolve_spec(asset, &spec, mode).await
    }

    /// Resolve an already normalized transformation
    pub async fn resolve_spec(
        &self,
        asset: &AssetDescriptor,
        spec: &TransformationSpec,
        mode: DeliveryMode,
    ) -> Result<ServedFile, MediaError> {
        if spec.is_empty() {
            let path = self.origin.resolve(asset).await?;
            // A local original is the source of truth, never disposable
            let delete_after_send = !asset.is_local() && mode.deletes_after_send();
            return Ok(ServedFile {
                path,
                file_name: asset.file_name.clone(),
                delete_after_send,
                disposition: mode.disposition(),
            });
        }

        let key = CacheKey::derivative(asset, spec);
        let path = key.path_in(&self.cache_dir);

        match CacheEntry::probe(&path).await {
            Some(entry) => {
                tracing::debug!(
                    uuid = %asset.uuid,
                    cache_key = %key,
                    size = entry.size_bytes,
                    "Derivative cache hit"
                );
            }
            None => self.generate(asset, spec, &key).await?,
        }

        let file_name = artifact_name(
            asset.file_stem(),
            &spec.suffix(),
            &spec.output_extension(&asset.extension),
        );

        Ok(ServedFile {
            path,
            file_name,
            delete_after_send: mode.deletes_after_send(),
            disposition: mode.disposition(),
        })
    }

    async fn generate(
        &self,
        asset: &AssetDescriptor,
        spec: &TransformationSpec,
        key: &CacheKey,
    ) -> Result<(), MediaError> {
        let origin = self.origin.resolve(asset).await?;
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let target = key.path_in(&self.cache_dir);
        let result = self.transform_into(&origin, spec, key, &target).await;

        if let Err(ref e) = result {
            // A leftover empty file at the key would be served as garbage
            match remove_if_empty(&target).await {
                Ok(true) => {
                    tracing::warn!(cache_key = %key, error = %e, "Removed empty derivative")
                }
                Ok(false) => {}
                Err(io) => {
                    tracing::warn!(cache_key = %key, error = %io, "Failed to clean up derivative")
                }
            }
        }

        result
    }

    async fn transform_into(
        &self,
        origin: &Path,
        spec: &TransformationSpec,
        key: &CacheKey,
        target: &Path,
    ) -> Result<(), MediaError> {
        let source = tokio::fs::read(origin).await?;
        let operations = spec.operations().to_vec();
        let limits = self.limits;

        let processed =
            tokio::task::spawn_blocking(move || apply_operations(&source, &operations, &limits))
                .await
                .map_err(|e| ImageError::task_failed(e.to_string()))??;

        let temp = self
            .cache_dir
            .join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4()));

        if let Err(e) = write_then_rename(&temp, target, &processed.data).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %temp.display(), error = %cleanup, "Failed to remove temp file");
                }
            } else {
                tracing::warn!(path = %temp.display(), "Removed partial derivative");
            }
            // A failed publish is a transformation failure
            return Err(ImageError::encode_failed(
                processed.format.as_str(),
                format!("failed to write derivative: {}", e),
            )
            .into());
        }

        tracing::info!(
            cache_key = %key,
            format = %processed.format,
            content_type = processed.content_type,
            width = processed.output_size.0,
            height = processed.output_size.1,
            size = processed.data.len(),
            "Generated derivative"
        );

        Ok(())
    }
}

/// Write `data` next to `target` and rename it into place
async fn write_then_rename(temp: &Path, target: &Path, data: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(temp, data).await?;
    tokio::fs::rename(temp, target).await
}
