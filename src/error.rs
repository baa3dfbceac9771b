//! Crate-wide error taxonomy
//!
//! Four failure kinds cross the public surface: a rejected transformation
//! request, a failed origin fetch, a failed transformation and a failed
//! eviction. Plain filesystem and configuration failures get their own
//! variants so callers never have to guess.

use std::path::PathBuf;

use thiserror::Error;

use crate::janitor::EvictionReport;
use crate::storage::StorageError;
use crate::transform::ImageError;

#[derive(Debug, Error)]
pub enum MediaError {
    /// Malformed or disallowed transformation parameters
    #[error("Invalid parameter '{key}': {message}")]
    Validation { key: String, message: String },

    /// The origin could not be fetched from its storage backend
    #[error("Unable to retrieve media {asset_id}: {message}")]
    Retrieval {
        asset_id: u64,
        message: String,
        #[source]
        source: Option<StorageError>,
    },

    /// The image codec failed to decode or encode
    #[error("Transformation failed: {0}")]
    Pipeline(#[source] ImageError),

    /// A janitor deletion failed; `report` holds what happened up to that point
    #[error("Failed to evict {}: {source}", .path.display())]
    EvictionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        report: Box<EvictionReport>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ImageError> for MediaError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidParameter { param, message } => MediaError::Validation {
                key: param,
                message,
            },
            other => MediaError::Pipeline(other),
        }
    }
}

impl MediaError {
    pub fn retrieval(asset_id: u64, message: impl Into<String>) -> Self {
        MediaError::Retrieval {
            asset_id,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a storage backend failure with the asset it was fetching
    pub fn from_storage(asset_id: u64, err: StorageError) -> Self {
        MediaError::Retrieval {
            asset_id,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Maps errors to HTTP status codes for whoever serves the result
    ///
    /// - Validation → 400 (Bad Request)
    /// - Retrieval → 502 (Bad Gateway)
    /// - everything else → 500 (Internal Server Error)
    pub fn to_http_status(&self) -> u16 {
        match self {
            MediaError::Validation { .. } => 400,
            MediaError::Retrieval { .. } => 502,
            MediaError::Pipeline(_)
            | MediaError::EvictionIo { .. }
            | MediaError::Io(_)
            | MediaError::Config(_) => 500,
        }
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, MediaError::Retrieval { .. } | MediaError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, MediaError>;
