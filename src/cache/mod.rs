//! Derivative cache
//!
//! One flat directory holds local mirrors of remote originals and
//! transformed derivatives. Nothing here enforces a size limit; see
//! [`crate::janitor`] for that.

pub mod entry;
pub mod pipeline;

pub use entry::{CacheEntry, CacheKey};
pub use pipeline::MediaOnTheFly;

use serde::Serialize;
use std::path::PathBuf;

/// How the caller intends to hand the file over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Stream inline, then delete
    Output,
    /// Stream as an attachment, then delete
    Download,
    /// Only make sure the artifact exists
    Cache,
}

impl DeliveryMode {
    pub fn disposition(&self) -> Disposition {
        match self {
            DeliveryMode::Download => Disposition::Attachment,
            DeliveryMode::Output | DeliveryMode::Cache => Disposition::Inline,
        }
    }

    pub fn deletes_after_send(&self) -> bool {
        !matches!(self, DeliveryMode::Cache)
    }
}

impl std::str::FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "output" => Ok(DeliveryMode::Output),
            "download" => Ok(DeliveryMode::Download),
            "cache" => Ok(DeliveryMode::Cache),
            _ => Err(format!("unknown delivery mode: {}", s)),
        }
    }
}

/// Content-Disposition implied by a delivery mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Inline,
    Attachment,
}

/// A file ready to be streamed to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServedFile {
    pub path: PathBuf,
    /// Name to suggest to the client
    pub file_name: String,
    /// Whether the file may be removed once it has been sent
    pub delete_after_send: bool,
    pub disposition: Disposition,
}
