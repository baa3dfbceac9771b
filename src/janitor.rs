//! Cache eviction
//!
//! The janitor runs out of band against the cache directory. It lists every
//! regular file (dot files included, no recursion), orders them newest
//! first by modification time and keeps the longest prefix whose total size
//! fits the budget. Everything after that prefix is deleted.
//!
//! Only metadata is read. Sorting is the one O(n log n) step.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::MediaError;
use crate::resources::peak_memory_bytes;

const GIGABYTE: u64 = 1024 * 1024 * 1024;

const BYTE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Convert a budget in whole gigabytes to bytes
pub fn budget_from_gigabytes(gigabytes: u64) -> u64 {
    gigabytes.saturating_mul(GIGABYTE)
}

/// Human-readable size with base-1024 units and two decimals
///
/// `0` gives `0.00 B`, `1536` gives `1.50 KB`.
pub fn format_bytes(bytes: u64) -> String {
    let mut exponent = 0;
    while exponent < BYTE_UNITS.len() - 1 && bytes >= 1024u64.pow(exponent as u32 + 1) {
        exponent += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    format!("{:.2} {}", value, BYTE_UNITS[exponent])
}

/// A file found in the cache directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

/// Outcome of a janitor run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvictionReport {
    /// Size of every file scanned, deleted ones included
    pub total_bytes: u64,
    pub budget_bytes: u64,
    pub files_scanned: usize,
    /// Files actually removed (or that would be, in a dry run)
    pub files_deleted: usize,
    pub bytes_deleted: u64,
    /// Deletions that failed and were skipped in best-effort mode
    pub failed_deletions: usize,
    pub dry_run: bool,
    pub peak_memory_bytes: Option<u64>,
}

impl EvictionReport {
    pub fn new(budget_bytes: u64) -> Self {
        Self {
            budget_bytes,
            ..Default::default()
        }
    }

    /// Operator-facing summary, one fact per line
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Total size: {}\nSize allowed: {}\nFiles deleted: {}\n",
            format_bytes(self.total_bytes),
            format_bytes(self.budget_bytes),
            self.files_deleted
        );
        if self.failed_deletions > 0 {
            out.push_str(&format!("Failed deletions: {}\n", self.failed_deletions));
        }
        if let Some(peak) = self.peak_memory_bytes {
            out.push_str(&format!("Peak memory: {}\n", format_bytes(peak)));
        }
        out
    }
}

/// Number of leading files (newest first) that fit in `budget_bytes`
///
/// The first file that pushes the running total over the budget and every
/// older file after it are to be evicted.
pub fn kept_prefix_len(files: &[ScannedFile], budget_bytes: u64) -> usize {
    let mut total: u64 = 0;
    for (index, file) in files.iter().enumerate() {
        total = total.saturating_add(file.size_bytes);
        if total > budget_bytes {
            return index;
        }
    }
    files.len()
}

/// Byte-budget enforcement for one cache directory
#[derive(Debug, Clone)]
pub struct Janitor {
    cache_dir: PathBuf,
    budget_bytes: u64,
    dry_run: bool,
    continue_on_error: bool,
}

impl Janitor {
    pub fn new(cache_dir: impl Into<PathBuf>, budget_bytes: u64) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            budget_bytes,
            dry_run: false,
            continue_on_error: false,
        }
    }

    /// Report what would be deleted without touching anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Skip failed deletions instead of aborting the run
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// List regular files in the cache directory, newest first
    ///
    /// Files with equal modification times keep their listing order.
    /// A missing directory is an empty cache.
    pub async fn scan(&self) -> std::io::Result<Vec<ScannedFile>> {
        let mut dir = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(cache_dir = %self.cache_dir.display(), "Cache directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    // Removed between listing and stat
                    tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            files.push(ScannedFile {
                path,
                size_bytes: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(files)
    }

    /// Scan the cache directory and evict
    pub async fn run(&self) -> Result<EvictionReport, MediaError> {
        let files = self.scan().await?;
        self.evict(&files).await
    }

    /// Evict from a newest-first listing produced by [`Janitor::scan`]
    ///
    /// By default the first failed deletion aborts the run with
    /// [`MediaError::EvictionIo`], carrying the report up to that point.
    pub async fn evict(&self, files: &[ScannedFile]) -> Result<EvictionReport, MediaError> {
        let mut report = EvictionReport::new(self.budget_bytes);
        report.dry_run = self.dry_run;
        report.files_scanned = files.len();
        report.total_bytes = files
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(f.size_bytes));

        let keep = kept_prefix_len(files, self.budget_bytes);

        for file in &files[keep..] {
            if self.dry_run {
                tracing::debug!(path = %file.path.display(), size = file.size_bytes, "Would evict");
                report.files_deleted += 1;
                report.bytes_deleted += file.size_bytes;
                continue;
            }

            match tokio::fs::remove_file(&file.path).await {
                Ok(()) => {
                    tracing::debug!(path = %file.path.display(), size = file.size_bytes, "Evicted");
                    report.files_deleted += 1;
                    report.bytes_deleted += file.size_bytes;
                }
                Err(e) if self.continue_on_error => {
                    tracing::warn!(path = %file.path.display(), error = %e, "Failed to evict, continuing");
                    report.failed_deletions += 1;
                }
                Err(e) => {
                    report.peak_memory_bytes = peak_memory_bytes();
                    return Err(MediaError::EvictionIo {
                        path: file.path.clone(),
                        source: e,
                        report: Box::new(report),
                    });
                }
            }
        }

        report.peak_memory_bytes = peak_memory_bytes();

        tracing::info!(
            cache_dir = %self.cache_dir.display(),
            total_bytes = report.total_bytes,
            budget_bytes = report.budget_bytes,
            files_scanned = report.files_scanned,
            files_deleted = report.files_deleted,
            failed_deletions = report.failed_deletions,
            dry_run = report.dry_run,
            "Janitor run complete"
        );

        Ok(report)
    }
}
