// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::MediaError;
use crate::logging::LoggingConfig;
use crate::transform::TransformLimits;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub janitor: JanitorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where derivatives and originals live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaConfig {
    /// Flat directory shared by mirrors and derivatives
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Root that local-backend asset paths are relative to
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
    /// `max_width`, `max_height` and `max_source_pixels`
    #[serde(flatten)]
    pub limits: TransformLimits,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            local_root: default_local_root(),
            limits: TransformLimits::default(),
        }
    }
}

impl MediaConfig {
    /// Cache directory with trailing separators removed
    pub fn cache_dir(&self) -> PathBuf {
        let trimmed = self.cache_dir.trim_end_matches(['/', '\\']);
        if trimmed.is_empty() {
            // "/" stays the root rather than becoming relative
            PathBuf::from(&self.cache_dir)
        } else {
            PathBuf::from(trimmed)
        }
    }
}

fn default_cache_dir() -> String {
    "storage/media-library/cache".to_string()
}

fn default_local_root() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct JanitorConfig {
    /// Skip failed deletions instead of aborting the run
    #[serde(default)]
    pub continue_on_error: bool,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document means "all defaults"
        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Read, parse and validate a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MediaError> {
        let config = Self::from_file(path).map_err(MediaError::Config)?;
        config.validate().map_err(MediaError::Config)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.media.cache_dir.trim().is_empty() {
            return Err("media.cache_dir cannot be empty".to_string());
        }

        self.media
            .limits
            .validate()
            .map_err(|e| format!("media.{}", e))?;

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            ));
        }

        Ok(())
    }
}
