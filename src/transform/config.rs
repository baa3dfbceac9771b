use serde::{Deserialize, Serialize};

use super::error::ImageError;

/// Largest value accepted for `max_width` / `max_height`
///
/// Keeps a full RGBA buffer of the biggest allowed output under `u32::MAX` bytes.
pub const MAX_DIMENSION_LIMIT: u32 = 16384;

/// Size limits applied to requests and decoded sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformLimits {
    /// Maximum allowed width for resized images (to prevent abuse)
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Maximum allowed height for resized images
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Maximum allowed total pixels (width * height) of a decoded source
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,
}

impl Default for TransformLimits {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            max_source_pixels: default_max_source_pixels(),
        }
    }
}

fn default_max_width() -> u32 {
    4096
}

fn default_max_height() -> u32 {
    4096
}

fn default_max_source_pixels() -> u64 {
    100_000_000 // 100 megapixels
}

impl TransformLimits {
    pub fn check_width(&self, width: u32) -> Result<(), ImageError> {
        if width > self.max_width {
            return Err(ImageError::invalid_param(
                "width",
                format!("{} exceeds the maximum of {}", width, self.max_width),
            ));
        }
        Ok(())
    }

    pub fn check_height(&self, height: u32) -> Result<(), ImageError> {
        if height > self.max_height {
            return Err(ImageError::invalid_param(
                "height",
                format!("{} exceeds the maximum of {}", height, self.max_height),
            ));
        }
        Ok(())
    }

    /// Reject an output size before any buffer for it is allocated
    pub fn check_output(&self, width: u32, height: u32) -> Result<(), ImageError> {
        self.check_width(width)?;
        self.check_height(height)
    }

    /// Reject sources whose decoded pixels would not fit the budget
    ///
    /// Called with the header dimensions, before the pixels are decoded.
    pub fn check_source(&self, width: u32, height: u32) -> Result<(), ImageError> {
        let pixels = width as u64 * height as u64;
        if pixels > self.max_source_pixels {
            return Err(ImageError::image_bomb(
                width,
                height,
                self.max_source_pixels,
            ));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [("max_width", self.max_width), ("max_height", self.max_height)] {
            if value == 0 || value > MAX_DIMENSION_LIMIT {
                return Err(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_DIMENSION_LIMIT, value
                ));
            }
        }
        if self.max_source_pixels == 0 {
            return Err("max_source_pixels must be at least 1".to_string());
        }
        Ok(())
    }
}
