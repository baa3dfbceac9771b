//! Transformation error types
//!
//! Covers both rejected transformation parameters and failures while
//! decoding, resizing or encoding an image. Parameter errors carry the
//! offending key so callers can report it back to whoever supplied it.

use std::fmt;

/// Errors that can occur while normalizing or applying a transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    // === Parameter Errors ===
    /// A raw transformation parameter failed validation
    InvalidParameter { param: String, message: String },

    // === Decoding Errors ===
    /// Source dimensions exceed the decode budget
    ImageBombDetected {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },
    /// Source format is not one we can transform
    UnsupportedFormat { format: String },
    /// Failed to decode image data
    DecodeFailed { message: String },

    // === Processing Errors ===
    /// Resize or crop failed
    ResizeFailed { message: String },
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },
    /// The blocking codec task died before returning a result
    TaskFailed { message: String },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::InvalidParameter { param, message } => {
                write!(f, "Invalid parameter '{}': {}", param, message)
            }
            ImageError::ImageBombDetected {
                width,
                height,
                pixels,
                max_pixels,
            } => {
                write!(
                    f,
                    "Image dimensions {}x{} ({} pixels) exceed maximum {} pixels",
                    width, height, pixels, max_pixels
                )
            }
            ImageError::UnsupportedFormat { format } => {
                write!(f, "Unsupported image format: {}", format)
            }
            ImageError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            ImageError::ResizeFailed { message } => {
                write!(f, "Resize failed: {}", message)
            }
            ImageError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
            ImageError::TaskFailed { message } => {
                write!(f, "Transformation task failed: {}", message)
            }
        }
    }
}

impl std::error::Error for ImageError {}

impl ImageError {
    /// Maps transformation errors to HTTP status codes
    ///
    /// Status mapping:
    /// - InvalidParameter, ImageBombDetected → 400 (Bad Request)
    /// - UnsupportedFormat → 415 (Unsupported Media Type)
    /// - everything else → 500 (Internal Server Error)
    pub fn to_http_status(&self) -> u16 {
        match self {
            ImageError::InvalidParameter { .. } | ImageError::ImageBombDetected { .. } => 400,
            ImageError::UnsupportedFormat { .. } => 415,
            ImageError::DecodeFailed { .. }
            | ImageError::ResizeFailed { .. }
            | ImageError::EncodeFailed { .. }
            | ImageError::TaskFailed { .. } => 500,
        }
    }

    /// Helper constructors for common error patterns
    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn image_bomb(width: u32, height: u32, max_pixels: u64) -> Self {
        ImageError::ImageBombDetected {
            width,
            height,
            pixels: width as u64 * height as u64,
            max_pixels,
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        ImageError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn task_failed(message: impl Into<String>) -> Self {
        ImageError::TaskFailed {
            message: message.into(),
        }
    }
}
