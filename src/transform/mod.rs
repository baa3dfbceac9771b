//! Image transformation
//!
//! - `params`: validates raw parameters into a canonical [`TransformationSpec`]
//!   and derives its cache-key suffix
//! - `processor`: decodes, applies the operation list and re-encodes
//! - `encoder`: per-format encoders (JPEG, PNG with oxipng, WebP, GIF)
//! - `config`: output and source size limits

pub mod config;
pub mod encoder;
pub mod error;
pub mod params;
pub mod processor;

pub use config::TransformLimits;
pub use encoder::{EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder};
pub use error::ImageError;
pub use params::{FitMode, Operation, OutputFormat, TransformationSpec, SUFFIX_MARKER};
pub use processor::{apply_operations, detect_format, ProcessedImage};
