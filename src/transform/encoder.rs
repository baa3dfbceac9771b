//! Image encoder abstraction
//!
//! One encoder per output format, selected through [`EncoderFactory`].
//! Encoders take raw RGBA pixels so the processor does not care which
//! codec ends up writing the derivative.

use super::error::ImageError;
use super::params::OutputFormat;

/// Quality used when the caller does not ask for one
pub const DEFAULT_QUALITY: u8 = 90;

/// JPEG quality ceiling applied by `optimize` when no quality was requested
pub const OPTIMIZED_JPEG_QUALITY: u8 = 85;

/// WebP quality ceiling applied by `optimize` when no quality was requested
pub const OPTIMIZED_WEBP_QUALITY: u8 = 80;

/// oxipng preset used for lossless PNG optimization
const PNG_OPTIMIZE_PRESET: u8 = 2;

/// Quality settings for image encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    /// Quality value (1-100, where 100 is best quality)
    pub quality: u8,
    /// Run the lossless optimizer after encoding where one exists
    pub optimize: bool,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            optimize: false,
        }
    }
}

impl EncoderQuality {
    /// Create quality settings with specified quality level
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            optimize: false,
        }
    }

    pub fn optimized(mut self) -> Self {
        self.optimize = true;
        self
    }

    /// Settings for a format given what the transformation asked for
    ///
    /// An explicit quality always wins. Without one, `optimize` lowers lossy
    /// codecs to the optimizer's default quality.
    pub fn resolve(format: OutputFormat, requested: Option<u8>, optimize: bool) -> Self {
        let quality = match (requested, optimize, format) {
            (Some(q), _, _) => q,
            (None, true, OutputFormat::Jpeg) => OPTIMIZED_JPEG_QUALITY,
            (None, true, OutputFormat::WebP) => OPTIMIZED_WEBP_QUALITY,
            _ => DEFAULT_QUALITY,
        };
        let settings = Self::with_quality(quality);
        if optimize {
            settings.optimized()
        } else {
            settings
        }
    }
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// The output format
    pub format: OutputFormat,
    /// Content-Type header value
    pub content_type: &'static str,
}

impl EncodedImage {
    /// Create a new encoded image result
    pub fn new(data: Vec<u8>, format: OutputFormat) -> Self {
        let content_type = format.content_type();
        Self {
            data,
            format,
            content_type,
        }
    }
}

/// Trait for image encoders
///
/// The trait is object-safe so the factory can hand out boxed encoders.
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Encode raw RGBA image data (4 bytes per pixel) to the target format
    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError>;
}

/// JPEG encoder using the image crate
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
        use image::ImageEncoder as _;
        use std::io::Cursor;

        // JPEG has no alpha channel
        let rgb_data = rgba_to_rgb(data);

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, quality.quality);

        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8)
            .map_err(|e| ImageError::encode_failed("jpeg", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Jpeg))
    }
}

/// PNG encoder using the image crate, optionally recompressed with oxipng
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;
        use image::ImageEncoder as _;
        use std::io::Cursor;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImagePngEncoder::new(&mut output);

        encoder
            .write_image(data, width, height, image::ColorType::Rgba8)
            .map_err(|e| ImageError::encode_failed("png", e.to_string()))?;

        let mut png = output.into_inner();
        if quality.optimize {
            png = oxipng::optimize_from_memory(
                &png,
                &oxipng::Options::from_preset(PNG_OPTIMIZE_PRESET),
            )
            .map_err(|e| ImageError::encode_failed("png", e.to_string()))?;
        }

        Ok(EncodedImage::new(png, OutputFormat::Png))
    }
}

/// Lossy WebP encoder backed by libwebp
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        let encoder = webp::Encoder::from_rgba(data, width, height);
        let memory = encoder
            .encode_simple(false, quality.quality as f32)
            .map_err(|e| ImageError::encode_failed("webp", format!("{:?}", e)))?;

        Ok(EncodedImage::new(memory.to_vec(), OutputFormat::WebP))
    }
}

/// Single-frame GIF encoder using the image crate
pub struct GifEncoder;

impl ImageEncoder for GifEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Gif
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        use image::codecs::gif::GifEncoder as ImageGifEncoder;

        let mut output = Vec::new();
        {
            // The trailer is written when the encoder is dropped
            let mut encoder = ImageGifEncoder::new(&mut output);
            encoder
                .encode(data, width, height, image::ColorType::Rgba8)
                .map_err(|e| ImageError::encode_failed("gif", e.to_string()))?;
        }

        Ok(EncodedImage::new(output, OutputFormat::Gif))
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    /// Create an encoder for the specified output format
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::Gif => Box::new(GifEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
        }
    }
}

/// Convert RGBA to RGB by discarding alpha channel
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let pixel_count = rgba.len() / 4;
    let mut rgb = Vec::with_capacity(pixel_count * 3);

    for chunk in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }

    rgb
}
