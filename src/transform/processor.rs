//! Image processing implementation
//!
//! Handles the actual transformation: decode → apply operations → encode.
//! Everything here is CPU bound and synchronous; async callers run it on a
//! blocking thread.

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::io::Cursor;
use std::num::NonZeroU32;

use super::config::TransformLimits;
use super::encoder::{EncoderFactory, EncoderQuality};
use super::error::ImageError;
use super::params::{FitMode, Operation, OutputFormat};

/// Result of image processing
#[derive(Debug)]
pub struct ProcessedImage {
    /// The encoded derivative
    pub data: Vec<u8>,
    pub format: OutputFormat,
    /// Content-Type of `data`
    pub content_type: &'static str,
    /// Original dimensions (width, height)
    pub original_size: (u32, u32),
    /// Output dimensions (width, height)
    pub output_size: (u32, u32),
}

/// Encoding choices collected while walking the operation list
struct OutputSettings {
    format: OutputFormat,
    quality: Option<u8>,
    optimize: bool,
}

/// Apply an ordered operation list to encoded source bytes
///
/// Geometry operations run in list order. Format, quality and optimize only
/// shape the final encode. Without a format override the source's own format
/// is kept. Sources above `limits.max_source_pixels` are refused before
/// decoding, and no resize target may exceed the output limits.
pub fn apply_operations(
    data: &[u8],
    operations: &[Operation],
    limits: &TransformLimits,
) -> Result<ProcessedImage, ImageError> {
    let source_format = detect_format(data)?;
    let mut img = decode_image(data, limits)?;
    let original_size = (img.width(), img.height());

    let mut output = OutputSettings {
        format: source_format,
        quality: None,
        optimize: false,
    };

    for op in operations {
        match *op {
            Operation::Fit {
                mode,
                width,
                height,
            } => {
                // Both modes stay inside the box
                limits.check_output(width, height)?;
                img = fit_image(&img, mode, width, height)?;
            }
            Operation::Width { value } => {
                let (w, h) = scale_to_width(img.width(), img.height(), value);
                limits.check_output(w, h)?;
                img = resize_image(&img, w, h)?;
            }
            Operation::Height { value } => {
                let (w, h) = scale_to_height(img.width(), img.height(), value);
                limits.check_output(w, h)?;
                img = resize_image(&img, w, h)?;
            }
            Operation::Format { value } => output.format = value,
            Operation::Quality { value } => output.quality = Some(value),
            Operation::Optimize => output.optimize = true,
        }
    }

    let quality = EncoderQuality::resolve(output.format, output.quality, output.optimize);
    let encoder = EncoderFactory::create(output.format);

    let output_size = (img.width(), img.height());
    let rgba_data = img.to_rgba8().into_raw();
    let encoded = encoder.encode(&rgba_data, output_size.0, output_size.1, quality)?;

    Ok(ProcessedImage {
        data: encoded.data,
        format: encoded.format,
        content_type: encoded.content_type,
        original_size,
        output_size,
    })
}

/// Decode image data into a DynamicImage, checking the header size first
fn decode_image(data: &[u8], limits: &TransformLimits) -> Result<DynamicImage, ImageError> {
    let (width, height) = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;
    limits.check_source(width, height)?;

    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))
}

/// Detect the encoding of the source bytes
pub fn detect_format(data: &[u8]) -> Result<OutputFormat, ImageError> {
    let format =
        image::guess_format(data).map_err(|e| ImageError::decode_failed(e.to_string()))?;
    match format {
        image::ImageFormat::Png => Ok(OutputFormat::Png),
        image::ImageFormat::Jpeg => Ok(OutputFormat::Jpeg),
        image::ImageFormat::WebP => Ok(OutputFormat::WebP),
        image::ImageFormat::Gif => Ok(OutputFormat::Gif),
        other => Err(ImageError::unsupported_format(format!("{:?}", other))),
    }
}

/// Output never exceeds `width` x `height`
fn fit_image(
    img: &DynamicImage,
    mode: FitMode,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ImageError> {
    let (src_w, src_h) = (img.width(), img.height());
    match mode {
        FitMode::Max => {
            let (w, h) = fit_within(src_w, src_h, width, height);
            if (w, h) == (src_w, src_h) {
                Ok(img.clone())
            } else {
                resize_image(img, w, h)
            }
        }
        FitMode::Crop => {
            // Cut the box's aspect ratio out of the source, then scale it
            let (w, h) = crop_region(src_w, src_h, width, height);
            let region = img.crop_imm((src_w - w) / 2, (src_h - h) / 2, w, h);
            if (w, h) == (width, height) {
                Ok(region)
            } else {
                resize_image(&region, width, height)
            }
        }
    }
}

/// Largest size inside the box with the source aspect ratio, never upscaled
fn fit_within(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    if src_w <= box_w && src_h <= box_h {
        return (src_w, src_h);
    }
    if wider_than_box(src_w, src_h, box_w, box_h) {
        (box_w, div_round(src_h, box_w, src_w).clamp(1, box_h))
    } else {
        (div_round(src_w, box_h, src_h).clamp(1, box_w), box_h)
    }
}

/// Largest centered region of the source with the box's aspect ratio
fn crop_region(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    if wider_than_box(src_w, src_h, box_w, box_h) {
        (div_round(src_h, box_w, box_h).clamp(1, src_w), src_h)
    } else {
        (src_w, div_round(src_w, box_h, box_w).clamp(1, src_h))
    }
}

fn scale_to_width(src_w: u32, src_h: u32, width: u32) -> (u32, u32) {
    (width, div_round(src_h, width, src_w).max(1))
}

fn scale_to_height(src_w: u32, src_h: u32, height: u32) -> (u32, u32) {
    (div_round(src_w, height, src_h).max(1), height)
}

fn wider_than_box(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> bool {
    src_w as u64 * box_h as u64 >= src_h as u64 * box_w as u64
}

/// `a * b / c` rounded to nearest
fn div_round(a: u32, b: u32, c: u32) -> u32 {
    let (a, b, c) = (a as u64, b as u64, c as u64);
    ((2 * a * b + c) / (2 * c)).min(u32::MAX as u64) as u32
}

/// Resize image using fast-image-resize with Lanczos3 filter
fn resize_image(img: &DynamicImage, target_w: u32, target_h: u32) -> Result<DynamicImage, ImageError> {
    let src_width =
        NonZeroU32::new(img.width()).ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::resize_failed("Target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    let rgba_image = image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}
