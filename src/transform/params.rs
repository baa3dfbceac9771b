//! Transformation parameter normalization
//!
//! Turns a raw, query-string-like parameter map into a canonical
//! [`TransformationSpec`]: an ordered operation list plus a deterministic
//! cache-key suffix. Supported keys:
//!
//! | key | value |
//! |---|---|
//! | `width`, `height` | integer >= 1, both required when `crop` is set |
//! | `crop` | `1` / `true` |
//! | `format` | `webp` |
//! | `quality` | integer 1-100 |
//! | `optimize` | `1` / `true` |
//!
//! Unknown keys are ignored.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::config::TransformLimits;
use super::error::ImageError;

/// Marker prefixed to every non-empty suffix
pub const SUFFIX_MARKER: &str = "__";

/// Separator between suffix entries
const SUFFIX_SEPARATOR: char = '_';

/// Formats a caller may request through the `format` key
pub const ACCEPTED_FORMATS: &[OutputFormat] = &[OutputFormat::WebP];

/// Image encoding format, either requested or detected from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "gif" => Ok(OutputFormat::Gif),
            "webp" => Ok(OutputFormat::WebP),
            _ => Err(ImageError::invalid_param(
                "format",
                format!("unknown format: {}", s),
            )),
        }
    }
}

/// How a fit operation places the image inside the target box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Scale down to fit within the box, preserving aspect ratio
    Max,
    /// Scale to cover the box, then center-crop to exactly its size
    Crop,
}

impl FitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Crop => "crop",
        }
    }
}

/// A single canonical manipulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fit {
        mode: FitMode,
        width: u32,
        height: u32,
    },
    Width {
        value: u32,
    },
    Height {
        value: u32,
    },
    Format {
        value: OutputFormat,
    },
    Quality {
        value: u8,
    },
    Optimize,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Fit { .. } => "fit",
            Operation::Width { .. } => "width",
            Operation::Height { .. } => "height",
            Operation::Format { .. } => "format",
            Operation::Quality { .. } => "quality",
            Operation::Optimize => "optimize",
        }
    }

    /// Entries this operation contributes to the suffix. `None` marks a
    /// composite argument, which is encoded by its name letter only.
    fn suffix_entries(&self) -> Vec<(&'static str, Option<String>)> {
        match self {
            Operation::Fit {
                mode,
                width,
                height,
            } => vec![
                ("fit", Some(mode.as_str().to_string())),
                ("width", Some(width.to_string())),
                ("height", Some(height.to_string())),
            ],
            Operation::Width { value } => vec![("width", Some(value.to_string()))],
            Operation::Height { value } => vec![("height", Some(value.to_string()))],
            Operation::Format { value } => vec![("format", Some(value.as_str().to_string()))],
            Operation::Quality { value } => vec![("quality", Some(value.to_string()))],
            Operation::Optimize => vec![("optimize", None)],
        }
    }
}

/// Canonical, order-independent description of a requested transformation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformationSpec {
    operations: Vec<Operation>,
}

impl TransformationSpec {
    /// Validate and canonicalize a raw parameter map with default limits
    pub fn normalize(params: &HashMap<String, String>) -> Result<Self, ImageError> {
        Self::normalize_within(params, &TransformLimits::default())
    }

    /// Validate and canonicalize a raw parameter map
    ///
    /// A fit operation (when both dimensions are present) always comes first,
    /// the remaining operations follow sorted by name, so the result does not
    /// depend on the iteration order of `params`. Dimensions above `limits`
    /// are rejected.
    pub fn normalize_within(
        params: &HashMap<String, String>,
        limits: &TransformLimits,
    ) -> Result<Self, ImageError> {
        let width = params
            .get("width")
            .map(|v| parse_dimension("width", v))
            .transpose()?;
        let height = params
            .get("height")
            .map(|v| parse_dimension("height", v))
            .transpose()?;
        if let Some(width) = width {
            limits.check_width(width)?;
        }
        if let Some(height) = height {
            limits.check_height(height)?;
        }

        let crop = match params.get("crop") {
            Some(v) => parse_toggle("crop", v)?,
            None => false,
        };
        if crop {
            if width.is_none() {
                return Err(ImageError::invalid_param(
                    "width",
                    "is required when crop is set",
                ));
            }
            if height.is_none() {
                return Err(ImageError::invalid_param(
                    "height",
                    "is required when crop is set",
                ));
            }
        }

        let format = params
            .get("format")
            .map(|v| parse_format(v))
            .transpose()?;

        let quality = params
            .get("quality")
            .map(|v| parse_quality(v))
            .transpose()?;

        let optimize = match params.get("optimize") {
            Some(v) => parse_toggle("optimize", v)?,
            None => false,
        };

        let mut operations = Vec::new();
        let mut rest = Vec::new();

        match (width, height) {
            (Some(width), Some(height)) => {
                let mode = if crop { FitMode::Crop } else { FitMode::Max };
                operations.push(Operation::Fit {
                    mode,
                    width,
                    height,
                });
            }
            (Some(value), None) => rest.push(Operation::Width { value }),
            (None, Some(value)) => rest.push(Operation::Height { value }),
            (None, None) => {}
        }

        if let Some(value) = format {
            rest.push(Operation::Format { value });
        }
        if let Some(value) = quality {
            rest.push(Operation::Quality { value });
        }
        if optimize {
            rest.push(Operation::Optimize);
        }

        rest.sort_by_key(|op| op.name());
        operations.extend(rest);

        Ok(Self { operations })
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Explicit format override, if one was requested
    pub fn format_override(&self) -> Option<OutputFormat> {
        self.operations.iter().find_map(|op| match op {
            Operation::Format { value } => Some(*value),
            _ => None,
        })
    }

    /// Extension of the derivative: the format override, else the original's
    pub fn output_extension(&self, original_extension: &str) -> String {
        match self.format_override() {
            Some(format) => format.as_str().to_string(),
            None => original_extension.to_lowercase(),
        }
    }

    /// Deterministic cache-key suffix, empty when there are no operations
    ///
    /// Entries are sorted by name; each contributes its first letter, its
    /// trimmed value (nothing for composite values) and a separator.
    ///
    /// `{quality: 80}` gives `__q80`, `{width: 100, height: 50}` gives
    /// `__fmax_h50_w100`.
    pub fn suffix(&self) -> String {
        if self.operations.is_empty() {
            return String::new();
        }

        let entries: BTreeMap<&'static str, Option<String>> = self
            .operations
            .iter()
            .flat_map(|op| op.suffix_entries())
            .collect();

        let mut encoded = String::new();
        for (name, value) in &entries {
            if let Some(first) = name.chars().next() {
                encoded.push(first);
            }
            if let Some(value) = value {
                encoded.push_str(value.trim());
            }
            encoded.push(SUFFIX_SEPARATOR);
        }

        format!(
            "{}{}",
            SUFFIX_MARKER,
            encoded.trim_matches(SUFFIX_SEPARATOR)
        )
    }
}

fn parse_integer(key: &str, value: &str) -> Result<u64, ImageError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ImageError::invalid_param(key, "must be an integer"));
    }
    trimmed
        .parse()
        .map_err(|_| ImageError::invalid_param(key, "integer is out of range"))
}

fn parse_dimension(key: &str, value: &str) -> Result<u32, ImageError> {
    let n = parse_integer(key, value)?;
    if n < 1 {
        return Err(ImageError::invalid_param(key, "must be at least 1"));
    }
    u32::try_from(n).map_err(|_| ImageError::invalid_param(key, "integer is out of range"))
}

fn parse_quality(value: &str) -> Result<u8, ImageError> {
    let n = parse_integer("quality", value)?;
    if !(1..=100).contains(&n) {
        return Err(ImageError::invalid_param(
            "quality",
            "must be between 1 and 100",
        ));
    }
    Ok(n as u8)
}

fn parse_format(value: &str) -> Result<OutputFormat, ImageError> {
    let accepted = ACCEPTED_FORMATS
        .iter()
        .find(|f| f.as_str() == value.trim())
        .copied();
    accepted.ok_or_else(|| {
        let allowed: Vec<&str> = ACCEPTED_FORMATS.iter().map(|f| f.as_str()).collect();
        ImageError::invalid_param("format", format!("must be one of: {}", allowed.join(", ")))
    })
}

/// Toggles accept only a truthy value; anything else is rejected
fn parse_toggle(key: &str, value: &str) -> Result<bool, ImageError> {
    match value.trim() {
        "1" | "true" => Ok(true),
        _ => Err(ImageError::invalid_param(key, "must be 1")),
    }
}
