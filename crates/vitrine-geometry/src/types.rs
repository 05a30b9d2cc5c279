//! Shared types for the vitrine geometry engine.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can inspect decoded
/// pixels without depending on `image` directly.
pub use image::RgbaImage;

/// MIME type of every buffer produced by the geometry engine.
pub const PNG_MIME: &str = "image/png";

/// An encoded raster image (PNG, JPEG, WebP, ...) plus its declared
/// MIME type.
///
/// Buffers are immutable and cheap to clone: the bytes live behind an
/// `Arc`, so replacing a preview or pushing a history entry never copies
/// pixel data. Equality is byte-exact on the encoded bytes and the MIME
/// type. Width and height are implicit in the encoding; use
/// [`dimensions`](Self::dimensions) to read them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageBuffer {
    bytes: Arc<[u8]>,
    mime_type: Arc<str>,
}

impl ImageBuffer {
    /// Wrap encoded bytes with their declared MIME type.
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<Arc<str>>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Wrap PNG-encoded bytes.
    #[must_use]
    pub fn png(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(bytes, PNG_MIME)
    }

    /// The encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The declared MIME type, e.g. `"image/png"`.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Length of the encoded data in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if there are no encoded bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns `true` if the declared MIME type is PNG.
    #[must_use]
    pub fn is_png(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case(PNG_MIME)
    }

    /// Read the pixel dimensions from the encoded header without decoding
    /// the full image.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyInput`] for an empty buffer and
    /// [`GeometryError::Decode`] if the format is unrecognized.
    pub fn dimensions(&self) -> Result<Dimensions, GeometryError> {
        if self.is_empty() {
            return Err(GeometryError::EmptyInput);
        }
        let (width, height) = image::ImageReader::new(Cursor::new(self.bytes()))
            .with_guessed_format()
            .map_err(|e| GeometryError::Decode(image::ImageError::IoError(e)))?
            .into_dimensions()
            .map_err(GeometryError::Decode)?;
        Ok(Dimensions { width, height })
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A target aspect ratio `w:h` with both terms positive.
///
/// Parses from and displays as `"w:h"`, which is also its serde form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    /// `1:1`.
    pub const SQUARE: Self = Self::preset(1, 1);

    /// Ratios offered when framing a source image.
    pub const FRAME_PRESETS: [Self; 7] = [
        Self::SQUARE,
        Self::preset(4, 3),
        Self::preset(3, 4),
        Self::preset(3, 2),
        Self::preset(2, 3),
        Self::preset(16, 9),
        Self::preset(9, 16),
    ];

    /// Ratios accepted by the image generation backend.
    pub const GENERATE_PRESETS: [Self; 5] = [
        Self::SQUARE,
        Self::preset(16, 9),
        Self::preset(9, 16),
        Self::preset(4, 3),
        Self::preset(3, 4),
    ];

    const fn preset(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Create a ratio from its two terms.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidAspectRatio`] if either term is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidAspectRatio(format!(
                "{width}:{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// The width term.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// The height term.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.height
    }

    /// `width / height` as a float.
    #[must_use]
    pub fn ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GeometryError::InvalidAspectRatio(s.to_owned());
        let (w, h) = s.trim().split_once(':').ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        Self::new(width, height).map_err(|_| invalid())
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = GeometryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.to_string()
    }
}

/// Errors that can occur in the geometry engine.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The input could not be interpreted as an image.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The 2D drawing surface could not be allocated.
    #[error("could not acquire a {width}x{height} drawing surface")]
    RenderTargetUnavailable {
        /// Requested surface width.
        width: u32,
        /// Requested surface height.
        height: u32,
    },

    /// The rendered canvas could not be encoded.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// A numeric parameter was out of its domain (NaN, infinite, or
    /// non-positive where a positive value is required).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An aspect ratio string or pair was malformed.
    #[error("invalid aspect ratio: {0:?}")]
    InvalidAspectRatio(String),
}
