//! Shared types for the glassprint analysis pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage`, the pixel layout of the contour overlay.
pub use image::RgbImage;

/// Re-export `RgbaImage` so callers can build RGBA frames without
/// depending on `image` directly.
pub use image::RgbaImage;

/// A color image handed over by the capture layer.
///
/// Only the `ImageRgb8` and `ImageRgba8` layouts are analyzable; every
/// other [`image::DynamicImage`] variant is rejected with
/// [`AnalysisError::InvalidInput`].
pub type ColorImage = image::DynamicImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total pixel count (`width * height`).
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Which side of an edge region a traced border lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderKind {
    /// Boundary between an edge region and the background surrounding it.
    Outer,
    /// Boundary between an edge region and a background hole it encloses.
    Hole,
}

/// A traced boundary of a connected region in the edge map.
///
/// `parent` indexes into the contour list the contour was traced with
/// and names the immediately enclosing border, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    /// Boundary vertices with collinear runs collapsed.
    pub points: Vec<Point>,
    /// Outer border or hole border.
    pub kind: BorderKind,
    /// Index of the enclosing border in the traced contour list.
    pub parent: Option<usize>,
    /// Enclosed polygon area in square pixels (always `>= 0`).
    pub area: f64,
}

/// Coarse classification of pattern complexity, derived from the
/// significant contour count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    /// Fewer than 10 significant contours.
    Simple,
    /// 10 to 29 significant contours.
    Moderate,
    /// 30 or more significant contours.
    Complex,
}

impl ComplexityLevel {
    /// Contour count at which a pattern stops being [`Simple`](Self::Simple).
    pub const MODERATE_THRESHOLD: u32 = 10;

    /// Contour count at which a pattern becomes [`Complex`](Self::Complex).
    pub const COMPLEX_THRESHOLD: u32 = 30;

    /// Classify a significant contour count.
    #[must_use]
    pub const fn from_contour_count(count: u32) -> Self {
        if count < Self::MODERATE_THRESHOLD {
            Self::Simple
        } else if count < Self::COMPLEX_THRESHOLD {
            Self::Moderate
        } else {
            Self::Complex
        }
    }

    /// Lowercase name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of the visual pattern in one analyzed frame.
///
/// Serialized with camelCase field names, the shape result consumers
/// already render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Number of significant shapes found in the edge map.
    pub contour_count: u32,
    /// Percentage (0-100) of pixels classified as edges.
    pub edge_strength: u8,
    /// Percentage (0-100) of mirrored pixel pairs that match.
    pub symmetry_score: u8,
    /// Classification of `contour_count`.
    pub complexity_level: ComplexityLevel,
}

/// Operational limits for the analysis pipeline.
///
/// The algorithm parameters (blur kernel, Canny thresholds, minimum
/// contour area, symmetry tolerance) are fixed constants in their
/// respective modules. This struct only bounds the resources a single
/// run may claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Largest accepted `width * height`. Larger frames fail with
    /// [`AnalysisError::ResourceExhaustion`] before any stage runs.
    pub max_pixels: u64,
}

impl AnalysisConfig {
    /// Default for [`max_pixels`](Self::max_pixels): 40 megapixels,
    /// comfortably above any phone camera frame.
    pub const DEFAULT_MAX_PIXELS: u64 = 40_000_000;

    /// Check the configuration for values no run could satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] if `max_pixels` is zero.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.max_pixels == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_pixels must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_pixels: Self::DEFAULT_MAX_PIXELS,
        }
    }
}

/// Result of running the pipeline with every intermediate preserved.
///
/// Gives debugging and visualization code access to the buffers and
/// contour geometry behind an [`AnalysisResult`].
#[derive(Debug, Clone)]
pub struct StagedAnalysis {
    /// Stage 1: luminance image.
    pub grayscale: GrayImage,
    /// Stage 2: Gaussian-smoothed luminance.
    pub smoothed: GrayImage,
    /// Stage 3: binary edge map (0 or 255).
    pub edges: GrayImage,
    /// Stage 4: every traced contour, hierarchy included.
    pub contours: Vec<Contour>,
    /// Stage 5: the computed metrics record.
    pub result: AnalysisResult,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedAnalysis {
    /// Contours whose area exceeds the significance threshold.
    pub fn significant_contours(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter().filter(|c| c.is_significant())
    }
}

/// Errors that can occur during analysis.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The image buffer is empty, malformed, or in an unsupported layout.
    #[error("invalid input image: {0}")]
    InvalidInput(String),

    /// The intermediate buffers for this image cannot be allocated.
    #[error("insufficient resources to analyze image: {0}")]
    ResourceExhaustion(String),

    /// Analysis configuration is invalid.
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),

    /// Failed to decode encoded image bytes.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Serde-compatible proxy for `AnalysisError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead.
#[derive(Serialize, Deserialize)]
enum AnalysisErrorProxy {
    InvalidInput(String),
    ResourceExhaustion(String),
    InvalidConfig(String),
    ImageDecode(String),
}

impl Serialize for AnalysisError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::InvalidInput(s) => AnalysisErrorProxy::InvalidInput(s.clone()),
            Self::ResourceExhaustion(s) => AnalysisErrorProxy::ResourceExhaustion(s.clone()),
            Self::InvalidConfig(s) => AnalysisErrorProxy::InvalidConfig(s.clone()),
            Self::ImageDecode(e) => AnalysisErrorProxy::ImageDecode(e.to_string()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AnalysisError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = AnalysisErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            AnalysisErrorProxy::InvalidInput(s) => Self::InvalidInput(s),
            AnalysisErrorProxy::ResourceExhaustion(s) => Self::ResourceExhaustion(s),
            AnalysisErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
            // The typed `image::ImageError` cannot be rebuilt; keep the
            // message and surface it as bad input.
            AnalysisErrorProxy::ImageDecode(msg) => {
                Self::InvalidInput(format!("image decode error: {msg}"))
            }
        })
    }
}
