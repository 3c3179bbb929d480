//! Input validation and grayscale conversion.
//!
//! Accepts an 8-bit RGB or RGBA [`ColorImage`] and produces the
//! single-channel luminance image the rest of the pipeline works on.
//! Raw interleaved buffers and encoded image bytes can be turned into a
//! [`ColorImage`] with [`color_image_from_raw`] and [`decode`].
//!
//! This is the first step in the pipeline: color in, `GrayImage` out.

use image::{DynamicImage, GrayImage, Luma, RgbImage, RgbaImage};

use crate::types::{AnalysisError, ColorImage, Dimensions};

/// BT.601 luminance weights in 14-bit fixed point (they sum to `1 << 14`).
const RED_WEIGHT: u32 = 4899;
const GREEN_WEIGHT: u32 = 9617;
const BLUE_WEIGHT: u32 = 1868;
const WEIGHT_SHIFT: u32 = 14;
const _: () = assert!(RED_WEIGHT + GREEN_WEIGHT + BLUE_WEIGHT == 1 << WEIGHT_SHIFT);

/// Borrowed pixels of an image that passed validation.
#[derive(Debug, Clone, Copy)]
pub enum ColorPixels<'a> {
    /// 8-bit RGB.
    Rgb(&'a RgbImage),
    /// 8-bit RGBA; alpha does not contribute to luminance.
    Rgba(&'a RgbaImage),
}

impl ColorPixels<'_> {
    /// Image dimensions in pixels.
    #[must_use]
    pub fn dimensions(self) -> Dimensions {
        let (width, height) = match self {
            Self::Rgb(rgb) => rgb.dimensions(),
            Self::Rgba(rgba) => rgba.dimensions(),
        };
        Dimensions { width, height }
    }

    /// Convert to single-channel luminance.
    #[must_use = "returns the luminance image"]
    pub fn to_luminance(self) -> GrayImage {
        let Dimensions { width, height } = self.dimensions();
        match self {
            Self::Rgb(rgb) => GrayImage::from_fn(width, height, |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([luminance(r, g, b)])
            }),
            Self::Rgba(rgba) => GrayImage::from_fn(width, height, |x, y| {
                let [r, g, b, _alpha] = rgba.get_pixel(x, y).0;
                Luma([luminance(r, g, b)])
            }),
        }
    }
}

/// Check that `image` is analyzable and borrow its pixels.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if either dimension is zero
/// or the pixel layout is anything other than 8-bit RGB or RGBA.
pub fn pixels(image: &ColorImage) -> Result<ColorPixels<'_>, AnalysisError> {
    let pixels = match image {
        DynamicImage::ImageRgb8(rgb) => ColorPixels::Rgb(rgb),
        DynamicImage::ImageRgba8(rgba) => ColorPixels::Rgba(rgba),
        other => {
            return Err(AnalysisError::InvalidInput(format!(
                "unsupported pixel layout {:?}; expected 8-bit RGB or RGBA",
                other.color(),
            )));
        }
    };

    let Dimensions { width, height } = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "image has zero area ({width}x{height})",
        )));
    }
    Ok(pixels)
}

/// Check that `image` is analyzable and return its dimensions.
///
/// # Errors
///
/// Same conditions as [`pixels`].
pub fn validate(image: &ColorImage) -> Result<Dimensions, AnalysisError> {
    pixels(image).map(ColorPixels::dimensions)
}

/// Convert a color image to single-channel luminance.
///
/// Uses the BT.601 weights `0.299*R + 0.587*G + 0.114*B` in fixed point
/// with rounding. Alpha, when present, is ignored.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] under the same conditions as
/// [`validate`].
pub fn to_luminance(image: &ColorImage) -> Result<GrayImage, AnalysisError> {
    Ok(pixels(image)?.to_luminance())
}

/// Fixed-point BT.601 luminance of one pixel.
#[allow(clippy::cast_possible_truncation)]
const fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let weighted =
        r as u32 * RED_WEIGHT + g as u32 * GREEN_WEIGHT + b as u32 * BLUE_WEIGHT;
    // At most 255 << 14 plus the rounding half, so the shift fits in a u8.
    ((weighted + (1 << (WEIGHT_SHIFT - 1))) >> WEIGHT_SHIFT) as u8
}

/// Build a [`ColorImage`] from a raw interleaved 8-bit buffer.
///
/// `channels` must be 3 (RGB) or 4 (RGBA) and `bytes` must hold exactly
/// `width * height * channels` values, row-major.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] for a zero dimension, an
/// unsupported channel count, or a buffer of the wrong length.
pub fn color_image_from_raw(
    width: u32,
    height: u32,
    channels: u8,
    bytes: Vec<u8>,
) -> Result<ColorImage, AnalysisError> {
    if width == 0 || height == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "image has zero area ({width}x{height})",
        )));
    }
    let expected = u64::from(width) * u64::from(height) * u64::from(channels);
    if !matches!(channels, 3 | 4) {
        return Err(AnalysisError::InvalidInput(format!(
            "unsupported channel count {channels}; expected 3 or 4",
        )));
    }
    if u64::try_from(bytes.len()).ok() != Some(expected) {
        return Err(AnalysisError::InvalidInput(format!(
            "buffer holds {} bytes, expected {expected} for {width}x{height}x{channels}",
            bytes.len(),
        )));
    }

    let image = if channels == 3 {
        RgbImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgb8)
    } else {
        RgbaImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgba8)
    };
    image.ok_or_else(|| {
        AnalysisError::InvalidInput(format!(
            "buffer does not match {width}x{height}x{channels}",
        ))
    })
}

/// Decode encoded image bytes (PNG, JPEG, BMP, WebP) into an analyzable
/// [`ColorImage`].
///
/// Images with an alpha channel are normalized to RGBA8, all others to
/// RGB8, so the result always passes [`validate`] (unless it has zero
/// area).
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if `bytes` is empty.
/// Returns [`AnalysisError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<ColorImage, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "input image data is empty".to_string(),
        ));
    }

    let image = image::load_from_memory(bytes)?;
    Ok(match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    })
}
