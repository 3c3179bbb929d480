//! Pattern metrics: edge density, left-right symmetry, complexity.
//!
//! All functions here are pure reads of buffers produced by earlier
//! stages. Ratios are reported as whole percentages rounded half away
//! from zero, and a ratio with an empty denominator is reported as 0.

use image::GrayImage;

use crate::types::{AnalysisResult, ComplexityLevel};

/// Two mirrored pixels match when their intensities differ by less
/// than this.
pub const SYMMETRY_TOLERANCE: u8 = 30;

/// Percentage (0-100) of pixels in `edges` that are set.
#[must_use]
pub fn edge_density(edges: &GrayImage) -> u8 {
    let total = u64::from(edges.width()) * u64::from(edges.height());
    percentage(crate::edge::count_edge_pixels(edges), total)
}

/// Percentage (0-100) of mirrored pixel pairs whose intensities match.
///
/// Each row contributes `width / 2` comparisons of column `c` against
/// column `width - 1 - c`; the centre column of an odd-width image is
/// never compared. An image narrower than two pixels has no pairs and
/// scores 0.
#[must_use]
pub fn symmetry_score(image: &GrayImage) -> u8 {
    let width = image.width();
    let half = width / 2;
    let mut matches: u64 = 0;
    for y in 0..image.height() {
        for col in 0..half {
            let left = image.get_pixel(col, y).0[0];
            let right = image.get_pixel(width - 1 - col, y).0[0];
            if left.abs_diff(right) < SYMMETRY_TOLERANCE {
                matches += 1;
            }
        }
    }
    let comparisons = u64::from(half) * u64::from(image.height());
    percentage(matches, comparisons)
}

/// Assemble the metrics record from the pipeline's outputs.
#[must_use]
pub fn summarize(edges: &GrayImage, smoothed: &GrayImage, contour_count: u32) -> AnalysisResult {
    AnalysisResult {
        contour_count,
        edge_strength: edge_density(edges),
        symmetry_score: symmetry_score(smoothed),
        complexity_level: ComplexityLevel::from_contour_count(contour_count),
    }
}

/// `round(100 * part / whole)`, or 0 when `whole` is 0.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentage(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    let ratio = part.min(whole) as f64 / whole as f64;
    // In [0, 100] after the clamp above, so the cast is exact.
    (ratio * 100.0).round() as u8
}
