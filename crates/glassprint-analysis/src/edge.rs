//! Edge map production and edge-pixel accounting.
//!
//! [`detect_edges`] runs the [`canny`](crate::canny::canny) detector
//! with the fixed pipeline thresholds. Returns a binary image where
//! white pixels (255) are edges and black pixels (0) are background.

use image::GrayImage;

/// Gradient magnitude a pixel must exceed to extend an edge.
pub const CANNY_LOW: f32 = 40.0;

/// Gradient magnitude a pixel must exceed to be a definite edge.
pub const CANNY_HIGH: f32 = 120.0;

const _: () = assert!(CANNY_LOW > 0.0 && CANNY_LOW <= CANNY_HIGH);

/// Detect edges in a smoothed grayscale image with the pipeline
/// thresholds ([`CANNY_LOW`], [`CANNY_HIGH`]).
///
/// This is step 3 in the pipeline, between Gaussian smoothing and
/// contour tracing.
#[must_use = "returns the binary edge map"]
pub fn detect_edges(smoothed: &GrayImage) -> GrayImage {
    crate::canny::canny(smoothed, CANNY_LOW, CANNY_HIGH)
}

/// Count edge pixels (any non-zero value) in an edge map.
#[must_use]
pub fn count_edge_pixels(edges: &GrayImage) -> u64 {
    edges.pixels().map(|p| u64::from(p.0[0] != 0)).sum()
}
