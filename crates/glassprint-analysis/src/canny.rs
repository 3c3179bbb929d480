//! Two-threshold gradient edge detection (Canny).
//!
//! Structured after `imageproc::edges::canny` (gradient, non-maximum
//! suppression, hysteresis) with the following differences:
//!
//! - **No internal blur.** The pipeline already smooths with its own
//!   fixed kernel, so the input is used as-is.
//! - **L1 gradient magnitude** (`|gx| + |gy|`), so the 0-255 scale
//!   thresholds keep the meaning capture tooling usually gives them.
//! - **Asymmetric tie-break** in non-maximum suppression. A pixel must be
//!   strictly greater than its first neighbour along the gradient and at
//!   least equal to the second, so two-pixel plateaus thin to one pixel.
//! - **Hysteresis walks all 8 neighbours** with bounds checks, so the
//!   search can reach the image border without `u32` underflow
//!   (see <https://github.com/image-rs/imageproc/issues/705>).

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Pixel value marking an edge in the output map.
pub const EDGE: u8 = 255;

/// Gradient direction, quantized to the four axes non-maximum
/// suppression compares along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Gradient roughly horizontal: compare left/right.
    Horizontal,
    /// Gradient along the `y = x` diagonal (image coordinates).
    Diagonal,
    /// Gradient roughly vertical: compare up/down.
    Vertical,
    /// Gradient along the `y = -x` diagonal.
    AntiDiagonal,
}

impl Direction {
    /// Quantize the gradient `(gx, gy)` to the nearest 45-degree axis.
    fn from_gradient(gx: f32, gy: f32) -> Self {
        let mut angle = gy.atan2(gx).to_degrees();
        if angle < 0.0 {
            angle += 180.0;
        }
        if !(22.5..157.5).contains(&angle) {
            Self::Horizontal
        } else if angle < 67.5 {
            Self::Diagonal
        } else if angle < 112.5 {
            Self::Vertical
        } else {
            Self::AntiDiagonal
        }
    }

    /// Offsets of the two neighbours lying along the gradient.
    const fn neighbours(self) -> [(i64, i64); 2] {
        match self {
            Self::Horizontal => [(-1, 0), (1, 0)],
            Self::Diagonal => [(-1, -1), (1, 1)],
            Self::Vertical => [(0, -1), (0, 1)],
            Self::AntiDiagonal => [(1, -1), (-1, 1)],
        }
    }
}

/// Run Canny edge detection on an already-smoothed grayscale image.
///
/// Returns a binary image: [`EDGE`] (255) for edge pixels, 0 otherwise.
/// Pixels whose gradient magnitude is above `high_threshold` are
/// definite edges; pixels above `low_threshold` are edges only when
/// 8-connected to a definite edge through other such pixels. A magnitude
/// equal to a threshold does not pass it.
///
/// The outermost row and column are never marked, since their Sobel
/// response depends on the border policy rather than image content.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let low = low_threshold.min(high_threshold);

    // 1. Intensity of gradients.
    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude: Image<Luma<f32>> = Image::from_fn(image.width(), image.height(), |x, y| {
        let h = f32::from(gx.get_pixel(x, y).0[0]);
        let v = f32::from(gy.get_pixel(x, y).0[0]);
        Luma([h.abs() + v.abs()])
    });

    // 2. Non-maximum suppression (make edges thinner).
    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);

    // 3. Hysteresis to keep only edges anchored to a strong response.
    hysteresis(&thinned, low, high_threshold)
}

/// Read the magnitude at `(x, y) + offset`, treating out-of-bounds as 0.
fn magnitude_at(g: &Image<Luma<f32>>, x: u32, y: u32, (dx, dy): (i64, i64)) -> f32 {
    let nx = i64::from(x) + dx;
    let ny = i64::from(y) + dy;
    match (u32::try_from(nx), u32::try_from(ny)) {
        (Ok(nx), Ok(ny)) if nx < g.width() && ny < g.height() => g.get_pixel(nx, ny).0[0],
        _ => 0.0,
    }
}

/// Keep only pixels that are local maxima along their gradient direction.
fn non_maximum_suppression(
    g: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    let (w, h) = g.dimensions();
    let mut out = Image::from_pixel(w, h, Luma([0.0]));
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let value = g.get_pixel(x, y).0[0];
            if value <= 0.0 {
                continue;
            }
            let direction = Direction::from_gradient(
                f32::from(gx.get_pixel(x, y).0[0]),
                f32::from(gy.get_pixel(x, y).0[0]),
            );
            let [before, after] = direction.neighbours();
            if value > magnitude_at(g, x, y, before) && value >= magnitude_at(g, x, y, after) {
                out.put_pixel(x, y, Luma([value]));
            }
        }
    }
    out
}

/// Filter thinned gradients with the two thresholds.
///
/// Non-recursive depth-first flood from every strong pixel through
/// neighbours above `low_thresh`.
fn hysteresis(input: &Image<Luma<f32>>, low_thresh: f32, high_thresh: f32) -> GrayImage {
    const NEIGHBOURS: [(i64, i64); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];

    let (w, h) = input.dimensions();
    let mut out = GrayImage::new(w, h);
    let mut stack: Vec<(u32, u32)> = Vec::new();

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            if input.get_pixel(x, y).0[0] <= high_thresh || out.get_pixel(x, y).0[0] == EDGE {
                continue;
            }
            out.put_pixel(x, y, Luma([EDGE]));
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                for (dx, dy) in NEIGHBOURS {
                    let (Ok(nx), Ok(ny)) = (
                        u32::try_from(i64::from(cx) + dx),
                        u32::try_from(i64::from(cy) + dy),
                    ) else {
                        continue;
                    };
                    if nx >= w || ny >= h {
                        continue;
                    }
                    if input.get_pixel(nx, ny).0[0] > low_thresh
                        && out.get_pixel(nx, ny).0[0] != EDGE
                    {
                        out.put_pixel(nx, ny, Luma([EDGE]));
                        stack.push((nx, ny));
                    }
                }
            }
        }
    }
    out
}
