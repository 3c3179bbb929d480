//! Gaussian blur for noise reduction before edge detection.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`] to smooth the
//! luminance image, suppressing sensor and compression noise that would
//! otherwise produce spurious edges in the Canny detector.
//!
//! `imageproc` sizes its kernel as `2 * ceil(2 * sigma) + 1` taps and
//! clamps reads past the border to the nearest edge pixel, so
//! [`BLUR_SIGMA`] yields exactly the [`BLUR_KERNEL_SIZE`] x
//! [`BLUR_KERNEL_SIZE`] separable kernel with a clamp border policy.

use image::GrayImage;

/// Standard deviation of the smoothing kernel.
pub const BLUR_SIGMA: f32 = 1.5;

/// Width and height of the smoothing kernel in pixels.
pub const BLUR_KERNEL_SIZE: u32 = 7;

// Keep the two constants in step with imageproc's kernel sizing.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const _: () = assert!(2 * ((2.0 * BLUR_SIGMA) as u32) + 1 == BLUR_KERNEL_SIZE);

/// Smooth a grayscale image with the fixed 7x7, sigma 1.5 Gaussian.
///
/// Output dimensions always match the input.
#[must_use = "returns the smoothed image"]
pub fn smooth(image: &GrayImage) -> GrayImage {
    imageproc::filter::gaussian_blur_f32(image, BLUR_SIGMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = GrayImage::new(17, 31);
        let blurred = smooth(&img);
        assert_eq!(blurred.width(), 17);
        assert_eq!(blurred.height(), 31);
    }

    #[test]
    fn single_pixel_image_survives() {
        let img = GrayImage::from_pixel(1, 1, image::Luma([200]));
        let blurred = smooth(&img);
        assert_eq!(blurred.dimensions(), (1, 1));
        let diff = i16::from(blurred.get_pixel(0, 0).0[0]) - 200;
        assert!(diff.abs() <= 1);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let img = sharp_edge_image();
        let blurred = smooth(&img);

        // At the boundary (x=4 and x=5), the blurred image should have
        // intermediate values rather than a sharp 0-to-255 jump.
        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];

        assert!(
            left_of_edge > 0,
            "expected blur to raise left-of-edge above 0, got {left_of_edge}"
        );
        assert!(
            right_of_edge < 255,
            "expected blur to lower right-of-edge below 255, got {right_of_edge}"
        );
    }

    #[test]
    fn uniform_image_unchanged_by_blur() {
        let img = GrayImage::from_fn(10, 10, |_, _| image::Luma([128]));
        let blurred = smooth(&img);
        for pixel in blurred.pixels() {
            let diff = i16::from(pixel.0[0]) - 128;
            assert!(
                diff.abs() <= 1,
                "expected uniform image to stay near 128 after blur, got {}",
                pixel.0[0],
            );
        }
    }

    #[test]
    fn kernel_reaches_three_pixels_and_no_further() {
        // A single bright pixel spreads over the kernel footprint only.
        let mut img = GrayImage::new(21, 21);
        img.put_pixel(10, 10, image::Luma([255]));
        let blurred = smooth(&img);

        assert!(blurred.get_pixel(13, 10).0[0] > 0, "radius 3 should be inside the kernel");
        assert!(blurred.get_pixel(10, 7).0[0] > 0, "radius 3 should be inside the kernel");
        assert_eq!(blurred.get_pixel(14, 10).0[0], 0, "radius 4 is outside a 7x7 kernel");
        assert_eq!(blurred.get_pixel(10, 6).0[0], 0, "radius 4 is outside a 7x7 kernel");
    }

    #[test]
    fn blur_is_deterministic() {
        let img = GrayImage::from_fn(16, 9, |x, y| image::Luma([((x * 31 + y * 17) % 256) as u8]));
        assert_eq!(smooth(&img), smooth(&img));
    }
}
