//! Integration tests: run synthetic glass patterns through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use glassprint_analysis::{
    AnalysisConfig, AnalysisError, AnalysisResult, Analyzer, ColorImage, ComplexityLevel,
    RgbaImage, SystemClock,
};
use imageproc::drawing::draw_filled_circle_mut;

const BACKGROUND: image::Rgba<u8> = image::Rgba([255, 255, 255, 255]);
const INK: image::Rgba<u8> = image::Rgba([0, 0, 0, 255]);

/// A `cols` x `rows` grid of filled dark circles on a white background.
///
/// Circle centres sit at `spacing / 2 + i * spacing`. The image is one
/// pixel wider than `cols * spacing` so the grid mirrors exactly about
/// the vertical centre line.
fn circle_grid(cols: u32, rows: u32, spacing: u32, radius: i32) -> ColorImage {
    let mut img = RgbaImage::from_pixel(cols * spacing + 1, rows * spacing + 1, BACKGROUND);
    for row in 0..rows {
        for col in 0..cols {
            let cx = i32::try_from(spacing / 2 + col * spacing).unwrap();
            let cy = i32::try_from(spacing / 2 + row * spacing).unwrap();
            draw_filled_circle_mut(&mut img, (cx, cy), radius, INK);
        }
    }
    ColorImage::ImageRgba8(img)
}

fn encode_png(img: &ColorImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn assert_in_range(result: &AnalysisResult) {
    assert!(result.edge_strength <= 100);
    assert!(result.symmetry_score <= 100);
    assert_eq!(
        result.complexity_level,
        ComplexityLevel::from_contour_count(result.contour_count)
    );
}

#[test]
fn uniform_frame_has_no_pattern() {
    let img = ColorImage::ImageRgba8(RgbaImage::from_pixel(64, 48, image::Rgba([90, 140, 200, 255])));
    let result = glassprint_analysis::analyze(&img).unwrap();
    assert_eq!(result.edge_strength, 0);
    assert_eq!(result.contour_count, 0);
    assert_eq!(result.complexity_level, ComplexityLevel::Simple);
    assert_in_range(&result);
}

#[test]
fn single_pixel_frame_is_accepted() {
    let img = ColorImage::ImageRgba8(RgbaImage::from_pixel(1, 1, INK));
    let result = glassprint_analysis::analyze(&img).unwrap();
    assert_eq!(
        result,
        AnalysisResult {
            contour_count: 0,
            edge_strength: 0,
            symmetry_score: 0,
            complexity_level: ComplexityLevel::Simple,
        }
    );
}

#[test]
fn twelve_circles_are_moderate() {
    let img = circle_grid(4, 3, 50, 12);
    let result = glassprint_analysis::analyze(&img).unwrap();
    eprintln!("12 circles: {result:?}");
    assert_eq!(result.contour_count, 12);
    assert_eq!(result.complexity_level, ComplexityLevel::Moderate);
    assert!(result.edge_strength > 0);
    assert_in_range(&result);
}

#[test]
fn mirrored_pattern_is_fully_symmetric() {
    let img = circle_grid(4, 3, 50, 12);
    let result = glassprint_analysis::analyze(&img).unwrap();
    assert_eq!(result.symmetry_score, 100);
}

#[test]
fn thirty_five_circles_are_complex() {
    let img = circle_grid(7, 5, 40, 12);
    let result = glassprint_analysis::analyze(&img).unwrap();
    eprintln!("35 circles: {result:?}");
    assert_eq!(result.contour_count, 35);
    assert_eq!(result.complexity_level, ComplexityLevel::Complex);
    assert_in_range(&result);
}

#[test]
fn filled_ring_counts_each_rim() {
    let mut img = RgbaImage::from_pixel(101, 101, BACKGROUND);
    draw_filled_circle_mut(&mut img, (50, 50), 35, INK);
    draw_filled_circle_mut(&mut img, (50, 50), 15, BACKGROUND);
    let result = glassprint_analysis::analyze(&ColorImage::ImageRgba8(img)).unwrap();
    assert_eq!(result.contour_count, 2);
    assert_eq!(result.complexity_level, ComplexityLevel::Simple);
}

#[test]
fn small_specks_are_ignored() {
    // Radius 4 circles enclose well under the minimum contour area.
    let img = circle_grid(5, 4, 30, 4);
    let result = glassprint_analysis::analyze(&img).unwrap();
    assert!(result.edge_strength > 0);
    assert_eq!(result.contour_count, 0);
    assert_eq!(result.complexity_level, ComplexityLevel::Simple);
}

#[test]
fn analysis_is_deterministic() {
    let img = circle_grid(3, 2, 50, 15);
    let first = glassprint_analysis::analyze(&img).unwrap();
    for _ in 0..3 {
        assert_eq!(glassprint_analysis::analyze(&img).unwrap(), first);
    }
}

#[test]
fn rgb_and_rgba_inputs_agree() {
    let rgba = circle_grid(3, 2, 50, 15);
    let rgb = ColorImage::ImageRgb8(rgba.to_rgb8());
    assert_eq!(
        glassprint_analysis::analyze(&rgb).unwrap(),
        glassprint_analysis::analyze(&rgba).unwrap()
    );
}

#[test]
fn decoded_and_raw_inputs_agree_with_in_memory_image() {
    let img = circle_grid(2, 2, 50, 14);
    let expected = glassprint_analysis::analyze(&img).unwrap();

    let decoded = glassprint_analysis::grayscale::decode(&encode_png(&img)).unwrap();
    assert_eq!(glassprint_analysis::analyze(&decoded).unwrap(), expected);

    let raw = glassprint_analysis::grayscale::color_image_from_raw(
        img.width(),
        img.height(),
        4,
        img.to_rgba8().into_raw(),
    )
    .unwrap();
    assert_eq!(glassprint_analysis::analyze(&raw).unwrap(), expected);
}

#[test]
fn concurrent_calls_match_sequential_results() {
    let images = [
        circle_grid(4, 3, 50, 12),
        circle_grid(2, 2, 40, 10),
        circle_grid(7, 5, 40, 12),
        ColorImage::ImageRgba8(RgbaImage::from_pixel(30, 30, BACKGROUND)),
    ];
    let sequential: Vec<AnalysisResult> = images
        .iter()
        .map(|img| glassprint_analysis::analyze(img).unwrap())
        .collect();

    let analyzer = &Analyzer::default();
    let concurrent: Vec<AnalysisResult> = std::thread::scope(|s| {
        let handles: Vec<_> = images
            .iter()
            .map(|img| s.spawn(move || analyzer.analyze(img).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(concurrent, sequential);
}

#[test]
fn oversized_frame_is_resource_exhaustion() {
    let analyzer = Analyzer::new(AnalysisConfig { max_pixels: 1_000 }).unwrap();
    let err = analyzer.analyze(&circle_grid(2, 2, 50, 12)).unwrap_err();
    assert!(matches!(err, AnalysisError::ResourceExhaustion(_)));
    assert!(err.to_string().contains("above the limit"));
}

#[test]
fn unsupported_layouts_are_invalid_input() {
    let cases = [
        ColorImage::ImageLuma8(image::GrayImage::new(10, 10)),
        ColorImage::ImageRgb32F(image::Rgb32FImage::new(10, 10)),
        ColorImage::ImageRgba8(RgbaImage::new(10, 0)),
    ];
    for img in &cases {
        assert!(
            matches!(
                glassprint_analysis::analyze(img),
                Err(AnalysisError::InvalidInput(_))
            ),
            "{:?} should be rejected",
            img.color(),
        );
    }
}

#[test]
fn overlay_outlines_every_circle() {
    let img = circle_grid(4, 3, 50, 12);
    let overlay = glassprint_analysis::render_overlay(&img).unwrap();
    assert_eq!(overlay.dimensions(), (img.width(), img.height()));

    let orange = image::Rgb(glassprint_analysis::overlay::OVERLAY_COLOR);
    for row in 0..3 {
        for col in 0..4 {
            let (cx, cy) = (25 + col * 50, 25 + row * 50);
            // Centre stays ink-black, the rim is stroked.
            assert_eq!(overlay.get_pixel(cx, cy).0, [0, 0, 0]);
            let rim = (cx - 16..=cx + 16).any(|x| *overlay.get_pixel(x, cy) == orange);
            assert!(rim, "circle at ({cx}, {cy}) has no outline");
        }
    }
    // Background far from any circle is untouched.
    assert_eq!(overlay.get_pixel(0, 0).0, [255, 255, 255]);
}

#[test]
fn staged_analysis_exposes_shape_geometry() {
    let img = circle_grid(4, 3, 50, 12);
    let staged = Analyzer::default().analyze_staged(&img).unwrap();
    assert_eq!(staged.result.contour_count, 12);
    assert!(staged.significant_contours().count() >= 12);
    for contour in staged.significant_contours() {
        assert!(contour.area > glassprint_analysis::contour::MIN_CONTOUR_AREA);
        assert!(contour.points.len() >= 3);
    }
}

#[test]
fn diagnostics_agree_with_plain_analysis() {
    let img = circle_grid(4, 3, 50, 12);
    let (result, diagnostics) = glassprint_analysis::analyze_with_diagnostics(
        &img,
        &AnalysisConfig::default(),
        &SystemClock,
    )
    .unwrap();
    assert_eq!(result, glassprint_analysis::analyze(&img).unwrap());
    let report = diagnostics.report();
    assert!(report.contains("Contour Tracing"));
    assert!(report.contains("12 shapes"));
}
