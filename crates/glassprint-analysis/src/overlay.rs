//! Contour overlay rendering.
//!
//! Strokes every significant contour onto an RGB copy of the analyzed
//! frame so the shapes behind a contour count can be inspected by eye.
//! Paths are rasterized with `tiny-skia`.

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::{debug, info_span};

use crate::pipeline::Analysis;
use crate::types::{AnalysisConfig, AnalysisError, ColorImage, Contour, RgbImage};

/// Stroke color for contour outlines.
pub const OVERLAY_COLOR: [u8; 3] = [255, 165, 0];

/// Stroke width for contour outlines, in pixels.
pub const OVERLAY_STROKE_WIDTH: f32 = 3.0;

/// Run the pipeline through contour tracing and stroke the significant
/// contours onto an RGB copy of `image`.
///
/// # Errors
///
/// Same validation errors as
/// [`Pending::validate`](crate::pipeline::Pending::validate), plus
/// [`AnalysisError::ResourceExhaustion`] if the drawing canvas cannot be
/// allocated.
pub fn render_overlay_with_config(
    image: &ColorImage,
    config: &AnalysisConfig,
) -> Result<RgbImage, AnalysisError> {
    let traced = Analysis::new(image, config.clone())
        .validate()?
        .grayscale()
        .smooth()
        .detect_edges()
        .trace_contours();

    let _span = info_span!("overlay").entered();
    let significant = crate::contour::significant(traced.contours());
    draw_contours(&image.to_rgb8(), significant)
}

/// Stroke each contour as a closed outline onto a copy of `base`.
///
/// Contour points are pixel indices, so each vertex is placed at the
/// centre of its pixel. Anti-aliasing is off: every touched pixel takes
/// exactly [`OVERLAY_COLOR`].
///
/// # Errors
///
/// Returns [`AnalysisError::ResourceExhaustion`] if the drawing canvas
/// cannot be allocated.
#[allow(clippy::cast_possible_truncation)]
pub fn draw_contours<'a>(
    base: &RgbImage,
    contours: impl IntoIterator<Item = &'a Contour>,
) -> Result<RgbImage, AnalysisError> {
    let (width, height) = base.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        AnalysisError::ResourceExhaustion(format!(
            "cannot allocate a {width}x{height} overlay canvas",
        ))
    })?;

    // Opaque pixels: premultiplied and straight RGBA coincide.
    for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(base.pixels()) {
        let [r, g, b] = src.0;
        dst.copy_from_slice(&[r, g, b, 255]);
    }

    let stroke = Stroke {
        width: OVERLAY_STROKE_WIDTH,
        line_cap: LineCap::Butt,
        line_join: LineJoin::Miter,
        ..Stroke::default()
    };
    let mut paint = Paint::default();
    let [r, g, b] = OVERLAY_COLOR;
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = false;

    let mut drawn = 0_usize;
    for contour in contours {
        // A single point has no outline to stroke.
        let [first, rest @ ..] = contour.points.as_slice() else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(first.x as f32 + 0.5, first.y as f32 + 0.5);
        for p in rest {
            pb.line_to(p.x as f32 + 0.5, p.y as f32 + 0.5);
        }
        pb.close();
        let Some(path) = pb.finish() else {
            continue;
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        drawn += 1;
    }
    debug!(drawn, "contours stroked");

    let mut out = RgbImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(pixmap.data().chunks_exact(4)) {
        dst.0 = [src[0], src[1], src[2]];
    }
    Ok(out)
}
