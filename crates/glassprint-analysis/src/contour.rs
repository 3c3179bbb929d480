//! Contour tracing and shape counting on a binary edge map.
//!
//! Borders are traced with Suzuki-Abe border following via
//! [`imageproc::contours::find_contours`], which reports both outer
//! borders and hole borders together with a parent link to the
//! enclosing border. Runs of collinear boundary points are collapsed
//! and each contour's enclosed area is computed with the shoelace
//! formula.
//!
//! # Counting shapes
//!
//! Canny produces one-pixel-wide strokes. A closed stroke is traced
//! twice: once along its outside (an outer border) and once along its
//! inside (a hole border whose parent is that outer border). Both
//! describe the same shape, so [`count_shapes`] counts every
//! significant hole border and only those significant outer borders
//! with no significant hole directly inside them. A filled ring has
//! two edge strokes (its outer rim and its inner rim) and so counts as
//! two shapes.

use std::collections::HashSet;

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::types::{BorderKind, Contour, Point};

/// Contours enclosing this many square pixels or fewer are noise.
pub const MIN_CONTOUR_AREA: f64 = 150.0;

impl Contour {
    /// Whether the contour encloses more than [`MIN_CONTOUR_AREA`].
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.area > MIN_CONTOUR_AREA
    }
}

/// Trace every border in a binary edge map (non-zero = edge).
///
/// The returned list keeps the tracer's order, which is stable for a
/// given input; [`Contour::parent`] indexes into it.
#[must_use]
pub fn trace(edges: &GrayImage) -> Vec<Contour> {
    imageproc::contours::find_contours::<u32>(edges)
        .into_iter()
        .map(|c| {
            let raw: Vec<Point> = c
                .points
                .iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            let area = polygon_area(&raw);
            Contour {
                points: compress_collinear(&raw),
                kind: match c.border_type {
                    BorderType::Outer => BorderKind::Outer,
                    BorderType::Hole => BorderKind::Hole,
                },
                parent: c.parent,
                area,
            }
        })
        .collect()
}

/// Contours that pass the [`MIN_CONTOUR_AREA`] filter.
pub fn significant(contours: &[Contour]) -> impl Iterator<Item = &Contour> {
    contours.iter().filter(|c| c.is_significant())
}

/// Number of significant shapes in a traced contour list.
///
/// See the [module docs](self#counting-shapes) for how the two borders
/// of a closed stroke are merged.
#[must_use]
pub fn count_shapes(contours: &[Contour]) -> u32 {
    let filled_by_hole: HashSet<usize> = significant(contours)
        .filter(|c| c.kind == BorderKind::Hole)
        .filter_map(|c| c.parent)
        .collect();

    let count = contours
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_significant())
        .filter(|(i, c)| c.kind == BorderKind::Hole || !filled_by_hole.contains(i))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Area enclosed by a closed polygon (shoelace formula).
///
/// The polygon is implicitly closed from the last point back to the
/// first. Fewer than three points enclose nothing.
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_signed: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x.mul_add(b.y, -(b.x * a.y)))
        .sum();
    twice_signed.abs() / 2.0
}

/// Drop boundary points that lie on a straight run between their
/// neighbours, treating the sequence as a closed loop.
///
/// Reversals (a boundary that doubles back on itself) and repeated
/// points are kept, so the simplified loop still encloses the same
/// area.
#[must_use]
pub fn compress_collinear(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let kept: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            !passes_straight_through(prev, points[i], next)
        })
        .map(|i| points[i])
        .collect();
    if kept.is_empty() {
        points.to_vec()
    } else {
        kept
    }
}

/// `true` when `cur` continues the direction of `prev -> cur` unchanged.
fn passes_straight_through(prev: Point, cur: Point, next: Point) -> bool {
    let (ax, ay) = (cur.x - prev.x, cur.y - prev.y);
    let (bx, by) = (next.x - cur.x, next.y - cur.y);
    let cross = ax.mul_add(by, -(ay * bx));
    let dot = ax.mul_add(bx, ay * by);
    cross == 0.0 && dot > 0.0
}
