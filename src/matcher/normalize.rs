//! Coordinate normalization.
//!
//! A point set is mapped into a canonical frame so that patterns can be
//! compared regardless of where they sit in the image, how large they are,
//! or how they are rotated:
//!
//! 1. translate so the anchor (brightest point) is at the origin,
//! 2. scale so the reference (second brightest) is at distance 1,
//! 3. rotate so the reference lies on the +X axis,
//! 4. round every coordinate to 2 decimal places.
//!
//! Reflections and non-uniform distortion are *not* removed.

use nalgebra::{Rotation2, Vector2};
use tracing::warn;

use crate::{Point, PointSet};

/// Decimal places kept after normalization.
pub const NORMALIZED_DECIMALS: i32 = 2;

/// Anchor and reference closer than this are treated as coincident.
const DEGENERATE_DISTANCE: f64 = 1e-12;

/// Normalize a brightness-sorted point set.
///
/// Sets with fewer than 2 points are returned unchanged. If the anchor and
/// reference coincide the scale and rotation are undefined; the set is then
/// only translated (and rounded) and a warning is logged. Use
/// [`is_degenerate`] to detect that case up front.
///
/// The input is never mutated.
pub fn normalize(points: &PointSet) -> PointSet {
    let (anchor, reference) = match (points.anchor(), points.reference()) {
        (Some(a), Some(r)) => (a, r),
        _ => return points.clone(),
    };

    let origin = Vector2::new(anchor.x, anchor.y);
    let ref_offset = Vector2::new(reference.x, reference.y) - origin;
    let distance = ref_offset.norm();

    if distance < DEGENERATE_DISTANCE {
        warn!(
            "Degenerate normalization input: anchor and reference coincide at ({:.3}, {:.3})",
            anchor.x, anchor.y
        );
        return map_points(points, |v| v - origin);
    }

    // Angle is scale-invariant, so it can be taken before scaling.
    let theta = ref_offset.y.atan2(ref_offset.x);
    let rot = Rotation2::new(-theta);
    let inv_scale = 1.0 / distance;

    map_points(points, |v| rot * ((v - origin) * inv_scale))
}

/// True when normalization of `points` is undefined: fewer than 2 points,
/// or anchor and reference at the same position.
pub fn is_degenerate(points: &PointSet) -> bool {
    match (points.anchor(), points.reference()) {
        (Some(a), Some(r)) => a.distance(r) < DEGENERATE_DISTANCE,
        _ => true,
    }
}

/// Round to [`NORMALIZED_DECIMALS`] places. Halves round toward +∞, so
/// -0.125 becomes -0.12 and 0.125 becomes 0.13.
#[inline]
pub fn round_coord(v: f64) -> f64 {
    let scale = 10f64.powi(NORMALIZED_DECIMALS);
    let r = (v * scale + 0.5).floor() / scale;
    // Avoid -0.0 leaking into comparisons and output.
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

fn map_points<F>(points: &PointSet, f: F) -> PointSet
where
    F: Fn(Vector2<f64>) -> Vector2<f64>,
{
    let out: Vec<Point> = points
        .iter()
        .map(|p| {
            let v = f(Vector2::new(p.x, p.y));
            Point {
                x: round_coord(v.x),
                y: round_coord(v.y),
                ..p.clone()
            }
        })
        .collect();
    PointSet::from_sorted(out)
}
