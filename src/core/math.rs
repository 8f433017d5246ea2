//! Angle and segment helpers.
//!
//! Headings are degrees clockwise from north; internal trigonometry in
//! radians. Local frame is x = east, y = north.

use super::point::{LocalVector3, Point2};

/// Normalize an angle in degrees to [0, 360).
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid may return 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Signed shortest difference `to - from` in degrees, in [-180, 180).
#[inline]
pub fn angle_diff_degrees(from: f64, to: f64) -> f64 {
    let d = normalize_degrees(to - from);
    if d >= 180.0 { d - 360.0 } else { d }
}

/// Heading (degrees from north, clockwise) of a horizontal displacement.
#[inline]
pub fn heading_of(dx: f64, dy: f64) -> f64 {
    normalize_degrees(dx.atan2(dy).to_degrees())
}

/// Heading of the horizontal part of `to - from`.
#[inline]
pub fn heading_between(from: &LocalVector3, to: &LocalVector3) -> f64 {
    heading_of(to.x - from.x, to.y - from.y)
}

/// Horizontal unit vector for a heading in degrees.
#[inline]
pub fn heading_vector(heading: f64) -> LocalVector3 {
    let rad = heading.to_radians();
    LocalVector3::new(rad.sin(), rad.cos(), 0.0)
}

/// Intersection of segments `a0-a1` and `b0-b1`.
///
/// Returns the parameters `(t, u)` along each segment and the crossing
/// point, or `None` for parallel or non-touching segments.
pub fn segment_intersection(
    a0: Point2,
    a1: Point2,
    b0: Point2,
    b1: Point2,
) -> Option<(f64, f64, Point2)> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.cross(&s);
    if denom.abs() < 1e-12 {
        return None;
    }
    let qp = b0 - a0;
    let t = qp.cross(&s) / denom;
    let u = qp.cross(&r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, u, a0 + r * t))
    } else {
        None
    }
}

/// Distance from point `p` to segment `a-b` in the plane.
pub fn point_segment_distance(p: Point2, a: Point2, b: Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(&ab);
    if len_sq < 1e-18 {
        return p.distance(&a);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    p.distance(&(a + ab * t))
}
