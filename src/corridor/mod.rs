//! Corridor missions: survey along a centre path instead of over an area.
//!
//! The centre path is projected into the local frame and cleaned of
//! self-crossing loops. Offset paths use mitred vertex normals; the miter
//! is capped at [`MITER_LIMIT`] x the offset so sharp turns do not spike.
//!
//! Loop removal repeatedly takes the first pair of non-adjacent crossing
//! segments and splices the loop out at the crossing point.

use log::debug;

use crate::core::math::segment_intersection;
use crate::core::{GeodeticPosition, LocalVector3, Point2, Polygon};
use crate::error::Result;
use crate::lines::FlightLine;
use crate::providers::TransformationProvider;

/// Miter length cap as a multiple of the offset
pub const MITER_LIMIT: f64 = 4.0;

/// Projects a corridor centre path into offsets, hulls and flight lines.
#[derive(Clone, Debug)]
pub struct CorridorProjector {
    path: Vec<Point2>,
    raw_len: usize,
}

impl CorridorProjector {
    /// Project a geodetic centre path.
    pub fn new(path: &[GeodeticPosition], transform: &dyn TransformationProvider) -> Self {
        Self::from_local(path.iter().map(|p| transform.to_local(p).xy()).collect())
    }

    /// Use a centre path already in local coordinates.
    pub fn from_local(points: Vec<Point2>) -> Self {
        let raw_len = points.len();
        let path = remove_loops(&points);
        if path.len() < raw_len {
            debug!("[Corridor] loop removal: {} -> {} points", raw_len, path.len());
        }
        Self { path, raw_len }
    }

    /// Loop-free centre path
    pub fn local_path(&self) -> &[Point2] {
        &self.path
    }

    /// Number of points in the path as given
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }

    /// Path offset to the left (positive) or right (negative), loop-free.
    pub fn offset_path(&self, offset: f64) -> Vec<Point2> {
        let p = &self.path;
        let n = p.len();
        if n < 2 {
            return p.clone();
        }
        let normals: Vec<Point2> = p
            .windows(2)
            .map(|w| (w[1] - w[0]).normalize().perpendicular())
            .collect();

        let cap = MITER_LIMIT * offset.abs();
        let mut out = Vec::with_capacity(n);
        out.push(p[0] + normals[0] * offset);
        for i in 1..n - 1 {
            let (n1, n2) = (normals[i - 1], normals[i]);
            let sum = n1 + n2;
            let (m, length) = if sum.length() < 1e-9 {
                // path doubles back
                (n1, offset)
            } else {
                let m = sum.normalize();
                let cos_half = m.dot(&n1).max(1e-9);
                (m, (offset / cos_half).clamp(-cap, cap))
            };
            out.push(p[i] + m * length);
        }
        out.push(p[n - 1] + normals[n - 2] * offset);
        remove_loops(&out)
    }

    /// Corridor outline: left offset plus reversed right offset.
    pub fn hull(&self, half_width: f64) -> Polygon {
        let mut vertices = self.offset_path(half_width);
        let mut right = self.offset_path(-half_width);
        right.reverse();
        vertices.extend(right);
        Polygon::new(vertices)
    }

    /// `count` lines parallel to the path, `spacing` apart, centred on it.
    ///
    /// Lines are ordered right to left; the parallel coordinate is the
    /// offset from the centre path.
    pub fn offset_lines(&self, count: usize, spacing: f64, first_line_id: u32) -> Result<Vec<FlightLine>> {
        let mut lines = Vec::with_capacity(count);
        let centre = (count as f64 - 1.0) * 0.5;
        for k in 0..count {
            let offset = (k as f64 - centre) * spacing;
            let corners: Vec<LocalVector3> = self.offset_path(offset).iter().map(|p| p.with_z(0.0)).collect();
            lines.push(FlightLine::new(first_line_id + k as u32, corners, offset, false)?);
        }
        Ok(lines)
    }
}

/// Remove self-crossing loops from an open polyline.
pub fn remove_loops(points: &[Point2]) -> Vec<Point2> {
    let mut pts = dedup(points.to_vec());
    loop {
        let n = pts.len();
        if n < 4 {
            return pts;
        }
        let Some((i, j, crossing)) = first_crossing(&pts) else {
            return pts;
        };
        let mut next = Vec::with_capacity(n);
        next.extend_from_slice(&pts[..=i]);
        next.push(crossing);
        next.extend_from_slice(&pts[j + 1..]);
        pts = dedup(next);
    }
}

/// First pair of non-adjacent segments that cross.
fn first_crossing(pts: &[Point2]) -> Option<(usize, usize, Point2)> {
    let segments = pts.len() - 1;
    for i in 0..segments {
        for j in i + 2..segments {
            if let Some((_, _, p)) = segment_intersection(pts[i], pts[i + 1], pts[j], pts[j + 1]) {
                return Some((i, j, p));
            }
        }
    }
    None
}

fn dedup(mut pts: Vec<Point2>) -> Vec<Point2> {
    pts.dedup_by(|a, b| a.distance(b) < 1e-9);
    pts
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn looped_path() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 50.0),
            Point2::new(50.0, 50.0),
            Point2::new(50.0, -50.0),
            Point2::new(200.0, -50.0),
        ]
    }

    #[test]
    fn test_loop_removal() {
        let projector = CorridorProjector::from_local(looped_path());
        assert_eq!(projector.raw_len(), 6);
        assert_eq!(
            projector.local_path(),
            &[
                Point2::new(0.0, 0.0),
                Point2::new(50.0, 0.0),
                Point2::new(50.0, -50.0),
                Point2::new(200.0, -50.0),
            ]
        );
    }

    #[test]
    fn test_hull_is_simple() {
        let projector = CorridorProjector::from_local(looped_path());
        let hull = projector.hull(10.0);
        assert_eq!(hull.len(), 8);
        assert!(!hull.has_self_intersection());
        assert!(hull.contains(Point2::new(25.0, 0.0)));
        assert!(!hull.contains(Point2::new(25.0, 20.0)));
    }

    #[test]
    fn test_mitred_corner() {
        let projector = CorridorProjector::from_local(vec![
            Point2::new(0.0, 0.0),
            Point2::new(50.0, 0.0),
            Point2::new(50.0, -50.0),
        ]);
        let left = projector.offset_path(10.0);
        assert_relative_eq!(left[1].x, 60.0, epsilon = 1e-9);
        assert_relative_eq!(left[1].y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_miter_cap() {
        // nearly reversing path
        let projector = CorridorProjector::from_local(vec![
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(0.0, 1.0),
        ]);
        let left = projector.offset_path(5.0);
        assert!(left[1].distance(&Point2::new(100.0, 0.0)) <= MITER_LIMIT * 5.0 + 1e-9);
    }

    #[test]
    fn test_offset_lines() {
        let projector = CorridorProjector::from_local(vec![Point2::new(0.0, 0.0), Point2::new(100.0, 0.0)]);
        let lines = projector.offset_lines(3, 20.0, 10).unwrap();
        assert_eq!(lines.len(), 3);
        let offsets: Vec<f64> = lines.iter().map(|l| l.parallel_coordinate).collect();
        assert_eq!(offsets, vec![-20.0, 0.0, 20.0]);
        assert_eq!(lines[0].line_id, 10);
        assert_relative_eq!(lines[0].start().y, -20.0, epsilon = 1e-9);
        assert_relative_eq!(lines[2].length(), 100.0, epsilon = 1e-9);
    }
}
