//! Simple polygons in the local plane.

use serde::{Deserialize, Serialize};

use super::math::segment_intersection;
use super::point::Point2;

/// Closed vertex loop (the closing edge is implicit).
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertices in traversal order
    pub vertices: Vec<Point2>,
}

impl Polygon {
    /// Create from vertices
    pub fn new(vertices: Vec<Point2>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle with corners `min` and `max` (counter-clockwise)
    pub fn rectangle(min: Point2, max: Point2) -> Self {
        Self::new(vec![
            min,
            Point2::new(max.x, min.y),
            max,
            Point2::new(min.x, max.y),
        ])
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True when there are no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edges as `(start, end)` pairs, including the closing edge
    pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Signed shoelace area (positive for counter-clockwise loops)
    pub fn signed_area(&self) -> f64 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        self.edges().map(|(a, b)| a.cross(&b)).sum::<f64>() * 0.5
    }

    /// Unsigned area
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Bounding box `(min, max)`
    pub fn bounds(&self) -> Option<(Point2, Point2)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.vertices[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Even-odd point-in-polygon test
    pub fn contains(&self, p: Point2) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// True if the segment `a-b` touches the polygon (crosses an edge or lies inside)
    pub fn intersects_segment(&self, a: Point2, b: Point2) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }
        self.edges()
            .any(|(e0, e1)| segment_intersection(a, b, e0, e1).is_some())
    }

    /// True if two non-adjacent edges cross
    pub fn has_self_intersection(&self) -> bool {
        let n = self.vertices.len();
        if n < 4 {
            return false;
        }
        for i in 0..n {
            let (a0, a1) = (self.vertices[i], self.vertices[(i + 1) % n]);
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue; // shares vertex 0
                }
                let (b0, b1) = (self.vertices[j], self.vertices[(j + 1) % n]);
                if segment_intersection(a0, a1, b0, b1).is_some() {
                    return true;
                }
            }
        }
        false
    }
}
