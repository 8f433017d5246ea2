//! Scan lines in the mission-local frame.

use std::sync::Arc;

use crate::core::{LocalVector3, Point2};
use crate::error::{PlanError, Result};
use crate::providers::GroundProfile;

/// One survey scan line.
///
/// `is_rot90 == false` lines run north-south and are stacked along x;
/// rotated lines run east-west and are stacked along y. A forward line is
/// flown towards increasing along-track coordinate.
#[derive(Clone, Debug)]
pub struct FlightLine {
    corners: Vec<LocalVector3>,
    /// Unique line identifier
    pub line_id: u32,
    /// Offset of the line from the reference axis (meters)
    pub parallel_coordinate: f64,
    /// Flown towards increasing along-track coordinate
    pub is_forward: bool,
    /// Scan axis rotated by 90 degrees
    pub is_rot90: bool,
    profile: Option<Arc<GroundProfile>>,
}

impl FlightLine {
    /// Create from at least two corners.
    ///
    /// `is_forward` is derived from the corner order.
    pub fn new(
        line_id: u32,
        corners: Vec<LocalVector3>,
        parallel_coordinate: f64,
        is_rot90: bool,
    ) -> Result<Self> {
        if corners.len() < 2 {
            return Err(PlanError::TooFewCorners {
                line_id,
                count: corners.len(),
            });
        }
        let mut line = Self {
            corners,
            line_id,
            parallel_coordinate,
            is_forward: true,
            is_rot90,
            profile: None,
        };
        line.is_forward = line.along(&line.end()) >= line.along(&line.start());
        Ok(line)
    }

    /// Corner points in flight order
    pub fn corners(&self) -> &[LocalVector3] {
        &self.corners
    }

    /// First corner
    pub fn start(&self) -> LocalVector3 {
        self.corners[0]
    }

    /// Last corner
    pub fn end(&self) -> LocalVector3 {
        self.corners[self.corners.len() - 1]
    }

    /// Along-track coordinate of a point for this line's scan axis
    #[inline]
    pub fn along(&self, p: &LocalVector3) -> f64 {
        if self.is_rot90 { p.x } else { p.y }
    }

    /// Horizontal polyline length
    pub fn length(&self) -> f64 {
        self.corners
            .windows(2)
            .map(|w| w[0].horizontal_distance(&w[1]))
            .sum()
    }

    /// Horizontal unit direction from start to end
    pub fn direction(&self) -> LocalVector3 {
        let d = self.end() - self.start();
        LocalVector3::new(d.x, d.y, 0.0).normalize()
    }

    /// Cached ground profile, if attached and still valid
    pub fn profile(&self) -> Option<&GroundProfile> {
        self.profile.as_deref()
    }

    /// Attach a precomputed ground profile
    pub fn with_profile(mut self, profile: Arc<GroundProfile>) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Copy with new corners; drops the cached profile.
    pub fn with_corners(&self, corners: Vec<LocalVector3>) -> Result<Self> {
        Self::new(self.line_id, corners, self.parallel_coordinate, self.is_rot90)
    }

    /// Same line flown the other way
    pub fn mirrored(&self) -> Self {
        let mut corners = self.corners.clone();
        corners.reverse();
        Self {
            corners,
            line_id: self.line_id,
            parallel_coordinate: self.parallel_coordinate,
            is_forward: !self.is_forward,
            is_rot90: self.is_rot90,
            profile: None,
        }
    }

    /// Copy with the first and last corner replaced.
    pub(crate) fn with_endpoints(&self, start: LocalVector3, end: LocalVector3) -> Self {
        let mut corners = self.corners.clone();
        let last = corners.len() - 1;
        corners[0] = start;
        corners[last] = end;
        Self {
            corners,
            profile: None,
            ..self.clone()
        }
    }

    /// Point at horizontal distance `distance` from the start
    pub fn point_at(&self, distance: f64) -> LocalVector3 {
        let mut remaining = distance.max(0.0);
        for w in self.corners.windows(2) {
            let seg = w[0].horizontal_distance(&w[1]);
            if remaining <= seg && seg > 0.0 {
                return w[0].lerp(&w[1], remaining / seg);
            }
            remaining -= seg;
        }
        self.end()
    }

    /// Points every `spacing` meters from start to end, end included.
    ///
    /// Returns `(distance from start, point)` pairs.
    pub fn sample(&self, spacing: f64) -> Vec<(f64, LocalVector3)> {
        let length = self.length();
        let mut samples = Vec::new();
        if spacing <= 0.0 || length <= 0.0 {
            samples.push((0.0, self.start()));
            if length > 0.0 {
                samples.push((length, self.end()));
            }
            return samples;
        }

        let steps = (length / spacing).ceil() as usize;
        let step = length / steps as f64;
        for i in 0..=steps {
            let d = step * i as f64;
            samples.push((d, self.point_at(d)));
        }
        samples
    }

    /// Horizontal projection of the corners
    pub fn footprint(&self) -> Vec<Point2> {
        self.corners.iter().map(|c| c.xy()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line() -> FlightLine {
        FlightLine::new(
            3,
            vec![LocalVector3::new(10.0, 0.0, 0.0), LocalVector3::new(10.0, 50.0, 0.0)],
            10.0,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_too_few_corners() {
        let err = FlightLine::new(9, vec![LocalVector3::ZERO], 0.0, false).unwrap_err();
        assert!(matches!(err, PlanError::TooFewCorners { line_id: 9, count: 1 }));
    }

    #[test]
    fn test_mirror() {
        let l = line();
        assert!(l.is_forward);
        let m = l.mirrored();
        assert!(!m.is_forward);
        assert_eq!(m.start(), l.end());
        assert_eq!(m.line_id, l.line_id);
        assert_relative_eq!(m.direction().y, -1.0);
    }

    #[test]
    fn test_sampling_even_steps() {
        let samples = line().sample(15.0);
        // 50 m in 4 equal steps of 12.5 m
        assert_eq!(samples.len(), 5);
        assert_relative_eq!(samples[1].0, 12.5);
        assert_relative_eq!(samples[4].1.y, 50.0);
    }

    #[test]
    fn test_corner_change_drops_profile() {
        let l = line().with_profile(Arc::new(GroundProfile::default()));
        assert!(l.profile().is_some());
        let moved = l
            .with_corners(vec![LocalVector3::new(10.0, -5.0, 0.0), LocalVector3::new(10.0, 55.0, 0.0)])
            .unwrap();
        assert!(moved.profile().is_none());
        assert_relative_eq!(moved.length(), 60.0);
    }
}
