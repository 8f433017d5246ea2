//! Look-at target / drone position pairs.

use crate::core::LocalVector3;

/// A camera target on the ground and the drone position looking at it.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightplanVertex {
    /// Look-at point on the ground
    pub center_point: LocalVector3,
    /// Drone position
    pub way_point: LocalVector3,
    /// Must not be moved (line endpoints)
    pub fixed: bool,
    /// Ground points around `center_point` used for the normal fit
    pub neighbors: Vec<LocalVector3>,
    /// Surface triangle the target lies on, if known
    pub triangle: Option<[LocalVector3; 3]>,
}

impl FlightplanVertex {
    /// Create a movable vertex
    pub fn new(center_point: LocalVector3, way_point: LocalVector3) -> Self {
        Self {
            center_point,
            way_point,
            fixed: false,
            neighbors: Vec::new(),
            triangle: None,
        }
    }

    /// Mark as fixed
    pub fn into_fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Attach neighbour ground points
    pub fn with_neighbors(mut self, neighbors: Vec<LocalVector3>) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Distance from drone to target
    pub fn target_distance(&self) -> f64 {
        self.way_point.distance(&self.center_point)
    }

    /// Normal used to pick the hemisphere of a fitted normal.
    ///
    /// Triangle normal (facing up) if known, otherwise the current viewing
    /// direction reversed, otherwise straight up.
    pub fn rough_normal(&self) -> LocalVector3 {
        if let Some([a, b, c]) = self.triangle {
            let n = (b - a).cross(&(c - a));
            if n.length_squared() > 1e-18 {
                let n = n.normalize();
                return if n.z < 0.0 { -n } else { n };
            }
        }
        let view = self.way_point - self.center_point;
        if view.length_squared() > 1e-18 {
            view.normalize()
        } else {
            LocalVector3::UNIT_Z
        }
    }

    /// Copy with the drone moved onto `normal` at the same target distance.
    ///
    /// Fixed vertices are returned unchanged.
    pub fn shifted(&self, normal: LocalVector3) -> Self {
        if self.fixed {
            return self.clone();
        }
        Self {
            way_point: self.center_point + normal.normalize() * self.target_distance(),
            ..self.clone()
        }
    }
}
