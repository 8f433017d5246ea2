//! Plan waypoints.

use serde::{Deserialize, Serialize};

use crate::core::{GeodeticPosition, LocalVector3, Orientation};

use super::reentry::ReentryPointId;

/// How the altitude between the previous and this waypoint is flown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeMode {
    /// Reach this altitude first, then fly the leg level
    Jump,
    /// Change altitude linearly along the leg
    #[default]
    Linear,
    /// Altitude is not enforced on the leg
    Unasserted,
}

/// A waypoint of the assembled plan.
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    /// Geodetic position
    pub position: GeodeticPosition,
    /// Same position in the mission-local frame
    pub local: LocalVector3,
    pub altitude_mode: AltitudeMode,
    /// Commanded speed (m/s)
    pub speed: f64,
    /// Camera orientation (geographic yaw)
    pub orientation: Orientation,
    /// Take an image at this waypoint
    pub trigger_image: bool,
    /// Hover time at this waypoint (s)
    pub stop_time_s: f64,
    /// First waypoint of a flight line
    pub begin_flightline: bool,
    pub reentry: ReentryPointId,
    /// Distance to the look-at point (m), 0 if none
    pub target_distance: f64,
}
