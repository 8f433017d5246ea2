//! Line refinement configuration section.

use serde::{Deserialize, Serialize};

use crate::lines::{AltitudeAdjustMode, AltitudeInterpolation};

use super::defaults;

/// Refinement settings section
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefineSection {
    /// Nominal flight altitude above ground or reference (meters)
    #[serde(default = "defaults::altitude")]
    pub altitude: f64,

    /// How altitude follows the terrain
    #[serde(default)]
    pub altitude_mode: AltitudeAdjustMode,

    /// Altitude model between kept waypoints (follow-terrain only)
    #[serde(default)]
    pub interpolation: AltitudeInterpolation,

    /// Accepted GSD deviation (0 = exact, 1 = up to twice the target GSD)
    #[serde(default = "defaults::gsd_tolerance")]
    pub gsd_tolerance: f64,

    /// Ground sample spacing along the line (meters)
    #[serde(default = "defaults::terrain_sample_spacing")]
    pub terrain_sample_spacing: f64,

    /// Regression neighbourhood radius as a multiple of the sample spacing
    #[serde(default = "defaults::regression_radius_factor")]
    pub regression_radius_factor: f64,

    /// Waypoints closer than this are merged (meters, copter only)
    #[serde(default = "defaults::min_waypoint_separation")]
    pub min_waypoint_separation: f64,
}

impl Default for RefineSection {
    fn default() -> Self {
        Self {
            altitude: defaults::altitude(),
            altitude_mode: AltitudeAdjustMode::default(),
            interpolation: AltitudeInterpolation::default(),
            gsd_tolerance: defaults::gsd_tolerance(),
            terrain_sample_spacing: defaults::terrain_sample_spacing(),
            regression_radius_factor: defaults::regression_radius_factor(),
            min_waypoint_separation: defaults::min_waypoint_separation(),
        }
    }
}

impl RefineSection {
    /// Regression radius in meters
    pub fn regression_radius(&self) -> f64 {
        self.terrain_sample_spacing * self.regression_radius_factor
    }
}
