//! Waypoint assembly and camera pass configuration section.

use serde::{Deserialize, Serialize};

use crate::plan::TogglePattern;

use super::defaults;

/// Waypoint assembly settings section
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssemblerSection {
    /// Survey cell number written into every reentry point
    #[serde(default)]
    pub cell_no: u32,

    /// Trigger distance at the lowest ground distance (meters)
    #[serde(default = "defaults::trigger_distance")]
    pub trigger_distance: f64,

    /// Trigger distance at the highest ground distance (meters)
    #[serde(default = "defaults::trigger_distance_max")]
    pub trigger_distance_max: f64,

    /// Constant pitch offset added to every line waypoint (degrees)
    #[serde(default)]
    pub pitch_offset: f64,

    /// Constant roll offset added to every line waypoint (degrees)
    #[serde(default)]
    pub roll_offset: f64,

    /// Move waypoints so the look-at point stays put under the offset
    #[serde(default)]
    pub target_locked: bool,

    /// Alternating tilt/roll pattern
    #[serde(default)]
    pub toggle: TogglePattern,

    /// Toggle amplitude (degrees)
    #[serde(default = "defaults::toggle_angle")]
    pub toggle_angle: f64,

    /// Extra pitch for the first triggering waypoint of each line (degrees)
    #[serde(default)]
    pub line_begin_pitch: f64,
}

impl Default for AssemblerSection {
    fn default() -> Self {
        Self {
            cell_no: 0,
            trigger_distance: defaults::trigger_distance(),
            trigger_distance_max: defaults::trigger_distance_max(),
            pitch_offset: 0.0,
            roll_offset: 0.0,
            target_locked: false,
            toggle: TogglePattern::default(),
            toggle_angle: defaults::toggle_angle(),
            line_begin_pitch: 0.0,
        }
    }
}
