//! Vehicle / camera platform description consumed by every planning stage.

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::core::LocalVector3;

/// Preferred turn direction between flight lines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredTurn {
    /// No preference, any side
    #[default]
    None,
    /// Always turn left
    Left,
    /// Always turn right
    Right,
    /// Both sides, alternating per block of lines
    Both,
}

/// Platform capabilities and camera behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformDescription {
    /// Minimum turn radius (m), 0 for hovering platforms
    #[serde(default = "defaults::turn_radius")]
    pub turn_radius: f64,

    /// Preferred turn direction between lines
    #[serde(default)]
    pub preferred_turn: PreferredTurn,

    /// Minimum allowed ground clearance (m)
    #[serde(default = "defaults::min_ground_distance")]
    pub min_ground_distance: f64,

    /// Battery-limited flight time (s)
    #[serde(default = "defaults::max_flight_time_s")]
    pub max_flight_time_s: f64,

    /// Rotary-wing platform (enables terrain-normal re-centring)
    #[serde(default)]
    pub is_copter: bool,

    /// Plans each image position explicitly instead of distance triggering
    #[serde(default)]
    pub plans_individual_image_positions: bool,

    /// Camera takes no images right after being enabled (no enable marker needed)
    #[serde(default)]
    pub no_images_after_camera_enable: bool,

    /// Cruise speed used for planning (m/s)
    #[serde(default = "defaults::planning_speed")]
    pub planning_speed: f64,

    /// Maximum climb rate (m/s)
    #[serde(default = "defaults::max_climb_rate")]
    pub max_climb_rate: f64,

    /// Maximum sink rate (m/s)
    #[serde(default = "defaults::max_sink_rate")]
    pub max_sink_rate: f64,

    /// Shortest distance between two triggers the camera supports (m)
    #[serde(default = "defaults::min_trigger_distance")]
    pub min_trigger_distance: f64,

    /// Camera offset from the navigation centre in body frame
    /// (x = forward, y = right, z = down; metres)
    #[serde(default)]
    pub camera_offset: LocalVector3,

    /// Hover time per image for platforms that stop to shoot (s)
    #[serde(default)]
    pub image_stop_time_s: f64,
}

impl Default for PlatformDescription {
    fn default() -> Self {
        Self {
            turn_radius: defaults::turn_radius(),
            preferred_turn: PreferredTurn::None,
            min_ground_distance: defaults::min_ground_distance(),
            max_flight_time_s: defaults::max_flight_time_s(),
            is_copter: false,
            plans_individual_image_positions: false,
            no_images_after_camera_enable: false,
            planning_speed: defaults::planning_speed(),
            max_climb_rate: defaults::max_climb_rate(),
            max_sink_rate: defaults::max_sink_rate(),
            min_trigger_distance: defaults::min_trigger_distance(),
            camera_offset: LocalVector3::ZERO,
            image_stop_time_s: 0.0,
        }
    }
}

impl PlatformDescription {
    /// Typical multicopter: hovers, no turn radius, re-centres on terrain
    pub fn copter() -> Self {
        Self {
            turn_radius: 0.0,
            is_copter: true,
            planning_speed: 8.0,
            max_climb_rate: 4.0,
            max_sink_rate: 3.0,
            max_flight_time_s: 25.0 * 60.0,
            ..Self::default()
        }
    }

    /// Typical fixed-wing mapping plane
    pub fn fixed_wing(turn_radius: f64) -> Self {
        Self {
            turn_radius,
            is_copter: false,
            ..Self::default()
        }
    }

    /// True if the vehicle must fly arcs between lines
    pub fn needs_turn_radius(&self) -> bool {
        self.turn_radius > 0.0
    }
}
