//! Flight simulation configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Simulation settings section
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Trajectory sample interval (seconds)
    #[serde(default = "defaults::time_step_s")]
    pub time_step_s: f64,

    /// Horizontal radius of the takeoff exclusion cylinder (meters)
    #[serde(default = "defaults::takeoff_exclusion_radius")]
    pub takeoff_exclusion_radius: f64,

    /// Height of the takeoff exclusion cylinder (meters)
    #[serde(default = "defaults::takeoff_exclusion_height")]
    pub takeoff_exclusion_height: f64,

    /// Requested elevation resolution (meters)
    #[serde(default = "defaults::elevation_resolution")]
    pub elevation_resolution: f64,

    /// Delay before re-running a simulation that lacked elevation data
    #[serde(default = "defaults::retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            time_step_s: defaults::time_step_s(),
            takeoff_exclusion_radius: defaults::takeoff_exclusion_radius(),
            takeoff_exclusion_height: defaults::takeoff_exclusion_height(),
            elevation_resolution: defaults::elevation_resolution(),
            retry_delay_ms: defaults::retry_delay_ms(),
        }
    }
}

impl SimulationSection {
    /// Retry delay as a duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
