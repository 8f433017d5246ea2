//! Main AkashConfig and loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::platform::PlatformDescription;

use super::assembler::AssemblerSection;
use super::error::ConfigLoadError;
use super::permute::PermuteSection;
use super::refine::RefineSection;
use super::simulation::SimulationSection;

/// Full planning configuration loaded from YAML
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AkashConfig {
    /// Vehicle and camera platform
    #[serde(default)]
    pub platform: PlatformDescription,

    /// Line refinement settings
    #[serde(default)]
    pub refine: RefineSection,

    /// Coverage and line ordering settings
    #[serde(default)]
    pub permute: PermuteSection,

    /// Waypoint assembly settings
    #[serde(default)]
    pub assembler: AssemblerSection,

    /// Simulation settings
    #[serde(default)]
    pub simulation: SimulationSection,
}

impl AkashConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Load from default config path (configs/akash.yaml)
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new("configs/akash.yaml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse from YAML string and validate
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the planner cannot work with
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        positive("refine.altitude", self.refine.altitude)?;
        positive(
            "refine.terrain_sample_spacing",
            self.refine.terrain_sample_spacing,
        )?;
        positive(
            "refine.regression_radius_factor",
            self.refine.regression_radius_factor,
        )?;
        if !(0.0..=1.0).contains(&self.refine.gsd_tolerance) {
            return Err(ConfigLoadError::Invalid {
                field: "refine.gsd_tolerance",
                reason: format!("{} is outside [0, 1]", self.refine.gsd_tolerance),
            });
        }
        positive("permute.line_spacing", self.permute.line_spacing)?;
        if self.permute.gap_factor < 1.0 {
            return Err(ConfigLoadError::Invalid {
                field: "permute.gap_factor",
                reason: format!("{} is below 1", self.permute.gap_factor),
            });
        }
        positive("assembler.trigger_distance", self.assembler.trigger_distance)?;
        positive("platform.planning_speed", self.platform.planning_speed)?;
        positive("platform.max_climb_rate", self.platform.max_climb_rate)?;
        positive("platform.max_sink_rate", self.platform.max_sink_rate)?;
        if self.platform.turn_radius < 0.0 {
            return Err(ConfigLoadError::Invalid {
                field: "platform.turn_radius",
                reason: "must not be negative".to_string(),
            });
        }
        positive("simulation.time_step_s", self.simulation.time_step_s)?;
        positive(
            "simulation.elevation_resolution",
            self.simulation.elevation_resolution,
        )?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigLoadError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigLoadError::Invalid {
            field,
            reason: format!("{value} must be positive"),
        })
    }
}
