//! Coverage and line ordering configuration section.

use serde::{Deserialize, Serialize};

use super::defaults;

/// Line ordering settings section
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PermuteSection {
    /// Distance between neighbouring scan lines (meters)
    #[serde(default = "defaults::line_spacing")]
    pub line_spacing: f64,

    /// Scan lines run east-west instead of north-south
    #[serde(default)]
    pub rot90: bool,

    /// Fly every line in its original direction
    #[serde(default)]
    pub only_one_direction: bool,

    /// Spacing above this multiple of the nominal spacing starts a new run
    #[serde(default = "defaults::gap_factor")]
    pub gap_factor: f64,
}

impl Default for PermuteSection {
    fn default() -> Self {
        Self {
            line_spacing: defaults::line_spacing(),
            rot90: false,
            only_one_direction: false,
            gap_factor: defaults::gap_factor(),
        }
    }
}
