//! Camera / vehicle orientation.

use serde::{Deserialize, Serialize};

use super::math::normalize_degrees;

/// Roll, pitch and yaw in degrees, each optionally undefined.
///
/// Pitch 0 points the camera straight down (nadir), 90 at the horizon.
/// Yaw is clockwise from north in [0, 360).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    /// Roll (degrees)
    pub roll: Option<f64>,
    /// Pitch (degrees, 0 = nadir)
    pub pitch: Option<f64>,
    /// Yaw (degrees from north)
    pub yaw: Option<f64>,
}

impl Orientation {
    /// Fully defined orientation
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            roll: Some(roll),
            pitch: Some(pitch),
            yaw: Some(normalize_degrees(yaw)),
        }
    }

    /// All components undefined
    pub fn undefined() -> Self {
        Self::default()
    }

    /// Nadir-looking camera with the given heading
    pub fn nadir(yaw: f64) -> Self {
        Self::new(0.0, 0.0, yaw)
    }

    /// True when every component is defined
    pub fn is_defined(&self) -> bool {
        self.roll.is_some() && self.pitch.is_some() && self.yaw.is_some()
    }

    /// Add offsets to the defined components, leaving undefined ones alone
    pub fn offset(&self, d_roll: f64, d_pitch: f64) -> Self {
        Self {
            roll: self.roll.map(|r| r + d_roll),
            pitch: self.pitch.map(|p| p + d_pitch),
            yaw: self.yaw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_yaw() {
        let o = Orientation::new(0.0, 10.0, -90.0);
        assert_eq!(o.yaw, Some(270.0));
    }

    #[test]
    fn test_offset_skips_undefined() {
        let o = Orientation {
            roll: None,
            pitch: Some(5.0),
            yaw: Some(10.0),
        };
        let shifted = o.offset(3.0, 2.0);
        assert_eq!(shifted.roll, None);
        assert_eq!(shifted.pitch, Some(7.0));
        assert!(!shifted.is_defined());
    }
}
