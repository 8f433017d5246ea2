//! Geodetic positions.

use serde::{Deserialize, Serialize};

/// Vertical datum an elevation is measured against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeReference {
    /// WGS84 ellipsoid
    #[default]
    Ellipsoid,
    /// Geoid (mean sea level)
    Geoid,
}

/// Latitude/longitude in degrees plus elevation in metres.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct GeodeticPosition {
    /// Latitude (degrees, north positive)
    pub latitude: f64,
    /// Longitude (degrees, east positive)
    pub longitude: f64,
    /// Elevation (metres above `reference`)
    pub elevation: f64,
    /// Datum of `elevation`
    #[serde(default)]
    pub reference: AltitudeReference,
}

impl GeodeticPosition {
    /// Create a position referenced to the ellipsoid
    pub const fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
            reference: AltitudeReference::Ellipsoid,
        }
    }

    /// Copy with a different elevation
    pub fn with_elevation(&self, elevation: f64) -> Self {
        Self { elevation, ..*self }
    }

    /// Straight interpolation in latitude/longitude/elevation.
    ///
    /// Good enough for the sub-kilometre segments a survey line consists of.
    pub fn interpolate(&self, other: &GeodeticPosition, t: f64) -> GeodeticPosition {
        GeodeticPosition {
            latitude: self.latitude + (other.latitude - self.latitude) * t,
            longitude: self.longitude + (other.longitude - self.longitude) * t,
            elevation: self.elevation + (other.elevation - self.elevation) * t,
            reference: self.reference,
        }
    }
}
