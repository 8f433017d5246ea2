//! Synthetic providers for tests, benches and the CLI.
//!
//! Real deployments inject DEM and airspace services; these stand in with
//! analytic terrain and circular airspace zones.

use crate::core::GeodeticPosition;

use super::{
    AirspaceFloor, AirspaceQuery, ElevationEstimate, ElevationQuery, LocalTangentPlane,
    TransformationProvider,
};

/// Constant ground elevation everywhere
#[derive(Clone, Copy, Debug)]
pub struct FlatTerrain {
    /// Ground elevation (m)
    pub elevation: f64,
    /// Resolution reported with every answer (m)
    pub resolution: f64,
}

impl FlatTerrain {
    /// Flat ground at `elevation`, answering at 1 m resolution
    pub fn new(elevation: f64) -> Self {
        Self {
            elevation,
            resolution: 1.0,
        }
    }
}

impl ElevationQuery for FlatTerrain {
    fn elevation(&self, _position: &GeodeticPosition, _res: f64) -> Option<ElevationEstimate> {
        Some(ElevationEstimate {
            elevation: self.elevation,
            achieved_resolution: self.resolution,
        })
    }
}

/// Provider without any elevation data
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTerrain;

impl ElevationQuery for NoTerrain {
    fn elevation(&self, _position: &GeodeticPosition, _res: f64) -> Option<ElevationEstimate> {
        None
    }
}

/// Terrain given by a closure over local (east, north) coordinates.
///
/// The closure returns the absolute ground elevation, or `None` where the
/// synthetic data set has a hole.
pub struct FnTerrain<F>
where
    F: Fn(f64, f64) -> Option<f64> + Send + Sync,
{
    frame: LocalTangentPlane,
    height: F,
    resolution: f64,
}

impl<F> FnTerrain<F>
where
    F: Fn(f64, f64) -> Option<f64> + Send + Sync,
{
    /// Create over the given frame
    pub fn new(frame: LocalTangentPlane, height: F) -> Self {
        Self {
            frame,
            height,
            resolution: 1.0,
        }
    }

    /// Report a different achieved resolution
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }
}

impl<F> ElevationQuery for FnTerrain<F>
where
    F: Fn(f64, f64) -> Option<f64> + Send + Sync,
{
    fn elevation(&self, position: &GeodeticPosition, _res: f64) -> Option<ElevationEstimate> {
        let local = self.frame.to_local(position);
        (self.height)(local.x, local.y).map(|elevation| ElevationEstimate {
            elevation,
            achieved_resolution: self.resolution,
        })
    }
}

/// Circular restricted airspace
#[derive(Clone, Debug)]
pub struct AirspaceZone {
    /// Airspace name
    pub name: String,
    /// Zone centre
    pub center: GeodeticPosition,
    /// Horizontal radius (m)
    pub radius: f64,
    /// Floor altitude (m)
    pub floor_altitude: f64,
}

/// Fixed set of circular airspace zones
#[derive(Clone, Debug, Default)]
pub struct StaticAirspace {
    zones: Vec<(AirspaceZone, LocalTangentPlane)>,
}

impl StaticAirspace {
    /// Empty airspace (no restrictions)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone
    pub fn with_zone(mut self, zone: AirspaceZone) -> Self {
        let frame = LocalTangentPlane::new(zone.center);
        self.zones.push((zone, frame));
        self
    }
}

impl AirspaceQuery for StaticAirspace {
    fn lowest_floor(
        &self,
        position: &GeodeticPosition,
        _ground_elevation: f64,
    ) -> Option<AirspaceFloor> {
        self.zones
            .iter()
            .filter(|(zone, frame)| frame.to_local(position).horizontal_length() <= zone.radius)
            .min_by(|(a, _), (b, _)| a.floor_altitude.total_cmp(&b.floor_altitude))
            .map(|(zone, _)| AirspaceFloor {
                name: zone.name.clone(),
                floor_altitude: zone.floor_altitude,
            })
    }
}
