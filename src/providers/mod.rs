//! Query contracts for the collaborators the planner consumes.
//!
//! Elevation, airspace and coordinate transformation are owned by the
//! caller and injected into each component. Nothing here is global.
//!
//! - [`ElevationQuery`]: ground elevation with degraded-result signalling
//! - [`AirspaceQuery`]: lowest restricted airspace floor at a position
//! - [`TransformationProvider`]: geodetic <-> local tangent plane
//! - [`RecoveryStatus`]: whether a degraded elevation query may recover

mod synthetic;
mod tangent_plane;

pub use synthetic::{AirspaceZone, FlatTerrain, FnTerrain, NoTerrain, StaticAirspace};
pub use tangent_plane::LocalTangentPlane;

use crate::core::{GeodeticPosition, LocalVector3, Orientation};

/// Elevation answer for one position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElevationEstimate {
    /// Ground elevation (m, same datum as the query position)
    pub elevation: f64,
    /// Resolution the provider could actually deliver (m)
    pub achieved_resolution: f64,
}

impl ElevationEstimate {
    /// True if the provider answered coarser than requested
    pub fn is_degraded(&self, desired_resolution: f64) -> bool {
        self.achieved_resolution > desired_resolution
    }
}

/// One ground sample along a path
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundSample {
    /// Position on the path (elevation = ground)
    pub position: GeodeticPosition,
    /// Distance from the path start (m)
    pub distance: f64,
    /// False when no data was available and the value was carried over
    pub available: bool,
}

/// Ordered ground samples between two positions
#[derive(Clone, Debug, Default)]
pub struct GroundProfile {
    /// Samples from start to end inclusive
    pub samples: Vec<GroundSample>,
    /// Lowest sampled ground elevation
    pub min: f64,
    /// Highest sampled ground elevation
    pub max: f64,
    /// Number of samples answered at a worse resolution than requested
    pub degraded: usize,
    /// Number of samples without any data
    pub missing: usize,
}

impl GroundProfile {
    /// True if any sample had no data
    pub fn has_missing(&self) -> bool {
        self.missing > 0
    }
}

/// Ground elevation contract.
pub trait ElevationQuery: Send + Sync {
    /// Ground elevation at `position` (its elevation field is ignored).
    ///
    /// Returns `None` only when no data at all is available. A worse
    /// than requested answer is signalled through `achieved_resolution`.
    fn elevation(
        &self,
        position: &GeodeticPosition,
        desired_resolution: f64,
    ) -> Option<ElevationEstimate>;

    /// Sample the ground every `spacing` metres from `a` to `b`.
    ///
    /// `length` is the horizontal distance between the two positions; the
    /// default implementation interpolates straight in lat/lon. Missing
    /// samples carry the last known value (or the first later one).
    fn sample_ground_along(
        &self,
        a: &GeodeticPosition,
        b: &GeodeticPosition,
        length: f64,
        spacing: f64,
    ) -> GroundProfile {
        let steps = if spacing > 0.0 && length > 0.0 {
            (length / spacing).ceil().max(1.0) as usize
        } else {
            1
        };

        let mut profile = GroundProfile {
            samples: Vec::with_capacity(steps + 1),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            degraded: 0,
            missing: 0,
        };
        let mut last_known: Option<f64> = None;

        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let pos = a.interpolate(b, t);
            let estimate = self.elevation(&pos, spacing);
            let (ground, available) = match estimate {
                Some(est) => {
                    if est.is_degraded(spacing) {
                        profile.degraded += 1;
                    }
                    last_known = Some(est.elevation);
                    (est.elevation, true)
                }
                None => {
                    profile.missing += 1;
                    (last_known.unwrap_or(f64::NAN), false)
                }
            };
            profile.samples.push(GroundSample {
                position: pos.with_elevation(ground),
                distance: length * t,
                available,
            });
        }

        backfill_missing(&mut profile.samples);

        for s in &profile.samples {
            if s.position.elevation.is_finite() {
                profile.min = profile.min.min(s.position.elevation);
                profile.max = profile.max.max(s.position.elevation);
            }
        }
        if !profile.min.is_finite() {
            profile.min = 0.0;
            profile.max = 0.0;
        }
        profile
    }
}

/// Fill leading gaps (no earlier known value) from the first known sample.
fn backfill_missing(samples: &mut [GroundSample]) {
    let first_known = samples
        .iter()
        .find(|s| s.position.elevation.is_finite())
        .map(|s| s.position.elevation);
    if let Some(value) = first_known {
        for s in samples.iter_mut() {
            if s.position.elevation.is_finite() {
                break;
            }
            s.position.elevation = value;
        }
    }
}

/// Restricted airspace floor
#[derive(Clone, Debug, PartialEq)]
pub struct AirspaceFloor {
    /// Airspace name
    pub name: String,
    /// Floor altitude (m, same datum as the query position)
    pub floor_altitude: f64,
}

/// Airspace ceiling contract.
pub trait AirspaceQuery: Send + Sync {
    /// Lowest-floor restricted airspace above `position`, if any.
    fn lowest_floor(
        &self,
        position: &GeodeticPosition,
        ground_elevation: f64,
    ) -> Option<AirspaceFloor>;
}

/// Geodetic <-> mission-local frame conversion.
pub trait TransformationProvider: Send + Sync {
    /// Geodetic position to local coordinates
    fn to_local(&self, position: &GeodeticPosition) -> LocalVector3;

    /// Local coordinates to geodetic position
    fn to_geodetic(&self, local: &LocalVector3) -> GeodeticPosition;

    /// Geographic heading (degrees) to heading in the local frame
    fn yaw_to_local(&self, yaw: f64) -> f64;

    /// Local-frame heading (degrees) to geographic heading
    fn yaw_from_local(&self, yaw: f64) -> f64;

    /// Shift a camera position so the navigation centre lands where the
    /// camera should be. `offset` is the camera offset in body frame
    /// (forward, right, down).
    fn compensate_uncentricity(
        &self,
        position: &LocalVector3,
        orientation: &Orientation,
        offset: &LocalVector3,
    ) -> LocalVector3;
}

/// Network/service status for deciding whether a retry is worthwhile.
pub trait RecoveryStatus: Send + Sync {
    /// True if elevation data may become available later
    fn recovery_possible(&self) -> bool;
}

/// Status that never expects recovery
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverRecovers;

impl RecoveryStatus for NeverRecovers {
    fn recovery_possible(&self) -> bool {
        false
    }
}
