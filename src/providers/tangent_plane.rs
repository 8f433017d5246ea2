//! Local tangent plane projection around a mission origin.

use crate::core::{GeodeticPosition, LocalVector3, Orientation, heading_vector, normalize_degrees};

use super::TransformationProvider;

/// WGS84 semi-major axis (m)
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 first eccentricity squared
const WGS84_E2: f64 = 6.694_379_990_14e-3;

/// Equirectangular tangent-plane projection on WGS84 radii at the origin.
///
/// Accurate to a few centimetres over the few kilometres a survey covers.
/// The local frame can be rotated so that +y points along `frame_heading`
/// (degrees from north), which lets scan lines run along an axis.
#[derive(Clone, Debug)]
pub struct LocalTangentPlane {
    origin: GeodeticPosition,
    frame_heading: f64,
    /// Metres per radian of latitude
    meridian_radius: f64,
    /// Metres per radian of longitude at the origin latitude
    parallel_radius: f64,
}

impl LocalTangentPlane {
    /// Create a north-aligned frame at `origin`
    pub fn new(origin: GeodeticPosition) -> Self {
        Self::with_heading(origin, 0.0)
    }

    /// Create a frame whose +y axis points along `frame_heading`
    pub fn with_heading(origin: GeodeticPosition, frame_heading: f64) -> Self {
        let lat = origin.latitude.to_radians();
        let s = lat.sin();
        let w = 1.0 - WGS84_E2 * s * s;
        let meridian_radius = WGS84_A * (1.0 - WGS84_E2) / w.powf(1.5);
        let prime_vertical = WGS84_A / w.sqrt();

        Self {
            origin,
            frame_heading: normalize_degrees(frame_heading),
            meridian_radius,
            parallel_radius: prime_vertical * lat.cos(),
        }
    }

    /// Frame origin (local zero)
    pub fn origin(&self) -> &GeodeticPosition {
        &self.origin
    }

    /// Heading of the local +y axis
    pub fn frame_heading(&self) -> f64 {
        self.frame_heading
    }
}

impl TransformationProvider for LocalTangentPlane {
    fn to_local(&self, position: &GeodeticPosition) -> LocalVector3 {
        let east = (position.longitude - self.origin.longitude).to_radians() * self.parallel_radius;
        let north = (position.latitude - self.origin.latitude).to_radians() * self.meridian_radius;
        LocalVector3::new(east, north, position.elevation - self.origin.elevation)
            .rotate_z(self.frame_heading.to_radians())
    }

    fn to_geodetic(&self, local: &LocalVector3) -> GeodeticPosition {
        let enu = local.rotate_z(-self.frame_heading.to_radians());
        GeodeticPosition {
            latitude: self.origin.latitude + (enu.y / self.meridian_radius).to_degrees(),
            longitude: self.origin.longitude + (enu.x / self.parallel_radius).to_degrees(),
            elevation: self.origin.elevation + enu.z,
            reference: self.origin.reference,
        }
    }

    fn yaw_to_local(&self, yaw: f64) -> f64 {
        normalize_degrees(yaw - self.frame_heading)
    }

    fn yaw_from_local(&self, yaw: f64) -> f64 {
        normalize_degrees(yaw + self.frame_heading)
    }

    fn compensate_uncentricity(
        &self,
        position: &LocalVector3,
        orientation: &Orientation,
        offset: &LocalVector3,
    ) -> LocalVector3 {
        let Some(yaw) = orientation.yaw else {
            return *position;
        };
        let local_yaw = self.yaw_to_local(yaw);
        let forward = heading_vector(local_yaw);
        let right = heading_vector(local_yaw + 90.0);
        let camera_offset = forward * offset.x + right * offset.y - LocalVector3::UNIT_Z * offset.z;
        *position - camera_offset
    }
}
