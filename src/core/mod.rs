//! Core value types shared by every planning stage.
//!
//! - [`LocalVector3`] and [`Point2`]: mission-local Cartesian coordinates
//! - [`GeodeticPosition`]: latitude/longitude/elevation
//! - [`Orientation`]: roll/pitch/yaw with undefined components
//! - [`Polygon`]: simple polygons for areas of interest and survey cells

mod geodetic;
pub mod math;
mod orientation;
mod point;
mod polygon;

pub use geodetic::{AltitudeReference, GeodeticPosition};
pub use math::{angle_diff_degrees, heading_between, heading_of, heading_vector, normalize_degrees};
pub use orientation::Orientation;
pub use point::{LocalVector3, Point2};
pub use polygon::Polygon;
