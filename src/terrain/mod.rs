//! Terrain-aware camera pointing for rotary-wing refinement.
//!
//! - [`FlightplanVertex`]: look-at target paired with a drone position
//! - [`TerrainNormalEstimator`]: plane regression with multicollinearity
//!   fallback and roll/pitch/yaw decomposition

mod normal;
mod vertex;

pub use normal::{
    NormalEstimate, NormalFit, POLE_FLIP_PITCH, POLE_FLIP_YAW, TerrainNormalEstimator,
    VIF_THRESHOLD,
};
pub use vertex::FlightplanVertex;
