//! Flight plan assembly.
//!
//! - [`ReentryPointId`]: resumable waypoint identifier with packed layout
//! - [`FlightPlan`]: ordered markers and waypoints, unique reentry points
//! - [`WaypointAssembler`]: refined lines to plan items
//! - [`CameraPasses`]: orientation post-processing

mod assembler;
mod camera_passes;
mod container;
mod reentry;
mod waypoint;

pub use assembler::WaypointAssembler;
pub use camera_passes::{CameraPasses, TogglePattern};
pub use container::{FlightPlan, PhotoTrigger, PlanItem};
pub use reentry::ReentryPointId;
pub use waypoint::{AltitudeMode, Waypoint};
