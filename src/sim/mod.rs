//! Trajectory validation.
//!
//! - [`simulate`]: one synchronous run over an assembled plan
//! - [`FlightSimulator`]: worker thread with coalesced recompute requests
//! - [`SimResultData`]: clearance, airspace, AOI and timing aggregates

mod model;
mod result;
mod runner;

pub use model::{SimContext, SimJob, simulate};
pub use result::{ClearanceRange, SimDistance, SimResultData};
pub use runner::{FlightSimulator, SimEnvironment, SimulatorState};
