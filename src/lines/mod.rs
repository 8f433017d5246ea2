//! Flight lines: generation, ordering and terrain refinement.
//!
//! - [`scan_lines`]: parallel lines over an area polygon
//! - [`LinePermuter`]: jump-pattern ordering for turn-radius platforms
//! - [`assure_turn_radius`]: turn-side endpoint alignment and extension
//! - [`LineRefiner`]: altitude refinement within a GSD tolerance

mod coverage;
mod flight_line;
mod permute;
mod refine;

pub use coverage::scan_lines;
pub use flight_line::FlightLine;
pub use permute::{LinePermuter, PermuteOptions, assure_turn_radius, run_order};
pub use refine::{
    AltitudeAdjustMode, AltitudeInterpolation, LineRefiner, NeighborEndpoints, RefineOptions,
    RefineResult, RefineSample,
};
