//! Error types for akash-plan.
//!
//! Only hard failures live here. Degraded elevation data, degenerate
//! geometry and clearance/tolerance violations are reported as data in
//! the refinement and simulation results.

use thiserror::Error;

/// Planning error type
#[derive(Error, Debug)]
pub enum PlanError {
    /// A flight line needs at least two corners
    #[error("Flight line {line_id} has {count} corners (need at least 2)")]
    TooFewCorners {
        /// Line identifier
        line_id: u32,
        /// Number of corners supplied
        count: usize,
    },

    /// A reentry point field does not fit its packed width
    #[error("Reentry point field '{field}' value {value} exceeds {bits} bits")]
    ReentryFieldOverflow {
        /// Field name
        field: &'static str,
        /// Offending value
        value: u64,
        /// Width of the packed field
        bits: u32,
    },

    /// Two waypoints in one plan share a reentry point
    #[error("Duplicate reentry point {0:#x}")]
    DuplicateReentryPoint(u64),

    /// Invalid planning input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Simulator worker could not be started
    #[error("Simulator worker failed: {0}")]
    Worker(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigLoadError),
}

/// Result alias
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanError::TooFewCorners {
            line_id: 7,
            count: 1,
        };
        assert_eq!(
            err.to_string(),
            "Flight line 7 has 1 corners (need at least 2)"
        );

        let err = PlanError::DuplicateReentryPoint(0x2a);
        assert_eq!(err.to_string(), "Duplicate reentry point 0x2a");
    }
}
