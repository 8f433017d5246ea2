//! Unified configuration loading for akash-plan.
//!
//! Loads all configuration from a single YAML file. Every field has a
//! serde default, so partial files are fine.

mod akash;
mod assembler;
pub(crate) mod defaults;
mod error;
mod permute;
mod refine;
mod simulation;

// Re-export main types
pub use akash::AkashConfig;
pub use error::ConfigLoadError;

// Re-export section types
pub use assembler::AssemblerSection;
pub use permute::PermuteSection;
pub use refine::RefineSection;
pub use simulation::SimulationSection;
