//! # Akash-Plan: Survey Flight Planning Engine
//!
//! Plans camera-trigger flight paths for aerial survey drones and checks
//! them against terrain and airspace.
//!
//! ## Features
//!
//! - **Line ordering**: jump patterns so fixed-wing turns fit the turn radius
//! - **Terrain refinement**: altitude profiles held within a GSD tolerance,
//!   regression-based terrain normals for camera pointing
//! - **Plan assembly**: waypoints with resumable reentry ids, trigger
//!   markers and camera tilt/roll patterns
//! - **Simulation**: clearance, airspace, AOI and battery checks on a
//!   background worker with coalesced recomputation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use akash_plan::config::AkashConfig;
//! use akash_plan::core::{GeodeticPosition, Point2, Polygon};
//! use akash_plan::planner::MissionPlanner;
//! use akash_plan::providers::{FlatTerrain, LocalTangentPlane};
//!
//! let config = AkashConfig::default();
//! let frame = LocalTangentPlane::new(GeodeticPosition::new(47.0, 8.0, 400.0));
//! let terrain = FlatTerrain::new(400.0);
//!
//! let planner = MissionPlanner::new(&config, &terrain, &frame);
//! let area = Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(200.0, 120.0));
//! let mission = planner.plan_area(&area).unwrap();
//! println!("{} waypoints", mission.plan.waypoint_count());
//! ```
//!
//! ## Coordinate Frame
//!
//! Local coordinates are metres relative to the mission reference point:
//! - **X-east**, **Y-north**, **Z-up** (relative to the reference elevation)
//! - Headings are degrees clockwise from north
//! - Camera pitch 0 looks straight down
//!
//! ## Architecture
//!
//! - [`core`]: points, geodetic positions, orientations, polygons
//! - [`config`]: YAML configuration
//! - [`providers`]: elevation, airspace and frame contracts
//! - [`spatial`]: bucket index and point clustering
//! - [`terrain`]: terrain normals for camera pointing
//! - [`geometry`]: polygon splitting
//! - [`lines`]: scan lines, ordering, refinement
//! - [`corridor`]: corridor centre-path projection
//! - [`plan`]: waypoint assembly and the plan container
//! - [`sim`]: trajectory simulation
//! - [`planner`]: the end-to-end pipeline

pub mod config;
pub mod core;
pub mod corridor;
pub mod error;
pub mod geometry;
pub mod lines;
pub mod plan;
pub mod planner;
pub mod platform;
pub mod providers;
pub mod sim;
pub mod spatial;
pub mod terrain;

pub use config::AkashConfig;
pub use error::{PlanError, Result};
pub use planner::{MissionPlan, MissionPlanner};
pub use platform::{PlatformDescription, PreferredTurn};
