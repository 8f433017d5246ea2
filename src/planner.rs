//! Mission planning pipeline.
//!
//! ```text
//! area polygon ──scan_lines──┐
//!                            ├──▶ permute ──▶ assure_turn_radius ──▶ refine ──▶ assemble
//! corridor path ─offset_lines┘                                       (per line)   + camera passes
//! ```
//!
//! Each stage is a pure transformation; the planner only wires the
//! configuration sections and the injected providers through them.

use log::{info, warn};

use crate::config::AkashConfig;
use crate::core::{GeodeticPosition, Polygon};
use crate::corridor::CorridorProjector;
use crate::error::{PlanError, Result};
use crate::lines::{
    FlightLine, LinePermuter, LineRefiner, NeighborEndpoints, PermuteOptions, RefineOptions,
    RefineResult, assure_turn_radius, scan_lines,
};
use crate::plan::{FlightPlan, WaypointAssembler};
use crate::providers::{ElevationQuery, TransformationProvider};
use crate::sim::SimJob;

/// Output of one planning pass
#[derive(Clone, Debug, Default)]
pub struct MissionPlan {
    /// Lines in flight order with their refinement
    pub lines: Vec<(FlightLine, RefineResult)>,
    /// Assembled plan
    pub plan: FlightPlan,
}

impl MissionPlan {
    /// Lowest ground clearance over all lines and transits
    pub fn ground_distance_min(&self) -> Option<f64> {
        self.lines
            .iter()
            .map(|(_, r)| r.ground_distance_min)
            .filter(|d| d.is_finite())
            .reduce(f64::min)
    }

    /// Worst realized GSD deviation over all lines
    pub fn worst_tolerance_gsd(&self) -> f64 {
        self.lines
            .iter()
            .map(|(_, r)| r.real_tolerance_gsd)
            .fold(0.0, f64::max)
    }

    /// Any line was refined on missing or coarse elevation data
    pub fn elevation_degraded(&self) -> bool {
        self.lines.iter().any(|(_, r)| r.elevation_degraded)
    }

    /// Simulation request for this plan
    pub fn sim_job(&self, takeoff: GeodeticPosition, areas: Vec<Polygon>) -> SimJob {
        SimJob {
            plan: self.plan.clone(),
            takeoff,
            areas,
        }
    }
}

/// Runs the planning pipeline for one configuration.
pub struct MissionPlanner<'a> {
    config: &'a AkashConfig,
    elevation: &'a dyn ElevationQuery,
    transform: &'a dyn TransformationProvider,
}

impl<'a> MissionPlanner<'a> {
    /// Create with injected providers
    pub fn new(
        config: &'a AkashConfig,
        elevation: &'a dyn ElevationQuery,
        transform: &'a dyn TransformationProvider,
    ) -> Self {
        Self {
            config,
            elevation,
            transform,
        }
    }

    /// Plan a survey over a local-frame area.
    pub fn plan_area(&self, area: &Polygon) -> Result<MissionPlan> {
        let permute = &self.config.permute;
        let lines = scan_lines(area, permute.line_spacing, permute.rot90, 1)?;
        if lines.is_empty() {
            return Err(PlanError::InvalidInput(format!(
                "area of {:.0} m² yields no scan lines at {:.1} m spacing",
                area.area(),
                permute.line_spacing
            )));
        }
        self.plan_lines(lines)
    }

    /// Plan a survey over a geodetic area outline.
    pub fn plan_area_geodetic(&self, outline: &[GeodeticPosition]) -> Result<MissionPlan> {
        if outline.len() < 3 {
            return Err(PlanError::InvalidInput(format!(
                "area outline has {} points (need at least 3)",
                outline.len()
            )));
        }
        let area = Polygon::new(outline.iter().map(|p| self.transform.to_local(p).xy()).collect());
        self.plan_area(&area)
    }

    /// Plan `line_count` lines along a corridor centre path.
    pub fn plan_corridor(&self, path: &[GeodeticPosition], line_count: usize) -> Result<MissionPlan> {
        if path.len() < 2 || line_count == 0 {
            return Err(PlanError::InvalidInput(format!(
                "corridor needs at least 2 path points and 1 line (got {} / {})",
                path.len(),
                line_count
            )));
        }
        let projector = CorridorProjector::new(path, self.transform);
        let lines = projector.offset_lines(line_count, self.config.permute.line_spacing, 1)?;
        self.plan_lines(lines)
    }

    /// Order, refine and assemble lines given in spatial order.
    pub fn plan_lines(&self, lines: Vec<FlightLine>) -> Result<MissionPlan> {
        let config = self.config;
        let platform = &config.platform;

        let permuter = LinePermuter::new(PermuteOptions::from_config(platform, &config.permute));
        let ordered = assure_turn_radius(&permuter.permute(&lines), platform.turn_radius);

        let refiner = LineRefiner::new(
            self.elevation,
            self.transform,
            platform,
            RefineOptions::from_config(&config.refine, config.assembler.trigger_distance),
        );

        let mut refined_lines = Vec::with_capacity(ordered.len());
        let mut previous_end = None;
        for line in ordered {
            let neighbors = NeighborEndpoints {
                previous_end,
                next_start: None,
            };
            let refined = refiner.refine(&line, &neighbors);
            previous_end = refined.local_positions.last().copied();
            refined_lines.push((line, refined));
        }

        let assembler = WaypointAssembler::new(platform, self.transform, config.assembler.clone());
        let plan = assembler.assemble(&refined_lines)?;

        let mission = MissionPlan {
            lines: refined_lines,
            plan,
        };
        if mission.elevation_degraded() {
            warn!("[Planner] elevation data missing or coarse on some lines");
        }
        info!(
            "[Planner] {} lines, {} waypoints, worst GSD deviation {:.2}",
            mission.lines.len(),
            mission.plan.waypoint_count(),
            mission.worst_tolerance_gsd()
        );
        Ok(mission)
    }
}
