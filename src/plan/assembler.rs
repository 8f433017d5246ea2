//! Assembly of refined lines into a flight plan.
//!
//! Per line, in flight order:
//!
//! 1. Altitude transition if the previous line ended lower than this one
//!    starts: a jump waypoint above the previous end, or for turn-radius
//!    platforms the previous waypoint raised in place
//! 2. One waypoint per refined position; the first one begins the line
//! 3. Trigger-on marker referencing the first waypoint
//! 4. Line direction marker
//!
//! The plan opens with a camera-enable marker and closes with trigger-off.
//! Platforms that plan individual images get `trigger_image` on every
//! waypoint instead of trigger markers.

use log::{debug, warn};

use crate::config::AssemblerSection;
use crate::core::Orientation;
use crate::error::Result;
use crate::lines::{FlightLine, RefineResult};
use crate::platform::PlatformDescription;
use crate::providers::TransformationProvider;

use super::camera_passes::CameraPasses;
use super::container::{FlightPlan, PhotoTrigger, PlanItem};
use super::reentry::ReentryPointId;
use super::waypoint::{AltitudeMode, Waypoint};

/// Builds flight plans from refined lines.
pub struct WaypointAssembler<'a> {
    platform: &'a PlatformDescription,
    transform: &'a dyn TransformationProvider,
    section: AssemblerSection,
}

impl<'a> WaypointAssembler<'a> {
    /// Create for one platform
    pub fn new(
        platform: &'a PlatformDescription,
        transform: &'a dyn TransformationProvider,
        section: AssemblerSection,
    ) -> Self {
        Self {
            platform,
            transform,
            section,
        }
    }

    /// Primary pass followed by the camera passes.
    pub fn assemble(&self, lines: &[(FlightLine, RefineResult)]) -> Result<FlightPlan> {
        let mut plan = self.fill_container(lines)?;
        CameraPasses::from_config(&self.section).apply(&mut plan, self.transform);
        Ok(plan)
    }

    /// Primary pass only.
    pub fn fill_container(&self, lines: &[(FlightLine, RefineResult)]) -> Result<FlightPlan> {
        let platform = self.platform;
        let individual = platform.plans_individual_image_positions;
        let speed = platform.planning_speed;
        let mut plan = FlightPlan::new();

        if !platform.no_images_after_camera_enable {
            plan.push(PlanItem::CameraMarker { enable: true })?;
        }

        let mut last_altitude: Option<f64> = None;
        let mut emitted_lines = 0usize;

        for (line, refined) in lines {
            if refined.is_empty() {
                warn!("[Assemble] line {} has no refined positions, skipped", line.line_id);
                continue;
            }
            let base = ReentryPointId {
                forward: line.is_forward,
                rot90: line.is_rot90,
                line_id: line.line_id,
                cell_no: self.section.cell_no,
                refinement: refined.len() > line.corners().len(),
                ..ReentryPointId::default()
            };

            let first = refined.local_positions[0];
            if let Some(previous) = last_altitude
                && previous < first.z
            {
                self.climb_before(&mut plan, first.z, base.with_ordinal(0))?;
            }

            for (i, local) in refined.local_positions.iter().enumerate() {
                let id = base.with_ordinal(i as u32 + 1);
                let wp = Waypoint {
                    position: refined.positions.get(i).copied().unwrap_or_else(|| self.transform.to_geodetic(local)),
                    local: *local,
                    altitude_mode: AltitudeMode::Linear,
                    speed,
                    orientation: refined.orientations.get(i).copied().unwrap_or_default(),
                    trigger_image: individual,
                    stop_time_s: if individual && platform.is_copter {
                        platform.image_stop_time_s
                    } else {
                        0.0
                    },
                    begin_flightline: i == 0,
                    reentry: id,
                    target_distance: refined.target_distances.get(i).copied().unwrap_or(0.0),
                };
                plan.push(PlanItem::Waypoint(wp))?;

                if i == 0 && !individual {
                    plan.push(PlanItem::PhotoTrigger(PhotoTrigger {
                        active: true,
                        distance: self.section.trigger_distance,
                        distance_max: self.section.trigger_distance_max,
                        reentry: Some(id),
                    }))?;
                }
            }

            plan.push(PlanItem::LineDirection {
                line_id: line.line_id,
                forward: line.is_forward,
                rot90: line.is_rot90,
            })?;
            last_altitude = refined.last_altitude();
            emitted_lines += 1;
        }

        if !individual && emitted_lines > 0 {
            plan.push(PlanItem::PhotoTrigger(PhotoTrigger {
                active: false,
                distance: 0.0,
                distance_max: 0.0,
                reentry: None,
            }))?;
        }

        debug!(
            "[Assemble] {} lines, {} waypoints, {} items",
            emitted_lines,
            plan.waypoint_count(),
            plan.len()
        );
        Ok(plan)
    }

    /// Climb to `altitude` at the end of the previous line.
    fn climb_before(&self, plan: &mut FlightPlan, altitude: f64, id: ReentryPointId) -> Result<()> {
        if self.platform.turn_radius > 0.0 {
            // a plane cannot climb on the spot
            if let Some(wp) = plan.last_waypoint_mut() {
                wp.local.z = altitude;
                wp.position = self.transform.to_geodetic(&wp.local);
            }
            return Ok(());
        }

        let Some(previous) = plan.last_waypoint() else {
            return Ok(());
        };
        let local = previous.local.with_z(altitude);
        let transition = Waypoint {
            position: self.transform.to_geodetic(&local),
            local,
            altitude_mode: AltitudeMode::Jump,
            speed: self.platform.planning_speed,
            orientation: Orientation::undefined(),
            trigger_image: false,
            stop_time_s: 0.0,
            begin_flightline: false,
            reentry: id,
            target_distance: 0.0,
        };
        plan.push(PlanItem::Waypoint(transition))
    }
}
