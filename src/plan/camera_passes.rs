//! Camera orientation post-passes over an assembled plan.
//!
//! Applied in this order, each independently:
//!
//! 1. Constant pitch/roll offset on every line waypoint. Target-locked
//!    offsets also move the waypoint so the look-at point stays where it
//!    was (rotation of the look vector scaled by the target distance)
//! 2. Toggle pattern: tilt and/or roll alternating per waypoint. Backward
//!    lines run the cycle from its far end
//! 3. Line-begin pitch: extra pitch on the first triggering waypoint after
//!    each line begin

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::AssemblerSection;
use crate::core::{LocalVector3, Orientation, heading_vector};
use crate::providers::TransformationProvider;

use super::container::{FlightPlan, PhotoTrigger, PlanItem};
use super::reentry::ReentryPointId;

/// Alternating camera pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TogglePattern {
    #[default]
    None,
    /// Pitch +a, -a
    Tilt2,
    /// Roll +a, -a
    Roll2,
    /// Pitch +a, roll +a, pitch -a, roll -a
    TiltRoll4,
}

impl TogglePattern {
    /// (roll, pitch) deltas of one cycle for amplitude `a`
    pub fn phases(self, a: f64) -> Vec<(f64, f64)> {
        match self {
            TogglePattern::None => Vec::new(),
            TogglePattern::Tilt2 => vec![(0.0, a), (0.0, -a)],
            TogglePattern::Roll2 => vec![(a, 0.0), (-a, 0.0)],
            TogglePattern::TiltRoll4 => vec![(0.0, a), (a, 0.0), (0.0, -a), (-a, 0.0)],
        }
    }
}

/// Post-pass parameters
#[derive(Clone, Copy, Debug, Default)]
pub struct CameraPasses {
    pub pitch_offset: f64,
    pub roll_offset: f64,
    pub target_locked: bool,
    pub toggle: TogglePattern,
    pub toggle_angle: f64,
    pub line_begin_pitch: f64,
}

impl CameraPasses {
    /// Parameters from the assembler section
    pub fn from_config(section: &AssemblerSection) -> Self {
        Self {
            pitch_offset: section.pitch_offset,
            roll_offset: section.roll_offset,
            target_locked: section.target_locked,
            toggle: section.toggle,
            toggle_angle: section.toggle_angle,
            line_begin_pitch: section.line_begin_pitch,
        }
    }

    /// Run all passes.
    pub fn apply(&self, plan: &mut FlightPlan, transform: &dyn TransformationProvider) {
        self.apply_offset(plan, transform);
        self.apply_toggle(plan);
        self.apply_line_begin_pitch(plan);
    }

    /// Constant offset, optionally target-locked.
    pub fn apply_offset(&self, plan: &mut FlightPlan, transform: &dyn TransformationProvider) {
        if self.pitch_offset == 0.0 && self.roll_offset == 0.0 {
            return;
        }
        let mut moved = 0usize;
        for wp in plan.waypoints_mut().filter(|w| !w.reentry.is_transition()) {
            let before = wp.orientation;
            let after = before.offset(self.roll_offset, self.pitch_offset);

            if self.target_locked
                && wp.target_distance > 0.0
                && let (Some(old), Some(new)) = (look_vector(&before, transform), look_vector(&after, transform))
            {
                let target = wp.local + old * wp.target_distance;
                wp.local = target - rotate_onto(old, new) * wp.target_distance;
                wp.position = transform.to_geodetic(&wp.local);
                moved += 1;
            }
            wp.orientation = after;
        }
        debug!(
            "[Camera] offset roll {:.1} pitch {:.1}, {} waypoints target-locked",
            self.roll_offset, self.pitch_offset, moved
        );
    }

    /// Alternating tilt/roll per line waypoint.
    pub fn apply_toggle(&self, plan: &mut FlightPlan) {
        let phases = self.toggle.phases(self.toggle_angle);
        if phases.is_empty() {
            return;
        }
        let period = phases.len();
        let mut index = 0usize;
        for wp in plan.waypoints_mut().filter(|w| !w.reentry.is_transition()) {
            if wp.begin_flightline {
                index = 0;
            }
            let phase = if wp.reentry.forward {
                index % period
            } else {
                period - 1 - (index % period)
            };
            let (d_roll, d_pitch) = phases[phase];
            wp.orientation = wp.orientation.offset(d_roll, d_pitch);
            index += 1;
        }
    }

    /// Pitch bump on the first triggering waypoint of every line.
    pub fn apply_line_begin_pitch(&self, plan: &mut FlightPlan) {
        if self.line_begin_pitch == 0.0 {
            return;
        }
        let trigger_points: HashSet<ReentryPointId> = plan
            .items()
            .iter()
            .filter_map(|item| match item {
                PlanItem::PhotoTrigger(PhotoTrigger {
                    active: true,
                    reentry: Some(id),
                    ..
                }) => Some(*id),
                _ => None,
            })
            .collect();

        let mut pending = false;
        for wp in plan.waypoints_mut() {
            if wp.begin_flightline {
                pending = true;
            }
            if pending && (wp.trigger_image || trigger_points.contains(&wp.reentry)) {
                wp.orientation = wp.orientation.offset(0.0, self.line_begin_pitch);
                pending = false;
            }
        }
    }
}

/// Unit look direction in the local frame; `None` without a yaw.
///
/// Pitch tilts the nadir vector forward, roll tilts it to the right.
fn look_vector(orientation: &Orientation, transform: &dyn TransformationProvider) -> Option<LocalVector3> {
    let yaw = transform.yaw_to_local(orientation.yaw?);
    let pitch = orientation.pitch.unwrap_or(0.0).to_radians();
    let roll = orientation.roll.unwrap_or(0.0).to_radians();
    let forward = heading_vector(yaw);
    let right = heading_vector(yaw + 90.0);
    Some(
        forward * (pitch.sin() * roll.cos()) + right * roll.sin()
            - LocalVector3::UNIT_Z * (pitch.cos() * roll.cos()),
    )
}

/// `from` rotated in the plane it spans with `to`, i.e. onto `to`.
fn rotate_onto(from: LocalVector3, to: LocalVector3) -> LocalVector3 {
    let axis = from.cross(&to);
    if axis.length_squared() < 1e-18 {
        return to;
    }
    let angle = from.dot(&to).clamp(-1.0, 1.0).acos();
    from.rotate_around(&axis.normalize(), angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeodeticPosition;
    use crate::plan::{AltitudeMode, Waypoint};
    use crate::providers::LocalTangentPlane;
    use approx::assert_relative_eq;

    fn frame() -> LocalTangentPlane {
        LocalTangentPlane::new(GeodeticPosition::new(47.0, 8.0, 400.0))
    }

    fn line_plan(forward: bool, count: u32) -> FlightPlan {
        let mut plan = FlightPlan::new();
        for ordinal in 1..=count {
            let local = LocalVector3::new(0.0, ordinal as f64 * 10.0, 50.0);
            let id = ReentryPointId {
                forward,
                line_id: 1,
                ordinal,
                ..ReentryPointId::default()
            };
            plan.push(PlanItem::Waypoint(Waypoint {
                position: frame().to_geodetic(&local),
                local,
                altitude_mode: AltitudeMode::Linear,
                speed: 10.0,
                orientation: Orientation::nadir(0.0),
                trigger_image: false,
                stop_time_s: 0.0,
                begin_flightline: ordinal == 1,
                reentry: id,
                target_distance: 50.0,
            }))
            .unwrap();
            if ordinal == 1 {
                plan.push(PlanItem::PhotoTrigger(PhotoTrigger {
                    active: true,
                    distance: 20.0,
                    distance_max: 25.0,
                    reentry: Some(id),
                }))
                .unwrap();
            }
        }
        plan
    }

    fn pitches(plan: &FlightPlan) -> Vec<f64> {
        plan.waypoints().map(|w| w.orientation.pitch.unwrap()).collect()
    }

    #[test]
    fn test_target_locked_offset() {
        let frame = frame();
        let mut plan = line_plan(true, 2);
        CameraPasses {
            pitch_offset: 45.0,
            target_locked: true,
            ..CameraPasses::default()
        }
        .apply(&mut plan, &frame);

        let wp = plan.waypoints().next().unwrap();
        assert_relative_eq!(wp.orientation.pitch.unwrap(), 45.0);
        // camera now looks forward-down at the same ground point (0, 10, 0)
        let d = 50.0 / 2f64.sqrt();
        assert_relative_eq!(wp.local.y, 10.0 - d, epsilon = 1e-9);
        assert_relative_eq!(wp.local.z, d, epsilon = 1e-9);
        assert_relative_eq!(wp.local.x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unlocked_offset_keeps_position() {
        let frame = frame();
        let mut plan = line_plan(true, 2);
        CameraPasses {
            roll_offset: 10.0,
            ..CameraPasses::default()
        }
        .apply(&mut plan, &frame);
        let wp = plan.waypoints().next().unwrap();
        assert_eq!(wp.local, LocalVector3::new(0.0, 10.0, 50.0));
        assert_eq!(wp.orientation.roll, Some(10.0));
    }

    #[test]
    fn test_toggle_reverses_on_backward_lines() {
        let passes = CameraPasses {
            toggle: TogglePattern::Tilt2,
            toggle_angle: 15.0,
            ..CameraPasses::default()
        };
        let mut forward = line_plan(true, 4);
        passes.apply_toggle(&mut forward);
        assert_eq!(pitches(&forward), vec![15.0, -15.0, 15.0, -15.0]);

        let mut backward = line_plan(false, 4);
        passes.apply_toggle(&mut backward);
        assert_eq!(pitches(&backward), vec![-15.0, 15.0, -15.0, 15.0]);
    }

    #[test]
    fn test_tilt_roll_cycle() {
        let phases = TogglePattern::TiltRoll4.phases(10.0);
        assert_eq!(phases.len(), 4);
        assert_eq!(phases[1], (10.0, 0.0));
        assert!(TogglePattern::None.phases(10.0).is_empty());
    }

    #[test]
    fn test_line_begin_pitch_once_per_line() {
        let mut plan = line_plan(true, 3);
        CameraPasses {
            line_begin_pitch: 5.0,
            ..CameraPasses::default()
        }
        .apply_line_begin_pitch(&mut plan);
        assert_eq!(pitches(&plan), vec![5.0, 0.0, 0.0]);
    }
}
