//! Simplified flight model replaying an assembled plan.
//!
//! Each waypoint-to-waypoint segment takes the longer of its horizontal
//! cruise time and its climb/sink time. `Jump` segments climb on the spot
//! first and cruise afterwards. The trajectory is sampled every
//! `time_step_s` seconds; every sample checks ground, datum, takeoff and
//! airspace clearance.
//!
//! Clearance bookkeeping is suppressed while the aircraft is still inside
//! the takeoff exclusion cylinder. Once it has left the cylinder the
//! suppression ends for the rest of the run.

use log::{debug, trace};

use crate::config::SimulationSection;
use crate::core::{GeodeticPosition, LocalVector3, Polygon};
use crate::plan::{AltitudeMode, FlightPlan, PlanItem, Waypoint};
use crate::platform::PlatformDescription;
use crate::providers::{AirspaceQuery, ElevationQuery, TransformationProvider};

use super::result::{ClearanceRange, SimDistance, SimResultData};

/// Lowest speed used when a waypoint carries none (m/s)
const MIN_SPEED: f64 = 0.1;

/// One simulation request: the plan plus the mission context it flies in.
#[derive(Clone, Debug, Default)]
pub struct SimJob {
    pub plan: FlightPlan,
    /// Takeoff position (elevation = ground at takeoff)
    pub takeoff: GeodeticPosition,
    /// Areas of interest in the local frame
    pub areas: Vec<Polygon>,
}

/// Borrowed collaborators for one run
pub struct SimContext<'a> {
    pub platform: &'a PlatformDescription,
    pub elevation: &'a dyn ElevationQuery,
    pub airspace: &'a dyn AirspaceQuery,
    pub transform: &'a dyn TransformationProvider,
    pub config: &'a SimulationSection,
}

/// Run one simulation synchronously.
pub fn simulate(job: &SimJob, ctx: &SimContext<'_>, run_id: u64) -> SimResultData {
    let mut run = Run::new(job, ctx, run_id);
    let mut previous: Option<&Waypoint> = None;

    for item in job.plan.items() {
        match item {
            PlanItem::PhotoTrigger(trigger) => run.set_trigger(trigger.active, trigger.distance),
            PlanItem::Waypoint(wp) => {
                if wp.trigger_image {
                    run.result.photo_count += 1;
                }
                run.result.flight_time_s += wp.stop_time_s;
                match previous {
                    Some(prev) => run.fly_segment(prev, wp),
                    None => {
                        run.sample(wp.local);
                    }
                }
                previous = Some(wp);
            }
            PlanItem::CameraMarker { .. } | PlanItem::LineDirection { .. } => {}
        }
    }

    run.finish()
}

/// Mutable state of one run
struct Run<'a> {
    ctx: &'a SimContext<'a>,
    areas: &'a [Polygon],
    takeoff: LocalVector3,
    left_takeoff: bool,
    trigger_distance: Option<f64>,
    since_last_photo: f64,
    last_ground: Option<f64>,
    result: SimResultData,
}

/// Clearances of one trajectory sample; `None` while suppressed
struct SampleClearance {
    ground: Option<f64>,
    airspace: Option<f64>,
}

impl<'a> Run<'a> {
    fn new(job: &'a SimJob, ctx: &'a SimContext<'a>, run_id: u64) -> Self {
        Self {
            ctx,
            areas: &job.areas,
            takeoff: ctx.transform.to_local(&job.takeoff),
            left_takeoff: false,
            trigger_distance: None,
            since_last_photo: 0.0,
            last_ground: None,
            result: SimResultData {
                run_id,
                elevation_data_available: true,
                ..SimResultData::default()
            },
        }
    }

    fn set_trigger(&mut self, active: bool, distance: f64) {
        if active {
            // one image at activation
            self.result.photo_count += 1;
            self.trigger_distance = (distance > 0.0).then_some(distance);
            self.since_last_photo = 0.0;
        } else {
            self.trigger_distance = None;
        }
    }

    fn fly_segment(&mut self, from: &Waypoint, to: &Waypoint) {
        let platform = self.ctx.platform;
        let (a, b) = (from.local, to.local);
        let horizontal = a.horizontal_distance(&b);
        let dz = b.z - a.z;

        let speed = if to.speed > 0.0 {
            to.speed
        } else {
            platform.planning_speed
        };
        let speed = speed.max(MIN_SPEED);
        let t_h = horizontal / speed;
        let t_v = if dz >= 0.0 {
            dz / platform.max_climb_rate.max(MIN_SPEED)
        } else {
            -dz / platform.max_sink_rate.max(MIN_SPEED)
        };
        let jump = to.altitude_mode == AltitudeMode::Jump;
        let duration = if jump { t_v + t_h } else { t_h.max(t_v) };

        let step = self.ctx.config.time_step_s.max(1e-3);
        let steps = ((duration / step).ceil() as usize).max(1);

        let mut segment = SimDistance {
            segment: self.result.distances.len(),
            ground_distance_min: f64::INFINITY,
            airspace_distance_min: None,
            aoi_collisions: Vec::new(),
        };

        for k in 1..=steps {
            let t = duration * k as f64 / steps as f64;
            let position = if jump {
                if t < t_v {
                    a.with_z(a.z + dz * t / t_v)
                } else {
                    let f = if t_h > 0.0 { (t - t_v) / t_h } else { 1.0 };
                    a.lerp(&b, f.min(1.0)).with_z(b.z)
                }
            } else if duration > 0.0 {
                a.lerp(&b, t / duration)
            } else {
                b
            };

            let clearance = self.sample(position);
            if let Some(ground) = clearance.ground {
                segment.ground_distance_min = segment.ground_distance_min.min(ground);
            }
            if let Some(airspace) = clearance.airspace {
                segment.airspace_distance_min =
                    Some(segment.airspace_distance_min.map_or(airspace, |m| m.min(airspace)));
            }
        }

        for (index, area) in self.areas.iter().enumerate() {
            if area.intersects_segment(a.xy(), b.xy()) {
                segment.aoi_collisions.push(index);
            }
        }

        if segment.ground_distance_min < platform.min_ground_distance {
            self.result.ground_violations += 1;
        }
        if segment.airspace_distance_min.is_some_and(|d| d < 0.0) {
            self.result.airspace_violations += 1;
        }

        if let Some(distance) = self.trigger_distance {
            self.since_last_photo += horizontal;
            let images = (self.since_last_photo / distance).floor();
            self.result.photo_count += images as usize;
            self.since_last_photo -= images * distance;
        }

        self.result.total_distance += a.distance(&b);
        self.result.flight_time_s += duration;

        trace!(
            "[Sim] segment {}: {:.1} s, ground min {:.1} m",
            segment.segment, duration, segment.ground_distance_min
        );
        self.result.distances.push(segment);
    }

    /// Check one trajectory position.
    fn sample(&mut self, position: LocalVector3) -> SampleClearance {
        let ctx = self.ctx;
        let config = ctx.config;

        if !self.left_takeoff {
            let near = position.horizontal_distance(&self.takeoff) < config.takeoff_exclusion_radius
                && position.z - self.takeoff.z < config.takeoff_exclusion_height;
            if near {
                return SampleClearance {
                    ground: None,
                    airspace: None,
                };
            }
            self.left_takeoff = true;
        }

        let geo = ctx.transform.to_geodetic(&position);
        let ground_abs = match ctx.elevation.elevation(&geo, config.elevation_resolution) {
            Some(estimate) => {
                self.last_ground = Some(estimate.elevation);
                Some(estimate.elevation)
            }
            None => {
                self.result.elevation_data_available = false;
                self.last_ground
            }
        };

        let result = &mut self.result;
        ClearanceRange::include(&mut result.msl_clearance, geo.elevation);
        ClearanceRange::include(&mut result.takeoff_clearance, position.z - self.takeoff.z);

        let ground = ground_abs.map(|g| {
            let clearance = geo.elevation - g;
            ClearanceRange::include(&mut result.ground_clearance, clearance);
            clearance
        });

        let airspace = ctx
            .airspace
            .lowest_floor(&geo, ground_abs.unwrap_or(geo.elevation))
            .map(|floor| floor.floor_altitude - geo.elevation);
        if let Some(d) = airspace {
            result.airspace_distance_min = Some(result.airspace_distance_min.map_or(d, |m| m.min(d)));
        }

        SampleClearance { ground, airspace }
    }

    fn finish(mut self) -> SimResultData {
        let result = &mut self.result;
        result.simulated_time_valid = result.flight_time_s < self.ctx.platform.max_flight_time_s;
        debug!(
            "[Sim] run {}: {} segments, {:.0} s, {} photos, {} ground / {} airspace violations",
            result.run_id,
            result.distances.len(),
            result.flight_time_s,
            result.photo_count,
            result.ground_violations,
            result.airspace_violations
        );
        self.result
    }
}
