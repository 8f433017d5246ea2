//! Terrain-adaptive altitude refinement of single flight lines.
//!
//! # Follow terrain
//!
//! 1. Sample the ground every `sample_spacing` metres along the line; the
//!    target altitude of a sample is ground + nominal altitude
//! 2. Walk the samples and grow the current segment while every skipped
//!    sample stays within `tolerance / 2` of the altitude the drone would
//!    actually fly there (linear or jump model). When it stops fitting,
//!    the previous sample is kept and starts the next segment. First and
//!    last samples are always kept
//! 3. Rotary-wing platforms: every kept point becomes a [`FlightplanVertex`]
//!    whose drone position is moved onto the fitted terrain normal; points
//!    that end up closer than `min_waypoint_separation` are collapsed, and
//!    the interior is stably re-sorted along the line
//!
//! # Constant over reference
//!
//! The whole line is flown at the nominal altitude above the reference
//! point. The realized tolerance is the spread of ground distance over the
//! line relative to the altitude. Platforms that plan individual images get
//! their image positions re-sampled with a step that shrinks over high
//! ground.
//!
//! Missing elevation data never fails a refinement: the last known value
//! (or the reference elevation) is used and the result is flagged.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{RefineSection, defaults};
use crate::core::{GeodeticPosition, LocalVector3, Orientation, heading_of};
use crate::platform::PlatformDescription;
use crate::providers::{ElevationQuery, TransformationProvider};
use crate::spatial::{ElementId, PointCloudSplitter, SpatialBinIndex, bounding_box};
use crate::terrain::{FlightplanVertex, TerrainNormalEstimator};

use super::flight_line::FlightLine;

/// How the flight altitude relates to the ground
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeAdjustMode {
    /// Keep the nominal altitude above ground within the GSD tolerance
    #[default]
    FollowTerrain,
    /// Fly the nominal altitude above the reference elevation
    ConstantOverReference,
}

/// Altitude model between two kept waypoints
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeInterpolation {
    /// Altitude changes linearly along the segment
    #[default]
    Linear,
    /// Next altitude is asserted at the segment start
    Jump,
}

/// Refinement parameters
#[derive(Clone, Debug)]
pub struct RefineOptions {
    pub mode: AltitudeAdjustMode,
    pub interpolation: AltitudeInterpolation,
    /// Nominal altitude (m)
    pub altitude: f64,
    /// Accepted GSD deviation ratio
    pub gsd_tolerance: f64,
    /// Ground sample spacing (m)
    pub sample_spacing: f64,
    /// Neighbourhood radius for terrain normals (m)
    pub regression_radius: f64,
    /// Copter waypoints closer than this are merged (m)
    pub min_waypoint_separation: f64,
    /// In-flight trigger spacing at nominal altitude (m)
    pub trigger_distance: f64,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self::from_config(&RefineSection::default(), defaults::trigger_distance())
    }
}

impl RefineOptions {
    /// Options from the refinement section and the trigger spacing
    pub fn from_config(section: &RefineSection, trigger_distance: f64) -> Self {
        Self {
            mode: section.altitude_mode,
            interpolation: section.interpolation,
            altitude: section.altitude,
            gsd_tolerance: section.gsd_tolerance,
            sample_spacing: section.terrain_sample_spacing,
            regression_radius: section.regression_radius(),
            min_waypoint_separation: section.min_waypoint_separation,
            trigger_distance,
        }
    }

    /// Accepted altitude error in metres
    pub fn tolerance_m(&self) -> f64 {
        self.gsd_tolerance * self.altitude
    }
}

/// Endpoints of the lines flown before and after the refined one.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeighborEndpoints {
    /// Last position of the previous line
    pub previous_end: Option<LocalVector3>,
    /// First position of the next line
    pub next_start: Option<LocalVector3>,
}

/// One ground sample of the refinement trace
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefineSample {
    /// Distance from the line start (m)
    pub along: f64,
    /// Ground elevation, local frame (m)
    pub ground: f64,
    /// Altitude that would give the exact GSD
    pub target_altitude: f64,
    /// Altitude flown at this sample
    pub planned_altitude: f64,
    /// Sample became a waypoint
    pub kept: bool,
}

impl RefineSample {
    /// Planned minus target altitude
    pub fn altitude_error(&self) -> f64 {
        self.planned_altitude - self.target_altitude
    }
}

/// Refined positions of one line, plus quality figures.
#[derive(Clone, Debug, Default)]
pub struct RefineResult {
    pub line_id: u32,
    /// Waypoint positions
    pub positions: Vec<GeodeticPosition>,
    /// Same positions in the local frame
    pub local_positions: Vec<LocalVector3>,
    /// Camera orientation per position (geographic yaw)
    pub orientations: Vec<Orientation>,
    /// Surface normal per position
    pub normals: Vec<LocalVector3>,
    /// Distance from each position to its look-at point
    pub target_distances: Vec<f64>,
    /// Vertical clearance per position
    pub ground_distances: Vec<f64>,
    /// Lowest clearance, including transits to neighbouring lines
    pub ground_distance_min: f64,
    pub ground_distance_max: f64,
    /// Ground distance minus nominal altitude
    pub deviation_from_target_min: f64,
    pub deviation_from_target_max: f64,
    /// Realized GSD deviation (0 = exact, 1 = up to twice the target GSD)
    pub real_tolerance_gsd: f64,
    /// Some elevation answer was missing or coarser than requested
    pub elevation_degraded: bool,
    /// Per-sample trace
    pub samples: Vec<RefineSample>,
}

impl RefineResult {
    /// Number of waypoints
    pub fn len(&self) -> usize {
        self.local_positions.len()
    }

    /// True without waypoints
    pub fn is_empty(&self) -> bool {
        self.local_positions.is_empty()
    }

    /// Local altitude of the first waypoint
    pub fn first_altitude(&self) -> Option<f64> {
        self.local_positions.first().map(|p| p.z)
    }

    /// Local altitude of the last waypoint
    pub fn last_altitude(&self) -> Option<f64> {
        self.local_positions.last().map(|p| p.z)
    }
}

/// Ground lookups in the local frame with last-known fallback.
struct GroundSampler<'a> {
    elevation: &'a dyn ElevationQuery,
    transform: &'a dyn TransformationProvider,
    resolution: f64,
    last_known: Option<f64>,
    degraded: bool,
}

impl<'a> GroundSampler<'a> {
    fn ground_at(&mut self, p: &LocalVector3) -> f64 {
        let position = self.transform.to_geodetic(&p.with_z(0.0));
        match self.elevation.elevation(&position, self.resolution) {
            Some(estimate) => {
                if estimate.is_degraded(self.resolution) {
                    self.degraded = true;
                }
                let z = self.transform.to_local(&position.with_elevation(estimate.elevation)).z;
                self.last_known = Some(z);
                z
            }
            None => {
                self.degraded = true;
                self.last_known.unwrap_or(0.0)
            }
        }
    }

    /// Lowest clearance on the straight transit from `a` to `b`.
    fn transit_clearance(&mut self, a: LocalVector3, b: LocalVector3) -> Option<f64> {
        let length = a.horizontal_distance(&b);
        if length <= 0.0 {
            return None;
        }
        let profile = self.elevation.sample_ground_along(
            &self.transform.to_geodetic(&a),
            &self.transform.to_geodetic(&b),
            length,
            self.resolution,
        );
        if profile.degraded > 0 || profile.has_missing() {
            self.degraded = true;
        }

        profile
            .samples
            .iter()
            .filter(|s| s.position.elevation.is_finite())
            .map(|s| {
                let z = a.z + (b.z - a.z) * (s.distance / length);
                z - self.transform.to_local(&s.position).z
            })
            .reduce(f64::min)
    }
}

/// Refines lines against terrain for one platform.
pub struct LineRefiner<'a> {
    elevation: &'a dyn ElevationQuery,
    transform: &'a dyn TransformationProvider,
    platform: &'a PlatformDescription,
    options: RefineOptions,
    estimator: TerrainNormalEstimator,
}

impl<'a> LineRefiner<'a> {
    /// Create with injected providers
    pub fn new(
        elevation: &'a dyn ElevationQuery,
        transform: &'a dyn TransformationProvider,
        platform: &'a PlatformDescription,
        options: RefineOptions,
    ) -> Self {
        Self {
            elevation,
            transform,
            platform,
            options,
            estimator: TerrainNormalEstimator::default(),
        }
    }

    /// Options in use
    pub fn options(&self) -> &RefineOptions {
        &self.options
    }

    /// Refine one line.
    pub fn refine(&self, line: &FlightLine, neighbors: &NeighborEndpoints) -> RefineResult {
        let mut ground = GroundSampler {
            elevation: self.elevation,
            transform: self.transform,
            resolution: self.options.sample_spacing,
            last_known: None,
            degraded: false,
        };

        let result = match self.options.mode {
            AltitudeAdjustMode::FollowTerrain => self.follow_terrain(line, &mut ground),
            AltitudeAdjustMode::ConstantOverReference => self.constant_over_reference(line, &mut ground),
        };
        self.finish(result, neighbors, &mut ground)
    }

    fn follow_terrain(&self, line: &FlightLine, ground: &mut GroundSampler) -> RefineResult {
        let altitude = self.options.altitude;
        let interpolation = self.options.interpolation;
        let profile = line.sample(self.options.sample_spacing);

        let alongs: Vec<f64> = profile.iter().map(|(d, _)| *d).collect();
        let grounds: Vec<f64> = profile.iter().map(|(_, p)| ground.ground_at(p)).collect();
        let targets: Vec<f64> = grounds.iter().map(|g| g + altitude).collect();

        let kept = keep_samples(&alongs, &targets, self.options.tolerance_m() * 0.5, interpolation);
        let planned = planned_altitudes(&alongs, &targets, &kept, interpolation);

        let mut is_kept = vec![false; profile.len()];
        for &i in &kept {
            is_kept[i] = true;
        }
        let samples: Vec<RefineSample> = (0..profile.len())
            .map(|i| RefineSample {
                along: alongs[i],
                ground: grounds[i],
                target_altitude: targets[i],
                planned_altitude: planned[i],
                kept: is_kept[i],
            })
            .collect();

        let worst = samples.iter().map(|s| s.altitude_error().abs()).fold(0.0, f64::max);
        let mut result = RefineResult {
            line_id: line.line_id,
            real_tolerance_gsd: if altitude > 0.0 { worst / altitude } else { 0.0 },
            samples,
            ..RefineResult::default()
        };

        if self.platform.is_copter {
            self.recentre(line, &profile, &kept, &grounds, ground, &mut result);
        } else {
            let points = kept.iter().map(|&i| profile[i].1.with_z(targets[i])).collect();
            self.orient_along_path(line, points, &mut result);
        }
        result
    }

    /// Move copter waypoints onto the terrain normal of their targets.
    fn recentre(
        &self,
        line: &FlightLine,
        profile: &[(f64, LocalVector3)],
        kept: &[usize],
        grounds: &[f64],
        ground: &mut GroundSampler,
        result: &mut RefineResult,
    ) {
        let altitude = self.options.altitude;
        let radius = self.options.regression_radius;
        let d = line.direction();
        let side = LocalVector3::new(-d.y, d.x, 0.0) * self.options.sample_spacing;

        // the line plus one row on each side
        let mut terrain = Vec::with_capacity(profile.len() * 3);
        for ((_, p), g) in profile.iter().zip(grounds) {
            terrain.push(p.with_z(*g));
            for offset in [side, -side] {
                let q = *p + offset;
                terrain.push(q.with_z(ground.ground_at(&q)));
            }
        }
        let terrain_index = SpatialBinIndex::from_points(terrain.iter().map(|p| (*p, ())), radius);

        let last = kept.len().saturating_sub(1);
        let vertices: Vec<FlightplanVertex> = kept
            .iter()
            .enumerate()
            .map(|(k, &i)| {
                let center = profile[i].1.with_z(grounds[i]);
                let neighbors = terrain_index
                    .neighbors(&center, radius, i64::MIN)
                    .iter()
                    .map(|nb| center + nb.displacement)
                    .collect();
                let vertex = FlightplanVertex::new(center, center + LocalVector3::UNIT_Z * altitude)
                    .with_neighbors(neighbors);
                if k == 0 || k == last { vertex.into_fixed() } else { vertex }
            })
            .collect();

        let shifted: Vec<(FlightplanVertex, LocalVector3)> = vertices
            .iter()
            .map(|v| {
                let (moved, estimate) = self.estimator.shift_vertex(v);
                (moved, estimate.normal)
            })
            .collect();

        // drone positions start at nadir and move onto their normals
        let separation = self.options.min_waypoint_separation;
        let (min, max) = bounding_box(
            vertices
                .iter()
                .map(|v| v.way_point)
                .chain(shifted.iter().map(|(v, _)| v.way_point)),
        );
        let mut drones = SpatialBinIndex::new(min, max, separation.max(1e-3));
        let ids: Vec<ElementId> = vertices
            .iter()
            .enumerate()
            .map(|(k, v)| drones.add(v.way_point, k, k as i64))
            .collect();
        for (id, (moved, _)) in ids.iter().zip(&shifted) {
            drones.relocate(*id, moved.way_point);
        }

        let mut survivors: Vec<usize> = Vec::with_capacity(shifted.len());
        for cluster in PointCloudSplitter::new(separation).split_index(&drones) {
            let members: Vec<usize> = cluster.iter().filter_map(|id| drones.payload(*id).copied()).collect();
            let fixed: Vec<usize> = members.iter().copied().filter(|&k| shifted[k].0.fixed).collect();
            if fixed.is_empty() {
                survivors.extend(members.first().copied());
            } else {
                survivors.extend(fixed);
            }
        }
        survivors.sort_unstable();
        for (k, &i) in kept.iter().enumerate() {
            if survivors.binary_search(&k).is_err() {
                result.samples[i].kept = false;
            }
        }

        let start = line.start();
        if survivors.len() > 2 {
            let n = survivors.len();
            survivors[1..n - 1].sort_by(|&a, &b| {
                let pa = (shifted[a].0.way_point - start).dot(&d);
                let pb = (shifted[b].0.way_point - start).dot(&d);
                pa.total_cmp(&pb)
            });
        }
        if survivors.len() < shifted.len() {
            debug!(
                "[Refine] line {}: merged {} close waypoints",
                line.line_id,
                shifted.len() - survivors.len()
            );
        }

        let course_yaw = heading_of(d.x, d.y);
        let mut previous: Option<Orientation> = None;
        for (idx, &k) in survivors.iter().enumerate() {
            let (vertex, normal) = &shifted[k];
            let flying = if idx + 1 < survivors.len() {
                shifted[survivors[idx + 1]].0.way_point - vertex.way_point
            } else if idx > 0 {
                vertex.way_point - shifted[survivors[idx - 1]].0.way_point
            } else {
                d
            };
            let local = TerrainNormalEstimator::orientation_from_normal(flying, course_yaw, previous.as_ref(), *normal);
            previous = Some(local);

            result.local_positions.push(vertex.way_point);
            result.orientations.push(Orientation {
                yaw: local.yaw.map(|y| self.transform.yaw_from_local(y)),
                ..local
            });
            result.normals.push(*normal);
            result.target_distances.push(vertex.target_distance());
        }
    }

    /// Yaw along the path; pitch follows the path for image-position platforms.
    fn orient_along_path(&self, line: &FlightLine, points: Vec<LocalVector3>, result: &mut RefineResult) {
        let n = points.len();
        for i in 0..n {
            let delta = if i + 1 < n {
                points[i + 1] - points[i]
            } else if i > 0 {
                points[i] - points[i - 1]
            } else {
                line.end() - line.start()
            };
            let h = delta.horizontal_length();
            let (dir, slope) = if h > 1e-9 {
                (delta.with_z(0.0) * (1.0 / h), delta.z / h)
            } else {
                (line.direction(), 0.0)
            };
            let pitch = if self.platform.plans_individual_image_positions {
                slope.atan().to_degrees()
            } else {
                0.0
            };

            result.local_positions.push(points[i]);
            result.orientations.push(Orientation::new(
                0.0,
                pitch,
                self.transform.yaw_from_local(heading_of(dir.x, dir.y)),
            ));
            result
                .normals
                .push(LocalVector3::new(-slope * dir.x, -slope * dir.y, 1.0).normalize());
        }
    }

    fn constant_over_reference(&self, line: &FlightLine, ground: &mut GroundSampler) -> RefineResult {
        let altitude = self.options.altitude;
        let profile = line.sample(self.options.sample_spacing);
        let grounds: Vec<f64> = profile.iter().map(|(_, p)| ground.ground_at(p)).collect();

        let last = profile.len().saturating_sub(1);
        let samples = profile
            .iter()
            .zip(&grounds)
            .enumerate()
            .map(|(i, ((along, _), g))| RefineSample {
                along: *along,
                ground: *g,
                target_altitude: g + altitude,
                planned_altitude: altitude,
                kept: i == 0 || i == last,
            })
            .collect();

        // span of (ground distance - altitude) is the ground span
        let (g_min, g_max) = min_max(&grounds);
        let mut result = RefineResult {
            line_id: line.line_id,
            real_tolerance_gsd: if altitude > 0.0 { (g_max - g_min) / altitude } else { 0.0 },
            samples,
            ..RefineResult::default()
        };

        let points = if self.platform.plans_individual_image_positions {
            self.image_positions(line, ground)
        } else {
            line.corners().iter().map(|c| c.with_z(altitude)).collect()
        };
        self.orient_along_path(line, points, &mut result);
        result
    }

    /// Image positions at constant altitude with ground-compensated spacing.
    fn image_positions(&self, line: &FlightLine, ground: &mut GroundSampler) -> Vec<LocalVector3> {
        let altitude = self.options.altitude;
        let length = line.length();
        let min_step = self.platform.min_trigger_distance.max(1e-3);

        let mut points = Vec::new();
        let mut d = 0.0;
        while d < length - 1e-6 {
            let p = line.point_at(d);
            points.push(p.with_z(altitude));
            let clearance = altitude - ground.ground_at(&p);
            let step = if altitude > 0.0 && clearance > 0.0 {
                self.options.trigger_distance * clearance / altitude
            } else {
                min_step
            };
            d += step.max(min_step);
        }
        points.push(line.end().with_z(altitude));
        points
    }

    fn finish(
        &self,
        mut result: RefineResult,
        neighbors: &NeighborEndpoints,
        ground: &mut GroundSampler,
    ) -> RefineResult {
        let offset = self.platform.camera_offset;
        if offset.length_squared() > 0.0 {
            for (p, o) in result.local_positions.iter_mut().zip(&result.orientations) {
                *p = self.transform.compensate_uncentricity(p, o, &offset);
            }
        }

        let altitude = self.options.altitude;
        result.ground_distances = result
            .local_positions
            .iter()
            .map(|p| p.z - ground.ground_at(p))
            .collect();
        if result.target_distances.len() != result.local_positions.len() {
            result.target_distances = result.ground_distances.clone();
        }

        let (gd_min, gd_max) = min_max(&result.ground_distances);
        result.deviation_from_target_min = gd_min - altitude;
        result.deviation_from_target_max = gd_max - altitude;

        let mut clearance = gd_min;
        if let (Some(prev), Some(first)) = (neighbors.previous_end, result.local_positions.first())
            && let Some(c) = ground.transit_clearance(prev, *first)
        {
            clearance = clearance.min(c);
        }
        if let (Some(next), Some(last)) = (neighbors.next_start, result.local_positions.last())
            && let Some(c) = ground.transit_clearance(*last, next)
        {
            clearance = clearance.min(c);
        }
        result.ground_distance_min = clearance;
        result.ground_distance_max = gd_max;

        result.positions = result
            .local_positions
            .iter()
            .map(|p| self.transform.to_geodetic(p))
            .collect();
        result.elevation_degraded = ground.degraded;

        debug!(
            "[Refine] line {}: {} of {} samples kept, clearance {:.1}..{:.1} m, tolerance {:.3}{}",
            result.line_id,
            result.len(),
            result.samples.len(),
            result.ground_distance_min,
            result.ground_distance_max,
            result.real_tolerance_gsd,
            if result.elevation_degraded { " (degraded elevation)" } else { "" }
        );
        result
    }
}

/// Altitude flown at sample `i` between kept samples `a` and `b`.
fn planned_between(
    alongs: &[f64],
    targets: &[f64],
    a: usize,
    b: usize,
    i: usize,
    interpolation: AltitudeInterpolation,
) -> f64 {
    match interpolation {
        AltitudeInterpolation::Linear => {
            let span = alongs[b] - alongs[a];
            let t = if span > 0.0 { (alongs[i] - alongs[a]) / span } else { 0.0 };
            targets[a] + (targets[b] - targets[a]) * t
        }
        AltitudeInterpolation::Jump => targets[b],
    }
}

/// Greedy sample selection; first and last are always kept.
fn keep_samples(
    alongs: &[f64],
    targets: &[f64],
    max_error: f64,
    interpolation: AltitudeInterpolation,
) -> Vec<usize> {
    let n = targets.len();
    if n <= 2 {
        return (0..n).collect();
    }

    let mut kept = vec![0];
    let mut anchor = 0;
    for j in 2..n {
        let fits = (anchor + 1..j)
            .all(|i| (planned_between(alongs, targets, anchor, j, i, interpolation) - targets[i]).abs() <= max_error);
        if !fits {
            kept.push(j - 1);
            anchor = j - 1;
        }
    }
    kept.push(n - 1);
    kept
}

fn planned_altitudes(
    alongs: &[f64],
    targets: &[f64],
    kept: &[usize],
    interpolation: AltitudeInterpolation,
) -> Vec<f64> {
    let mut planned = targets.to_vec();
    for w in kept.windows(2) {
        for i in w[0] + 1..w[1] {
            planned[i] = planned_between(alongs, targets, w[0], w[1], i, interpolation);
        }
    }
    planned
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FlatTerrain, FnTerrain, LocalTangentPlane, NoTerrain};
    use approx::assert_relative_eq;

    const REFERENCE: f64 = 400.0;

    fn frame() -> LocalTangentPlane {
        LocalTangentPlane::new(GeodeticPosition::new(47.0, 8.0, REFERENCE))
    }

    fn north_line() -> FlightLine {
        FlightLine::new(
            7,
            vec![LocalVector3::new(10.0, 0.0, 0.0), LocalVector3::new(10.0, 50.0, 0.0)],
            10.0,
            false,
        )
        .unwrap()
    }

    fn options(mode: AltitudeAdjustMode, interpolation: AltitudeInterpolation) -> RefineOptions {
        RefineOptions {
            mode,
            interpolation,
            ..RefineOptions::default()
        }
    }

    fn kept_count(result: &RefineResult) -> usize {
        result.samples.iter().filter(|s| s.kept).count()
    }

    #[test]
    fn test_flat_terrain_keeps_endpoints() {
        let frame = frame();
        let terrain = FlatTerrain::new(REFERENCE);
        let platform = PlatformDescription::default();
        let refiner = LineRefiner::new(
            &terrain,
            &frame,
            &platform,
            options(AltitudeAdjustMode::FollowTerrain, AltitudeInterpolation::Linear),
        );

        let result = refiner.refine(&north_line(), &NeighborEndpoints::default());
        assert_eq!(result.len(), 2);
        assert_eq!(result.positions.len(), 2);
        assert_eq!(result.orientations.len(), 2);
        assert!(!result.elevation_degraded);
        assert_relative_eq!(result.ground_distance_min, 80.0, epsilon = 1e-6);
        assert_relative_eq!(result.real_tolerance_gsd, 0.0, epsilon = 1e-9);
        // flying north
        assert_relative_eq!(result.orientations[0].yaw.unwrap(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(result.positions[0].elevation, REFERENCE + 80.0, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolation_models() {
        let frame = frame();
        let terrain = FnTerrain::new(frame.clone(), |_, y| Some(REFERENCE + 0.2 * y));
        let platform = PlatformDescription::default();

        let linear = LineRefiner::new(
            &terrain,
            &frame,
            &platform,
            options(AltitudeAdjustMode::FollowTerrain, AltitudeInterpolation::Linear),
        )
        .refine(&north_line(), &NeighborEndpoints::default());
        // an even slope is followed exactly by a straight segment
        assert_eq!(kept_count(&linear), 2);

        let jump = LineRefiner::new(
            &terrain,
            &frame,
            &platform,
            options(AltitudeAdjustMode::FollowTerrain, AltitudeInterpolation::Jump),
        )
        .refine(&north_line(), &NeighborEndpoints::default());
        assert!(kept_count(&jump) > 2);
        let half_tolerance = jump_tolerance() * 0.5;
        for s in &jump.samples {
            assert!(s.altitude_error().abs() <= half_tolerance + 1e-6);
        }
        assert!(jump.real_tolerance_gsd <= 0.1 + 1e-9);
    }

    fn jump_tolerance() -> f64 {
        RefineOptions::default().tolerance_m()
    }

    #[test]
    fn test_bump_stays_within_tolerance() {
        let frame = frame();
        let terrain = FnTerrain::new(frame.clone(), |_, y| {
            Some(REFERENCE + 30.0 * (-((y - 25.0) / 8.0).powi(2)).exp())
        });
        let platform = PlatformDescription::default();
        let opts = options(AltitudeAdjustMode::FollowTerrain, AltitudeInterpolation::Linear);
        let half = opts.tolerance_m() * 0.5;
        let result = LineRefiner::new(&terrain, &frame, &platform, opts)
            .refine(&north_line(), &NeighborEndpoints::default());

        assert!(kept_count(&result) > 2);
        assert!(result.samples.first().unwrap().kept);
        assert!(result.samples.last().unwrap().kept);
        for s in result.samples.iter().filter(|s| !s.kept) {
            assert!(s.altitude_error().abs() <= half + 1e-9);
        }
    }

    #[test]
    fn test_constant_over_reference_tolerance() {
        let frame = frame();
        let terrain = FnTerrain::new(frame.clone(), |_, y| Some(REFERENCE + 0.2 * y));
        let platform = PlatformDescription::default();
        let mut opts = options(AltitudeAdjustMode::ConstantOverReference, AltitudeInterpolation::Linear);
        opts.altitude = 50.0;
        let result = LineRefiner::new(&terrain, &frame, &platform, opts)
            .refine(&north_line(), &NeighborEndpoints::default());

        assert_eq!(result.len(), 2);
        assert!(result.local_positions.iter().all(|p| (p.z - 50.0).abs() < 1e-9));
        // ground rises 10 m under a 50 m altitude
        assert_relative_eq!(result.real_tolerance_gsd, 0.2, epsilon = 1e-6);
        assert_relative_eq!(result.ground_distance_min, 40.0, epsilon = 1e-6);
        assert_relative_eq!(result.deviation_from_target_min, -10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_image_positions_tighten_over_high_ground() {
        let frame = frame();
        let platform = PlatformDescription {
            plans_individual_image_positions: true,
            ..PlatformDescription::default()
        };
        let mut opts = options(AltitudeAdjustMode::ConstantOverReference, AltitudeInterpolation::Linear);
        opts.altitude = 50.0;
        opts.trigger_distance = 10.0;

        let flat = FlatTerrain::new(REFERENCE);
        let low = LineRefiner::new(&flat, &frame, &platform, opts.clone())
            .refine(&north_line(), &NeighborEndpoints::default());
        let high_ground = FlatTerrain::new(REFERENCE + 25.0);
        let high = LineRefiner::new(&high_ground, &frame, &platform, opts)
            .refine(&north_line(), &NeighborEndpoints::default());

        // 50 m in 10 m steps, end included
        assert_eq!(low.len(), 6);
        assert!(high.len() > low.len());
    }

    #[test]
    fn test_copter_recentres_on_slope() {
        let frame = frame();
        let terrain = FnTerrain::new(frame.clone(), |x, y| Some(REFERENCE + 0.3 * x + 0.4 * y));
        let platform = PlatformDescription::copter();
        let result = LineRefiner::new(
            &terrain,
            &frame,
            &platform,
            options(AltitudeAdjustMode::FollowTerrain, AltitudeInterpolation::Jump),
        )
        .refine(&north_line(), &NeighborEndpoints::default());

        let n = result.len();
        assert!(n > 2);
        // endpoints are fixed
        assert_relative_eq!(result.local_positions[0].x, 10.0, epsilon = 1e-6);
        assert_relative_eq!(result.local_positions[n - 1].x, 10.0, epsilon = 1e-6);

        let expected = LocalVector3::new(-0.3, -0.4, 1.0).normalize();
        for i in 1..n - 1 {
            assert!(result.local_positions[i].x < 0.0);
            assert_relative_eq!(result.normals[i].x, expected.x, epsilon = 1e-6);
            assert_relative_eq!(result.normals[i].y, expected.y, epsilon = 1e-6);
            assert_relative_eq!(result.target_distances[i], 80.0, epsilon = 1e-6);
            let o = result.orientations[i];
            assert_relative_eq!(o.yaw.unwrap(), 0.3f64.atan2(0.4).to_degrees(), epsilon = 1e-4);
            assert_relative_eq!(o.pitch.unwrap(), expected.z.acos().to_degrees(), epsilon = 1e-4);
        }
        for w in result.local_positions[1..n - 1].windows(2) {
            assert!(w[0].y <= w[1].y);
        }
    }

    #[test]
    fn test_merged_waypoints_leave_trace() {
        let frame = frame();
        let terrain = FnTerrain::new(frame.clone(), |x, y| Some(REFERENCE + 0.3 * x + 0.4 * y));
        let platform = PlatformDescription::copter();
        let opts = options(AltitudeAdjustMode::FollowTerrain, AltitudeInterpolation::Jump);
        let spread = LineRefiner::new(&terrain, &frame, &platform, opts.clone())
            .refine(&north_line(), &NeighborEndpoints::default());

        let mut merging = opts;
        merging.min_waypoint_separation = 8.0 * merging.sample_spacing;
        let merged = LineRefiner::new(&terrain, &frame, &platform, merging)
            .refine(&north_line(), &NeighborEndpoints::default());

        assert!(merged.len() < spread.len());
        assert_eq!(kept_count(&merged), merged.len());
        assert_eq!(kept_count(&spread), spread.len());
        assert!(merged.samples.first().unwrap().kept);
        assert!(merged.samples.last().unwrap().kept);
    }

    #[test]
    fn test_missing_elevation_degrades() {
        let frame = frame();
        let platform = PlatformDescription::default();
        let result = LineRefiner::new(
            &NoTerrain,
            &frame,
            &platform,
            options(AltitudeAdjustMode::FollowTerrain, AltitudeInterpolation::Linear),
        )
        .refine(&north_line(), &NeighborEndpoints::default());

        assert!(result.elevation_degraded);
        assert!(result.real_tolerance_gsd.is_finite());
        assert_relative_eq!(result.ground_distance_min, 80.0, epsilon = 1e-6);
    }

    #[test]
    fn test_transit_clearance_counts() {
        let frame = frame();
        // a ridge crossing the transit only
        let terrain = FnTerrain::new(frame.clone(), |x, _| {
            Some(if (x + 5.0).abs() < 3.0 { REFERENCE + 60.0 } else { REFERENCE })
        });
        let platform = PlatformDescription::default();
        let refiner = LineRefiner::new(
            &terrain,
            &frame,
            &platform,
            options(AltitudeAdjustMode::FollowTerrain, AltitudeInterpolation::Linear),
        );

        let alone = refiner.refine(&north_line(), &NeighborEndpoints::default());
        assert_relative_eq!(alone.ground_distance_min, 80.0, epsilon = 1e-6);

        let neighbors = NeighborEndpoints {
            previous_end: Some(LocalVector3::new(-20.0, 0.0, 80.0)),
            next_start: None,
        };
        let joined = refiner.refine(&north_line(), &neighbors);
        assert_relative_eq!(joined.ground_distance_min, 20.0, epsilon = 1e-6);
        assert_relative_eq!(joined.ground_distance_max, 80.0, epsilon = 1e-6);
    }
}
