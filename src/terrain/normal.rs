//! Terrain surface normals by multiple linear regression.
//!
//! The ground around a target is modelled as a plane `z = a x + b y + c`,
//! fitted by ordinary least squares on standardized coordinates.
//!
//! # Algorithm
//!
//! 1. Mean-centre and scale x, y, z by their standard deviations
//! 2. Variance inflation factors of the predictors are the diagonal of the
//!    inverse of their correlation matrix; a VIF above [`VIF_THRESHOLD`]
//!    (or a predictor without spread) means x and y are too collinear and
//!    the fit falls back to a finite-difference slope along the axis with
//!    the larger spread
//! 3. Otherwise solve the normal equations `XᵀX β = Xᵀz`
//! 4. Rescale the slopes and build `(-a, -b, 1)`, flipped into the
//!    hemisphere of the rough normal
//!
//! Fewer than 3 neighbours or a singular solve yields the vertical.

use log::trace;
use nalgebra::{DMatrix, DVector};

use crate::core::{LocalVector3, Orientation, angle_diff_degrees, heading_of, normalize_degrees};

use super::vertex::FlightplanVertex;

/// VIF above which predictors count as multicollinear
pub const VIF_THRESHOLD: f64 = 5.0;

/// Pitch (degrees) below which the pole flip is considered
pub const POLE_FLIP_PITCH: f64 = 20.0;

/// Yaw change (degrees) that triggers the pole flip
pub const POLE_FLIP_YAW: f64 = 120.0;

/// Standard deviation treated as "no spread"
const SPREAD_EPSILON: f64 = 1e-9;

/// How a normal was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalFit {
    /// Full plane regression
    Regression,
    /// Single-axis finite difference (multicollinear neighbours)
    SlopeFallback,
    /// Not enough information, vertical returned
    Vertical,
}

/// Fitted normal
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalEstimate {
    /// Unit normal
    pub normal: LocalVector3,
    /// Branch that produced it
    pub method: NormalFit,
}

impl NormalEstimate {
    fn vertical() -> Self {
        Self {
            normal: LocalVector3::UNIT_Z,
            method: NormalFit::Vertical,
        }
    }
}

/// Regression-based surface normal estimator.
#[derive(Clone, Copy, Debug)]
pub struct TerrainNormalEstimator {
    vif_threshold: f64,
}

impl Default for TerrainNormalEstimator {
    fn default() -> Self {
        Self {
            vif_threshold: VIF_THRESHOLD,
        }
    }
}

impl TerrainNormalEstimator {
    /// Create with a custom VIF threshold
    pub fn with_vif_threshold(vif_threshold: f64) -> Self {
        Self { vif_threshold }
    }

    /// Fit a surface normal to `neighbors`, oriented like `rough_normal`.
    pub fn estimate(&self, neighbors: &[LocalVector3], rough_normal: LocalVector3) -> NormalEstimate {
        let points: Vec<LocalVector3> = neighbors.iter().copied().filter(LocalVector3::is_finite).collect();
        if points.len() < 3 {
            return NormalEstimate::vertical();
        }

        let n = points.len() as f64;
        let mean = points.iter().fold(LocalVector3::ZERO, |acc, p| acc + *p) * (1.0 / n);

        let (mut sxx, mut syy, mut szz, mut sxy) = (0.0, 0.0, 0.0, 0.0);
        for p in &points {
            let d = *p - mean;
            sxx += d.x * d.x;
            syy += d.y * d.y;
            szz += d.z * d.z;
            sxy += d.x * d.y;
        }
        let sd_x = (sxx / n).sqrt();
        let sd_y = (syy / n).sqrt();
        let sd_z = (szz / n).sqrt();

        let collinear = if sd_x < SPREAD_EPSILON || sd_y < SPREAD_EPSILON {
            true
        } else {
            let r = (sxy / n) / (sd_x * sd_y);
            match max_vif(r) {
                Some(vif) => vif > self.vif_threshold,
                None => true,
            }
        };

        let estimate = if collinear {
            slope_fallback(&points, sd_x >= sd_y)
        } else if sd_z < SPREAD_EPSILON {
            // flat neighbourhood
            NormalEstimate {
                normal: LocalVector3::UNIT_Z,
                method: NormalFit::Regression,
            }
        } else {
            regression(&points, mean, [sd_x, sd_y, sd_z])
        };

        let normal = estimate.normal.normalize();
        let normal = if normal.dot(&rough_normal) < 0.0 { -normal } else { normal };
        trace!(
            "[Normal] {:?} fit over {} points: ({:.3}, {:.3}, {:.3})",
            estimate.method,
            points.len(),
            normal.x,
            normal.y,
            normal.z
        );
        NormalEstimate { normal, ..estimate }
    }

    /// Fit the normal at a vertex and move its drone position onto it.
    pub fn shift_vertex(&self, vertex: &FlightplanVertex) -> (FlightplanVertex, NormalEstimate) {
        let estimate = self.estimate(&vertex.neighbors, vertex.rough_normal());
        (vertex.shifted(estimate.normal), estimate)
    }

    /// Camera orientation looking along `-normal`, in the local frame.
    ///
    /// Yaw follows the horizontal part of the look direction. On flat
    /// ground it falls back to the flying direction, then to `course_yaw`.
    /// Close to nadir a yaw jump of more than [`POLE_FLIP_YAW`] against
    /// the previous orientation is avoided by turning 180° and mirroring
    /// the pitch about the pole.
    pub fn orientation_from_normal(
        flying_direction: LocalVector3,
        course_yaw: f64,
        previous: Option<&Orientation>,
        normal: LocalVector3,
    ) -> Orientation {
        let n = normal.normalize();
        let look = -n;
        let mut pitch = n.z.clamp(-1.0, 1.0).acos().to_degrees();

        let mut yaw = if look.horizontal_length() > 1e-9 {
            heading_of(look.x, look.y)
        } else if flying_direction.horizontal_length() > 1e-9 {
            heading_of(flying_direction.x, flying_direction.y)
        } else {
            normalize_degrees(course_yaw)
        };

        if let Some(prev_yaw) = previous.and_then(|p| p.yaw)
            && pitch < POLE_FLIP_PITCH
            && angle_diff_degrees(prev_yaw, yaw).abs() > POLE_FLIP_YAW
        {
            yaw = normalize_degrees(yaw + 180.0);
            pitch = -pitch;
        }

        Orientation::new(0.0, pitch, yaw)
    }
}

/// Largest VIF of two predictors with Pearson correlation `r`.
fn max_vif(r: f64) -> Option<f64> {
    let corr = DMatrix::from_row_slice(2, 2, &[1.0, r, r, 1.0]);
    let inv = corr.try_inverse()?;
    let vif = inv[(0, 0)].max(inv[(1, 1)]);
    // a numerically singular matrix can invert to garbage
    (vif.is_finite() && vif >= 1.0 - 1e-9).then_some(vif)
}

fn regression(points: &[LocalVector3], mean: LocalVector3, sd: [f64; 3]) -> NormalEstimate {
    let n = points.len();
    let x = DMatrix::from_fn(n, 2, |i, j| {
        let p = points[i];
        if j == 0 {
            (p.x - mean.x) / sd[0]
        } else {
            (p.y - mean.y) / sd[1]
        }
    });
    let z = DVector::from_fn(n, |i, _| (points[i].z - mean.z) / sd[2]);

    let xt = x.transpose();
    let xtx = &xt * &x;
    let xtz = &xt * &z;
    let Some(beta) = xtx.lu().solve(&xtz) else {
        return NormalEstimate::vertical();
    };
    if !beta.iter().all(|b| b.is_finite()) {
        return NormalEstimate::vertical();
    }

    let dz_dx = beta[0] * sd[2] / sd[0];
    let dz_dy = beta[1] * sd[2] / sd[1];
    NormalEstimate {
        normal: LocalVector3::new(-dz_dx, -dz_dy, 1.0),
        method: NormalFit::Regression,
    }
}

/// Finite-difference slope between the extreme points along one axis.
fn slope_fallback(points: &[LocalVector3], along_x: bool) -> NormalEstimate {
    let coord = |p: &LocalVector3| if along_x { p.x } else { p.y };
    let lo = points.iter().min_by(|a, b| coord(a).total_cmp(&coord(b)));
    let hi = points.iter().max_by(|a, b| coord(a).total_cmp(&coord(b)));
    let (Some(lo), Some(hi)) = (lo, hi) else {
        return NormalEstimate::vertical();
    };

    let run = coord(hi) - coord(lo);
    if run.abs() < SPREAD_EPSILON {
        return NormalEstimate::vertical();
    }
    let slope = (hi.z - lo.z) / run;
    let normal = if along_x {
        LocalVector3::new(-slope, 0.0, 1.0)
    } else {
        LocalVector3::new(0.0, -slope, 1.0)
    };
    NormalEstimate {
        normal,
        method: NormalFit::SlopeFallback,
    }
}
