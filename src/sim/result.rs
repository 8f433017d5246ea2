//! Simulation aggregates.

/// Clearance figures of one plan segment (waypoint to waypoint).
#[derive(Clone, Debug, PartialEq)]
pub struct SimDistance {
    /// Segment index, 0 = first waypoint to second
    pub segment: usize,
    /// Lowest ground clearance along the segment (m); infinite if nothing was checked
    pub ground_distance_min: f64,
    /// Lowest distance below a restricted airspace floor (m)
    pub airspace_distance_min: Option<f64>,
    /// Indices of the areas of interest the segment touches
    pub aoi_collisions: Vec<usize>,
}

/// Running min/max of a clearance value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearanceRange {
    pub min: f64,
    pub max: f64,
}

impl ClearanceRange {
    pub(crate) fn include(range: &mut Option<ClearanceRange>, value: f64) {
        match range {
            Some(r) => {
                r.min = r.min.min(value);
                r.max = r.max.max(value);
            }
            None => {
                *range = Some(ClearanceRange {
                    min: value,
                    max: value,
                })
            }
        }
    }
}

/// Result of one simulation run.
///
/// Built completely before it is published; readers only ever see whole
/// results.
#[derive(Clone, Debug, Default)]
pub struct SimResultData {
    /// Request the run belongs to
    pub run_id: u64,
    /// Per-segment figures
    pub distances: Vec<SimDistance>,
    /// Height above ground
    pub ground_clearance: Option<ClearanceRange>,
    /// Altitude above the vertical datum
    pub msl_clearance: Option<ClearanceRange>,
    /// Height above the takeoff point
    pub takeoff_clearance: Option<ClearanceRange>,
    /// Lowest distance below any airspace floor
    pub airspace_distance_min: Option<f64>,
    /// Segments below the platform's minimum ground distance
    pub ground_violations: usize,
    /// Segments entering restricted airspace
    pub airspace_violations: usize,
    pub photo_count: usize,
    pub flight_time_s: f64,
    /// 3-D path length (m)
    pub total_distance: f64,
    /// Flight time below the battery limit
    pub simulated_time_valid: bool,
    /// Every elevation query had data
    pub elevation_data_available: bool,
}

impl SimResultData {
    /// Any clearance or airspace violation
    pub fn has_violations(&self) -> bool {
        self.ground_violations > 0 || self.airspace_violations > 0
    }

    /// Segments touching area of interest `aoi`
    pub fn segments_touching(&self, aoi: usize) -> impl Iterator<Item = usize> + '_ {
        self.distances
            .iter()
            .filter(move |d| d.aoi_collisions.contains(&aoi))
            .map(|d| d.segment)
    }
}
