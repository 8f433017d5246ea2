//! Default value functions for serde deserialization.

// Platform

pub fn turn_radius() -> f64 {
    0.0
}

pub fn min_ground_distance() -> f64 {
    30.0
}

pub fn max_flight_time_s() -> f64 {
    45.0 * 60.0
}

pub fn planning_speed() -> f64 {
    12.0
}

pub fn max_climb_rate() -> f64 {
    3.0
}

pub fn max_sink_rate() -> f64 {
    2.0
}

pub fn min_trigger_distance() -> f64 {
    1.0
}

// Refinement

pub fn altitude() -> f64 {
    80.0
}

pub fn gsd_tolerance() -> f64 {
    0.2
}

pub fn terrain_sample_spacing() -> f64 {
    5.0
}

pub fn regression_radius_factor() -> f64 {
    2.5
}

pub fn min_waypoint_separation() -> f64 {
    2.0
}

// Line ordering

pub fn line_spacing() -> f64 {
    20.0
}

pub fn gap_factor() -> f64 {
    1.1
}

// Assembly

pub fn trigger_distance() -> f64 {
    20.0
}

pub fn trigger_distance_max() -> f64 {
    25.0
}

pub fn toggle_angle() -> f64 {
    15.0
}

// Simulation

pub fn time_step_s() -> f64 {
    1.0
}

pub fn takeoff_exclusion_radius() -> f64 {
    25.0
}

pub fn takeoff_exclusion_height() -> f64 {
    10.0
}

pub fn elevation_resolution() -> f64 {
    10.0
}

pub fn retry_delay_ms() -> u64 {
    3000
}
