//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use akash_plan::config::AkashConfig;
use akash_plan::core::{GeodeticPosition, Point2, Polygon};
use akash_plan::lines::AltitudeAdjustMode;
use akash_plan::platform::PlatformDescription;
use akash_plan::providers::{FnTerrain, LocalTangentPlane};

/// Mission reference point
pub const ORIGIN: GeodeticPosition = GeodeticPosition::new(47.0, 8.0, 400.0);

pub fn frame() -> LocalTangentPlane {
    LocalTangentPlane::new(ORIGIN)
}

/// Rolling hills around the reference elevation.
pub fn hills(amplitude: f64) -> FnTerrain<impl Fn(f64, f64) -> Option<f64> + Send + Sync> {
    let base = ORIGIN.elevation;
    FnTerrain::new(frame(), move |x, y| {
        Some(base + amplitude * (x / 60.0).sin() * (y / 45.0).cos())
    })
}

/// Rectangle with its south-west corner at the origin.
pub fn rectangle(width: f64, height: f64) -> Polygon {
    Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(width, height))
}

/// 20 m line spacing, 10 m turn radius, constant 50 m altitude.
pub fn scenario_config() -> AkashConfig {
    let mut config = AkashConfig::default();
    config.platform = PlatformDescription::fixed_wing(10.0);
    config.permute.line_spacing = 20.0;
    config.refine.altitude = 50.0;
    config.refine.altitude_mode = AltitudeAdjustMode::ConstantOverReference;
    config
}
