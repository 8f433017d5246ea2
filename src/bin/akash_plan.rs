//! Plans a rectangular survey over synthetic terrain and prints a summary.
//!
//! Usage:
//!   akash-plan --width 400 --height 250 --hills 15
//!   akash-plan --config configs/akash.yaml --simulate

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use akash_plan::config::AkashConfig;
use akash_plan::core::{GeodeticPosition, LocalVector3, Point2, Polygon};
use akash_plan::planner::MissionPlanner;
use akash_plan::providers::{
    FnTerrain, LocalTangentPlane, NeverRecovers, StaticAirspace, TransformationProvider,
};
use akash_plan::sim::{FlightSimulator, SimEnvironment};

/// Survey flight planner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "configs/akash.yaml")]
    config: String,

    /// Area width east-west (m)
    #[arg(long, default_value_t = 300.0)]
    width: f64,

    /// Area height north-south (m)
    #[arg(long, default_value_t = 200.0)]
    height: f64,

    /// Reference latitude (degrees)
    #[arg(long, default_value_t = 47.0)]
    lat: f64,

    /// Reference longitude (degrees)
    #[arg(long, default_value_t = 8.0)]
    lon: f64,

    /// Reference ground elevation (m)
    #[arg(long, default_value_t = 400.0)]
    elevation: f64,

    /// Amplitude of the synthetic rolling hills (m)
    #[arg(long, default_value_t = 10.0)]
    hills: f64,

    /// Simulate the assembled plan
    #[arg(short, long)]
    simulate: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config_path = Path::new(&args.config);
    let config = if config_path.exists() {
        match AkashConfig::load(config_path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load {}: {}", config_path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        info!("Config not found at {}, using defaults", config_path.display());
        AkashConfig::default()
    };

    let origin = GeodeticPosition::new(args.lat, args.lon, args.elevation);
    let frame = LocalTangentPlane::new(origin);
    let (base, amplitude) = (args.elevation, args.hills);
    let terrain = Arc::new(FnTerrain::new(frame.clone(), move |x, y| {
        Some(base + amplitude * (x / 80.0).sin() * (y / 120.0).cos())
    }));

    let area = Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(args.width, args.height));
    let planner = MissionPlanner::new(&config, terrain.as_ref(), &frame);
    let mission = match planner.plan_area(&area) {
        Ok(mission) => mission,
        Err(e) => {
            error!("Planning failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("\n=== Plan ===");
    println!("Lines: {}", mission.lines.len());
    println!("Waypoints: {}", mission.plan.waypoint_count());
    println!("Plan items: {}", mission.plan.len());
    if let Some(clearance) = mission.ground_distance_min() {
        println!("Lowest planned clearance: {:.1} m", clearance);
    }
    println!("Worst GSD deviation: {:.2}", mission.worst_tolerance_gsd());

    if !args.simulate {
        return ExitCode::SUCCESS;
    }

    let takeoff = frame.to_geodetic(&LocalVector3::new(-30.0, -30.0, 0.0));
    let env = SimEnvironment {
        platform: config.platform.clone(),
        elevation: terrain,
        airspace: Arc::new(StaticAirspace::new()),
        transform: Arc::new(frame.clone()),
        recovery: Arc::new(NeverRecovers),
        config: config.simulation.clone(),
    };
    let simulator = match FlightSimulator::spawn(env) {
        Ok(simulator) => simulator,
        Err(e) => {
            error!("Simulator failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };
    simulator.request(mission.sim_job(takeoff, vec![area]));

    let Some(result) = simulator.wait_for_result() else {
        error!("Simulation produced no result");
        return ExitCode::FAILURE;
    };

    println!("\n=== Simulation ===");
    println!("Flight time: {:.0} s (within battery: {})", result.flight_time_s, result.simulated_time_valid);
    println!("Distance: {:.0} m", result.total_distance);
    println!("Photos: {}", result.photo_count);
    if let Some(ground) = result.ground_clearance {
        println!("Ground clearance: {:.1} .. {:.1} m", ground.min, ground.max);
    }
    println!(
        "Violations: {} ground, {} airspace",
        result.ground_violations, result.airspace_violations
    );

    if result.has_violations() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
