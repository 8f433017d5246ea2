//! Simulation of planned missions, synchronous and on the worker thread.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use akash_plan::config::{AkashConfig, SimulationSection};
use akash_plan::core::{GeodeticPosition, LocalVector3};
use akash_plan::planner::{MissionPlan, MissionPlanner};
use akash_plan::platform::PlatformDescription;
use akash_plan::providers::{
    ElevationEstimate, ElevationQuery, FlatTerrain, NeverRecovers, RecoveryStatus, StaticAirspace,
    TransformationProvider,
};
use akash_plan::sim::{FlightSimulator, SimContext, SimEnvironment, SimulatorState, simulate};

use common::{ORIGIN, frame, hills, rectangle, scenario_config};

/// Counts queries and optionally answers slowly or not at all.
struct CountingTerrain {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    available: bool,
}

impl ElevationQuery for CountingTerrain {
    fn elevation(&self, _position: &GeodeticPosition, _res: f64) -> Option<ElevationEstimate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.available.then_some(ElevationEstimate {
            elevation: ORIGIN.elevation,
            achieved_resolution: 1.0,
        })
    }
}

/// No data until switched on, then slow answers.
struct RecoveringTerrain {
    online: Arc<AtomicBool>,
    delay: Duration,
}

impl ElevationQuery for RecoveringTerrain {
    fn elevation(&self, _position: &GeodeticPosition, _res: f64) -> Option<ElevationEstimate> {
        if !self.online.load(Ordering::SeqCst) {
            return None;
        }
        thread::sleep(self.delay);
        Some(ElevationEstimate {
            elevation: ORIGIN.elevation,
            achieved_resolution: 1.0,
        })
    }
}

struct AlwaysRecovers;

impl RecoveryStatus for AlwaysRecovers {
    fn recovery_possible(&self) -> bool {
        true
    }
}

fn scenario_mission() -> (AkashConfig, MissionPlan) {
    let config = scenario_config();
    let frame = frame();
    let terrain = FlatTerrain::new(ORIGIN.elevation);
    let mission = MissionPlanner::new(&config, &terrain, &frame)
        .plan_area(&rectangle(100.0, 50.0))
        .unwrap();
    (config, mission)
}

fn remote_takeoff() -> GeodeticPosition {
    frame().to_geodetic(&LocalVector3::new(-500.0, -500.0, 0.0))
}

fn environment(
    platform: PlatformDescription,
    elevation: Arc<dyn ElevationQuery>,
    recovery: Arc<dyn RecoveryStatus>,
    retry_delay_ms: u64,
) -> SimEnvironment {
    SimEnvironment {
        platform,
        elevation,
        airspace: Arc::new(StaticAirspace::new()),
        transform: Arc::new(frame()),
        recovery,
        config: SimulationSection {
            retry_delay_ms,
            ..SimulationSection::default()
        },
    }
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn test_planned_mission_over_hills() {
    let mut config = AkashConfig::default();
    config.platform = PlatformDescription::fixed_wing(0.0);
    config.refine.altitude = 80.0;
    let frame = frame();
    let terrain = hills(15.0);
    let area = rectangle(160.0, 100.0);
    let mission = MissionPlanner::new(&config, &terrain, &frame)
        .plan_area(&area)
        .unwrap();

    let airspace = StaticAirspace::new();
    let ctx = SimContext {
        platform: &config.platform,
        elevation: &terrain,
        airspace: &airspace,
        transform: &frame,
        config: &config.simulation,
    };
    let job = mission.sim_job(remote_takeoff(), vec![area]);
    let result = simulate(&job, &ctx, 1);

    assert!(result.elevation_data_available);
    assert_eq!(result.distances.len(), mission.plan.waypoint_count() - 1);
    assert_eq!(result.ground_violations, 0);
    assert!(result.ground_clearance.is_some_and(|g| g.min > config.platform.min_ground_distance));
    assert!(result.photo_count > mission.lines.len());
    assert!(result.segments_touching(0).count() >= mission.lines.len());
    assert!(result.simulated_time_valid);
}

#[test]
fn test_worker_publishes_same_result_as_sync_run() {
    let (config, mission) = scenario_mission();
    let job = mission.sim_job(remote_takeoff(), Vec::new());

    let terrain = FlatTerrain::new(ORIGIN.elevation);
    let airspace = StaticAirspace::new();
    let frame = frame();
    let ctx = SimContext {
        platform: &config.platform,
        elevation: &terrain,
        airspace: &airspace,
        transform: &frame,
        config: &config.simulation,
    };
    let expected = simulate(&job, &ctx, 1);

    let sim = FlightSimulator::spawn(environment(
        config.platform.clone(),
        Arc::new(terrain),
        Arc::new(NeverRecovers),
        3000,
    ))
    .unwrap();
    let run_id = sim.request(job);
    let result = sim.wait_for_result().unwrap();

    assert_eq!(result.run_id, run_id);
    assert_eq!(result.photo_count, expected.photo_count);
    assert_eq!(result.distances, expected.distances);
    assert!((result.flight_time_s - expected.flight_time_s).abs() < 1e-9);
    assert_eq!(sim.state(), SimulatorState::Idle);
}

#[test]
fn test_rapid_requests_coalesce() {
    env_logger::try_init().ok();
    let (config, mission) = scenario_mission();
    let job = mission.sim_job(remote_takeoff(), Vec::new());

    // queries of a single run
    let calls = Arc::new(AtomicUsize::new(0));
    let counting = CountingTerrain {
        calls: Arc::clone(&calls),
        delay: Duration::ZERO,
        available: true,
    };
    let airspace = StaticAirspace::new();
    let frame = frame();
    let ctx = SimContext {
        platform: &config.platform,
        elevation: &counting,
        airspace: &airspace,
        transform: &frame,
        config: &config.simulation,
    };
    simulate(&job, &ctx, 0);
    let per_run = calls.swap(0, Ordering::SeqCst);
    assert!(per_run > 0);

    let slow = CountingTerrain {
        calls: Arc::clone(&calls),
        delay: Duration::from_millis(2),
        available: true,
    };
    let sim = FlightSimulator::spawn(environment(
        config.platform.clone(),
        Arc::new(slow),
        Arc::new(NeverRecovers),
        3000,
    ))
    .unwrap();

    let mut last = 0;
    for _ in 0..5 {
        last = sim.request(job.clone());
    }
    assert_eq!(last, 5);

    let first = sim.wait_for_result().unwrap();
    assert!(first.run_id >= 1);

    assert!(wait_until(Duration::from_secs(10), || {
        sim.wait_for_result().is_some_and(|r| r.run_id == last)
    }));
    assert_eq!(sim.state(), SimulatorState::Idle);

    // the first run plus one trailing run at most
    let runs = calls.load(Ordering::SeqCst) / per_run;
    assert!(runs <= 2, "{} runs for 5 requests", runs);
}

#[test]
fn test_single_retry_without_elevation() {
    let (config, mission) = scenario_mission();
    let job = mission.sim_job(remote_takeoff(), Vec::new());

    let calls = Arc::new(AtomicUsize::new(0));
    let missing = CountingTerrain {
        calls: Arc::clone(&calls),
        delay: Duration::ZERO,
        available: false,
    };
    let sim = FlightSimulator::spawn(environment(
        config.platform.clone(),
        Arc::new(missing),
        Arc::new(AlwaysRecovers),
        500,
    ))
    .unwrap();

    sim.request(job);
    let result = sim.wait_for_result().unwrap();
    assert!(!result.elevation_data_available);
    assert_eq!(sim.state(), SimulatorState::RetryPending);
    let first_run = calls.load(Ordering::SeqCst);

    assert!(wait_until(Duration::from_secs(5), || sim.state() == SimulatorState::Idle));
    let after_retry = calls.load(Ordering::SeqCst);
    assert_eq!(after_retry, 2 * first_run);

    // no second retry
    thread::sleep(Duration::from_millis(800));
    assert_eq!(calls.load(Ordering::SeqCst), after_retry);
    assert_eq!(sim.state(), SimulatorState::Idle);
}

#[test]
fn test_no_retry_when_recovery_impossible() {
    let (config, mission) = scenario_mission();
    let sim = FlightSimulator::spawn(environment(
        config.platform.clone(),
        Arc::new(CountingTerrain {
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            available: false,
        }),
        Arc::new(NeverRecovers),
        100,
    ))
    .unwrap();

    sim.request(mission.sim_job(remote_takeoff(), Vec::new()));
    let result = sim.wait_for_result().unwrap();
    assert!(!result.elevation_data_available);
    assert_eq!(sim.state(), SimulatorState::Idle);
}

#[test]
fn test_wait_during_retry_blocks_for_retry_result() {
    let (config, mission) = scenario_mission();
    let online = Arc::new(AtomicBool::new(false));
    let sim = FlightSimulator::spawn(environment(
        config.platform.clone(),
        Arc::new(RecoveringTerrain {
            online: Arc::clone(&online),
            delay: Duration::from_millis(10),
        }),
        Arc::new(AlwaysRecovers),
        300,
    ))
    .unwrap();

    let run_id = sim.request(mission.sim_job(remote_takeoff(), Vec::new()));
    let degraded = sim.wait_for_result().unwrap();
    assert!(!degraded.elevation_data_available);
    assert_eq!(sim.state(), SimulatorState::RetryPending);

    online.store(true, Ordering::SeqCst);
    assert!(wait_until(Duration::from_secs(5), || sim.state() == SimulatorState::Running));

    // the retry reuses the run id but is still a run in flight
    let retried = sim.wait_for_result().unwrap();
    assert_eq!(retried.run_id, run_id);
    assert!(retried.elevation_data_available);
    assert_eq!(sim.state(), SimulatorState::Idle);
}
