//! Background flight simulation with coalesced recompute requests.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐  request(job)   ┌──────────────────────────┐
//! │ Planner / editing thread │────────────────▶│ bounded(1) command slot  │
//! │                          │  (replaces a    └────────────┬─────────────┘
//! │  latest()                │   pending job)               │
//! │  wait_for_result()       │                              ▼
//! └────────────▲─────────────┘               ┌──────────────────────────┐
//!              │                             │ akash-sim worker         │
//!              │  Arc<SimResultData> swap    │  simulate() -> publish   │
//!              └─────────────────────────────│  optional single retry   │
//!                                            └──────────────────────────┘
//! ```
//!
//! ## Usage Modes
//!
//! 1. **Synchronous** (tests, batch tools): call [`simulate`](super::simulate)
//!    directly
//! 2. **Threaded** (interactive planning): [`FlightSimulator::spawn`], then
//!    [`request`](FlightSimulator::request) on every plan change
//!
//! At most one request waits behind the running one. A newer request
//! replaces the waiting one, so a burst of edits ends in one trailing run.
//! Runs are never preempted.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};

use crate::config::SimulationSection;
use crate::error::Result;
use crate::platform::PlatformDescription;
use crate::providers::{AirspaceQuery, ElevationQuery, RecoveryStatus, TransformationProvider};

use super::model::{SimContext, SimJob, simulate};
use super::result::SimResultData;

/// Capacity of the request slot
const REQUEST_CAPACITY: usize = 1;

/// Collaborators owned by the simulator thread.
pub struct SimEnvironment {
    pub platform: PlatformDescription,
    pub elevation: Arc<dyn ElevationQuery>,
    pub airspace: Arc<dyn AirspaceQuery>,
    pub transform: Arc<dyn TransformationProvider>,
    pub recovery: Arc<dyn RecoveryStatus>,
    pub config: SimulationSection,
}

/// Worker state as seen by callers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SimulatorState {
    #[default]
    Idle,
    Running,
    /// Last run lacked elevation data; a retry is scheduled
    RetryPending,
}

enum Command {
    Run {
        run_id: u64,
        job: Arc<SimJob>,
        retry: bool,
    },
    Shutdown,
}

#[derive(Default)]
struct RunState {
    /// Highest run id handed out
    requested: u64,
    /// Run currently executing
    running: Option<u64>,
    /// Highest run id finished
    completed: u64,
    /// Number of finished runs, retries included
    finished: u64,
    state: SimulatorState,
    shutdown: bool,
}

/// What a blocking caller waits for.
///
/// A retry re-runs an already completed run id, so an in-flight run is
/// tracked by the finished-run count rather than by id.
enum WaitTarget {
    /// The run executing at call time
    InFlight { finished: u64 },
    /// The newest request handed out at call time
    Requested(u64),
}

impl WaitTarget {
    fn at(run: &RunState) -> Self {
        match run.running {
            Some(_) => Self::InFlight {
                finished: run.finished,
            },
            None => Self::Requested(run.requested),
        }
    }

    fn outstanding(&self, run: &RunState) -> bool {
        if run.shutdown {
            return false;
        }
        match *self {
            Self::InFlight { finished } => run.finished == finished,
            Self::Requested(id) => run.completed < id,
        }
    }
}

#[derive(Default)]
struct Shared {
    latest: Mutex<Option<Arc<SimResultData>>>,
    run: Mutex<RunState>,
    done: Condvar,
}

/// Simulator running on its own worker thread.
pub struct FlightSimulator {
    request_tx: Sender<Command>,
    /// Receiver clone for dropping a waiting request
    request_rx: Receiver<Command>,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl FlightSimulator {
    /// Start the worker thread.
    pub fn spawn(env: SimEnvironment) -> Result<Self> {
        let (request_tx, request_rx) = bounded(REQUEST_CAPACITY);
        let shared = Arc::new(Shared::default());

        let worker_rx = request_rx.clone();
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("akash-sim".to_string())
            .spawn(move || worker_loop(env, worker_rx, worker_shared))?;

        info!("[Sim] simulator thread started");
        Ok(Self {
            request_tx,
            request_rx,
            shared,
            handle: Some(handle),
        })
    }

    /// Request a simulation of `job`; returns its run id.
    ///
    /// A request still waiting for the worker is replaced.
    pub fn request(&self, job: SimJob) -> u64 {
        let run_id = {
            let mut run = self.shared.run.lock();
            run.requested += 1;
            run.requested
        };

        let mut command = Command::Run {
            run_id,
            job: Arc::new(job),
            retry: false,
        };
        loop {
            match self.request_tx.try_send(command) {
                Ok(()) => break,
                Err(TrySendError::Full(back)) => {
                    if let Ok(Command::Run { run_id: stale, .. }) = self.request_rx.try_recv() {
                        debug!("[Sim] run {} superseded by {}", stale, run_id);
                    }
                    command = back;
                }
                Err(TrySendError::Disconnected(_)) => {
                    warn!("[Sim] worker gone, run {} dropped", run_id);
                    break;
                }
            }
        }
        run_id
    }

    /// Most recently published result.
    pub fn latest(&self) -> Option<Arc<SimResultData>> {
        self.shared.latest.lock().clone()
    }

    /// Current worker state.
    pub fn state(&self) -> SimulatorState {
        self.shared.run.lock().state
    }

    /// Block until the run in flight at call time has finished.
    ///
    /// If nothing is running, waits for the newest pending request. Returns
    /// the latest result immediately when there is no outstanding work.
    pub fn wait_for_result(&self) -> Option<Arc<SimResultData>> {
        let mut run = self.shared.run.lock();
        let target = WaitTarget::at(&run);
        while target.outstanding(&run) {
            self.shared.done.wait(&mut run);
        }
        drop(run);
        self.latest()
    }

    /// Like [`wait_for_result`](Self::wait_for_result) but gives up after
    /// `timeout`, returning `None`.
    pub fn wait_for_result_timeout(&self, timeout: Duration) -> Option<Arc<SimResultData>> {
        let deadline = Instant::now() + timeout;
        let mut run = self.shared.run.lock();
        let target = WaitTarget::at(&run);
        while target.outstanding(&run) {
            if self.shared.done.wait_until(&mut run, deadline).timed_out() {
                return None;
            }
        }
        drop(run);
        self.latest()
    }

    /// Stop the worker and wait for it to exit.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        {
            let mut run = self.shared.run.lock();
            run.shutdown = true;
        }
        self.shared.done.notify_all();

        // free the slot, then ask the worker to exit
        let _ = self.request_rx.try_recv();
        let _ = self.request_tx.send(Command::Shutdown);
        let _ = handle.join();
        info!("[Sim] simulator thread stopped");
    }
}

impl Drop for FlightSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(env: SimEnvironment, rx: Receiver<Command>, shared: Arc<Shared>) {
    let ctx = SimContext {
        platform: &env.platform,
        elevation: env.elevation.as_ref(),
        airspace: env.airspace.as_ref(),
        transform: env.transform.as_ref(),
        config: &env.config,
    };
    let retry_delay = env.config.retry_delay();
    let mut pending_retry: Option<(u64, Arc<SimJob>)> = None;

    loop {
        let command = match pending_retry.take() {
            Some((run_id, job)) => match rx.recv_timeout(retry_delay) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => Command::Run {
                    run_id,
                    job,
                    retry: true,
                },
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        let (run_id, job, retry) = match command {
            Command::Run { run_id, job, retry } => (run_id, job, retry),
            Command::Shutdown => break,
        };

        {
            let mut run = shared.run.lock();
            run.running = Some(run_id);
            run.state = SimulatorState::Running;
        }

        let result = simulate(&job, &ctx, run_id);
        let wants_retry =
            !retry && !result.elevation_data_available && env.recovery.recovery_possible();
        if retry {
            debug!(
                "[Sim] retry of run {} finished, elevation available: {}",
                run_id, result.elevation_data_available
            );
        }

        *shared.latest.lock() = Some(Arc::new(result));
        {
            let mut run = shared.run.lock();
            run.completed = run.completed.max(run_id);
            run.finished += 1;
            run.running = None;
            run.state = if wants_retry {
                SimulatorState::RetryPending
            } else {
                SimulatorState::Idle
            };
        }
        shared.done.notify_all();

        if wants_retry {
            debug!("[Sim] run {} lacked elevation data, retry in {:?}", run_id, retry_delay);
            pending_retry = Some((run_id, job));
        }
    }

    let mut run = shared.run.lock();
    run.running = None;
    run.state = SimulatorState::Idle;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeodeticPosition;
    use crate::providers::{FlatTerrain, LocalTangentPlane, NeverRecovers, StaticAirspace};

    fn env() -> SimEnvironment {
        let frame = LocalTangentPlane::new(GeodeticPosition::new(47.0, 8.0, 400.0));
        SimEnvironment {
            platform: PlatformDescription::copter(),
            elevation: Arc::new(FlatTerrain::new(400.0)),
            airspace: Arc::new(StaticAirspace::new()),
            transform: Arc::new(frame),
            recovery: Arc::new(NeverRecovers),
            config: SimulationSection::default(),
        }
    }

    #[test]
    fn test_wait_without_requests() {
        let sim = FlightSimulator::spawn(env()).unwrap();
        assert!(sim.wait_for_result().is_none());
        assert_eq!(sim.state(), SimulatorState::Idle);
    }

    #[test]
    fn test_request_publishes_result() {
        let sim = FlightSimulator::spawn(env()).unwrap();
        let run_id = sim.request(SimJob::default());
        assert_eq!(run_id, 1);
        let result = sim.wait_for_result().unwrap();
        assert_eq!(result.run_id, 1);
        assert!(result.elevation_data_available);
    }

    #[test]
    fn test_run_ids_increase() {
        let sim = FlightSimulator::spawn(env()).unwrap();
        let a = sim.request(SimJob::default());
        let b = sim.request(SimJob::default());
        assert!(b > a);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut sim = FlightSimulator::spawn(env()).unwrap();
        sim.request(SimJob {
            takeoff: GeodeticPosition::new(47.0, 8.0, 400.0),
            ..SimJob::default()
        });
        sim.stop();
        sim.stop();
        assert_eq!(sim.state(), SimulatorState::Idle);
    }
}
