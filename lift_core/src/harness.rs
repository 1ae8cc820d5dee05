//! Simulation harness: one engine driven by a periodic task, shared with
//! concurrent request submitters and snapshot observers.
//!
//! Two locks are involved:
//!
//! - the *simulation lock* guards the engine. Ticks, calls, pings and
//!   snapshots all take it, so they are serialised.
//! - the *reconfiguration lock* guards the cycle task slot. Only `configure`
//!   and `shutdown` take it, so two reconfigurations never interleave.
//!
//! Every configuration bumps a generation counter. A cycle task only acts
//! while the installed session carries its generation, and a snapshot is
//! only broadcast while its generation is still current, so an abandoned
//! task can neither mutate nor publish newer state.

use crate::boarding::{BoardingPolicy, MaximizeBoarding};
use crate::config::SimConfig;
use crate::conversions::{harness_timing, policy_from};
use crate::cycle::{CycleControl, CycleTask, CycleTiming};
use crate::engine::Engine;
use crate::error::{LiftError, Result};
use crate::protocol::{Request, passenger_count, sim_config};
use crate::snapshot::Snapshot;
use crate::types::{CallDirection, Floor};
use crate::util::{DEFAULT_CANCEL_TIMEOUT, DEFAULT_MIN_TICK};
use crossbeam_channel as xch;
use lift_traits::{BoxError, Clock, MonotonicClock, SnapshotSink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unconfigured,
    Running,
    Reconfiguring,
    Stopped,
}

struct Session {
    engine: Engine,
    config: SimConfig,
    generation: u64,
}

impl Session {
    fn snapshot(&self) -> Snapshot {
        self.engine.snapshot(self.generation, self.config.cycle_s)
    }
}

/// Fan-out to registered observers. Delivery is best-effort.
#[derive(Default)]
struct Broadcaster {
    sinks: Vec<Box<dyn SnapshotSink<Snapshot>>>,
}

impl Broadcaster {
    fn broadcast(&mut self, snapshot: &Snapshot) {
        self.sinks.retain_mut(|sink| {
            if sink.is_closed() {
                tracing::debug!("dropping closed observer");
                return false;
            }
            if let Err(e) = sink.deliver(snapshot) {
                tracing::warn!(error = %e, generation = snapshot.generation, "snapshot delivery failed");
            }
            !sink.is_closed()
        });
    }
}

/// Observer backed by a bounded channel. A full channel drops the snapshot;
/// a disconnected receiver closes the sink.
pub struct ChannelSink {
    tx: xch::Sender<Snapshot>,
    closed: bool,
}

impl ChannelSink {
    pub fn new(tx: xch::Sender<Snapshot>) -> Self {
        Self { tx, closed: false }
    }
}

impl SnapshotSink<Snapshot> for ChannelSink {
    fn deliver(&mut self, item: &Snapshot) -> std::result::Result<(), BoxError> {
        match self.tx.try_send(item.clone()) {
            Ok(()) => Ok(()),
            Err(xch::TrySendError::Full(_)) => Err("observer lagging; snapshot dropped".into()),
            Err(xch::TrySendError::Disconnected(_)) => {
                self.closed = true;
                Err("observer disconnected".into())
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

struct Shared {
    state: Mutex<Option<Session>>,
    generation: AtomicU64,
    observers: Mutex<Broadcaster>,
    phase: Mutex<Phase>,
    policy: Arc<dyn BoardingPolicy>,
}

fn relock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic inside a tick is contained at the cycle boundary; keep serving.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn phase(&self) -> Phase {
        *relock(&self.phase)
    }

    fn set_phase(&self, phase: Phase) {
        *relock(&self.phase) = phase;
    }

    /// One cycle body for the task of `generation`.
    fn run_cycle(&self, generation: u64) -> CycleControl {
        let snapshot = {
            let mut guard = relock(&self.state);
            let Some(session) = guard.as_mut() else {
                return CycleControl::Continue;
            };
            if session.generation != generation {
                tracing::debug!(
                    generation,
                    current = session.generation,
                    "stale cycle task exiting"
                );
                return CycleControl::Exit;
            }
            session.engine.tick(self.policy.as_ref());
            session.snapshot()
        };
        self.publish(&snapshot);
        CycleControl::Continue
    }

    fn publish(&self, snapshot: &Snapshot) {
        let mut observers = relock(&self.observers);
        let current = self.generation.load(Ordering::SeqCst);
        if snapshot.generation != current {
            tracing::debug!(
                generation = snapshot.generation,
                current,
                "discarding stale snapshot"
            );
            return;
        }
        observers.broadcast(snapshot);
    }
}

struct Control {
    task: Option<CycleTask>,
}

/// The running simulation. Cheap to share behind an `Arc`; every method takes
/// `&self`.
pub struct Simulation {
    shared: Arc<Shared>,
    control: Mutex<Control>,
    clock: Arc<dyn Clock + Send + Sync>,
    min_tick: Duration,
    cancel_timeout: Duration,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("phase", &self.phase())
            .field("generation", &self.generation())
            .field("min_tick", &self.min_tick)
            .field("cancel_timeout", &self.cancel_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::default()
    }

    pub fn phase(&self) -> Phase {
        self.shared.phase()
    }

    /// Generation of the most recent successful configuration (0 before any).
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Register an observer for every snapshot broadcast from now on.
    pub fn subscribe(&self, sink: impl SnapshotSink<Snapshot> + 'static) {
        relock(&self.shared.observers).sinks.push(Box::new(sink));
    }

    /// Register a bounded channel observer and return its receiving end.
    pub fn subscribe_channel(&self, capacity: usize) -> xch::Receiver<Snapshot> {
        let (tx, rx) = xch::bounded(capacity.max(1));
        self.subscribe(ChannelSink::new(tx));
        rx
    }

    /// Install a fresh car and registry and restart the cycle task.
    ///
    /// Invalid parameters are rejected before anything changes. A previous
    /// task that does not stop within the cancel timeout is abandoned.
    pub fn configure(&self, config: SimConfig) -> Result<u64> {
        config.validate()?;
        let engine = Engine::new(&config)?;

        let mut control = relock(&self.control);
        let previous = self.shared.phase();
        if previous == Phase::Stopped {
            return Err(LiftError::State("simulation has been shut down".into()));
        }
        self.shared.set_phase(Phase::Reconfiguring);

        if let Some(task) = control.task.take() {
            let old = task.generation();
            if let Err(e) = task.cancel(self.cancel_timeout) {
                tracing::warn!(generation = old, error = %e, "installing new state regardless");
            }
        }

        let cycle = config.cycle();
        let (generation, snapshot) = {
            let mut state = relock(&self.shared.state);
            let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let session = Session {
                engine,
                config,
                generation,
            };
            let snapshot = session.snapshot();
            *state = Some(session);
            (generation, snapshot)
        };
        tracing::info!(
            generation,
            lowest = snapshot.lowest_floor,
            highest = snapshot.highest_floor,
            capacity = snapshot.capacity,
            start = snapshot.current_floor,
            ?cycle,
            "simulation configured"
        );
        self.shared.publish(&snapshot);

        let shared = Arc::clone(&self.shared);
        let timing = CycleTiming {
            cycle,
            min_tick: self.min_tick,
        };
        match CycleTask::spawn(generation, timing, Arc::clone(&self.clock), move || {
            shared.run_cycle(generation)
        }) {
            Ok(task) => {
                control.task = Some(task);
                self.shared.set_phase(Phase::Running);
                Ok(generation)
            }
            Err(e) => {
                tracing::error!(generation, error = %e, "cycle task failed to start");
                self.shared.set_phase(Phase::Stopped);
                Err(e)
            }
        }
    }

    /// Queue passengers; returns their direction of travel.
    pub fn submit_call(&self, floor: Floor, destination: Floor, count: u32) -> Result<CallDirection> {
        self.with_engine(|engine| engine.submit_call(floor, destination, count))
    }

    pub fn submit_ping(&self, floor: Floor, direction: CallDirection) -> Result<()> {
        self.with_engine(|engine| engine.submit_ping(floor, direction))
    }

    /// Dispatch a decoded client request.
    pub fn handle(&self, request: Request) -> Result<()> {
        tracing::debug!(kind = request.kind(), "request received");
        match request {
            Request::Configure {
                min_floor,
                max_floor,
                capacity,
                start_floor,
                cycle_time,
            } => {
                let current = self.current_config().unwrap_or_default();
                let cfg = sim_config(
                    &current,
                    min_floor,
                    max_floor,
                    capacity,
                    start_floor,
                    cycle_time,
                )?;
                self.configure(cfg).map(|_| ())
            }
            Request::Call {
                floor,
                destination,
                num_passengers,
            } => {
                let count = passenger_count(num_passengers)?;
                self.submit_call(floor, destination, count).map(|_| ())
            }
            Request::Ping { floor, direction } => self.submit_ping(floor, direction),
            Request::BoardingDecision { .. } => {
                tracing::warn!("boarding_decision is no longer supported");
                Err(LiftError::InvalidRequest(
                    "boarding_decision is retired; partial fits are resolved automatically".into(),
                ))
            }
            Request::Unknown => {
                tracing::warn!("unknown request type");
                Err(LiftError::InvalidRequest("unknown request type".into()))
            }
        }
    }

    /// Current state, or `None` before the first configuration.
    pub fn snapshot(&self) -> Option<Snapshot> {
        relock(&self.shared.state).as_ref().map(Session::snapshot)
    }

    /// Configuration of the installed session, if any.
    pub fn current_config(&self) -> Option<SimConfig> {
        relock(&self.shared.state)
            .as_ref()
            .map(|session| session.config.clone())
    }

    /// Stop the cycle task and refuse further requests.
    pub fn shutdown(&self) -> Result<()> {
        let mut control = relock(&self.control);
        if self.shared.phase() == Phase::Stopped && control.task.is_none() {
            return Ok(());
        }
        self.shared.set_phase(Phase::Stopped);
        let result = match control.task.take() {
            Some(task) => task.cancel(self.cancel_timeout),
            None => Ok(()),
        };
        tracing::info!(generation = self.generation(), "simulation stopped");
        result
    }

    fn with_engine<T>(&self, f: impl FnOnce(&mut Engine) -> Result<T>) -> Result<T> {
        if self.shared.phase() == Phase::Stopped {
            return Err(LiftError::State("simulation has been shut down".into()));
        }
        let mut state = relock(&self.shared.state);
        let session = state.as_mut().ok_or(LiftError::Unconfigured)?;
        f(&mut session.engine)
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "simulation dropped with a running task");
        }
    }
}

pub struct SimulationBuilder {
    policy: Arc<dyn BoardingPolicy>,
    min_tick: Duration,
    cancel_timeout: Duration,
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self {
            policy: Arc::new(MaximizeBoarding),
            min_tick: DEFAULT_MIN_TICK,
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
        }
    }
}

impl SimulationBuilder {
    /// Policy and timing from a loaded config file.
    pub fn from_config(cfg: &lift_config::Config) -> Self {
        let (min_tick, cancel_timeout) = harness_timing(&cfg.timing);
        Self {
            policy: policy_from(&cfg.boarding),
            min_tick,
            cancel_timeout,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: impl BoardingPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_min_tick(mut self, min_tick: Duration) -> Self {
        self.min_tick = min_tick;
        self
    }

    pub fn with_cancel_timeout(mut self, timeout: Duration) -> Self {
        self.cancel_timeout = timeout;
        self
    }

    pub fn build(self) -> Simulation {
        Simulation {
            shared: Arc::new(Shared {
                state: Mutex::new(None),
                generation: AtomicU64::new(0),
                observers: Mutex::new(Broadcaster::default()),
                phase: Mutex::new(Phase::Unconfigured),
                policy: self.policy,
            }),
            control: Mutex::new(Control { task: None }),
            clock: Arc::new(MonotonicClock::new()),
            min_tick: self.min_tick,
            cancel_timeout: self.cancel_timeout,
        }
    }
}
