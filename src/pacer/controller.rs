use std::sync::Arc;
use std::time::{Instant, SystemTime};

use parking_lot::Mutex;
use tracing::{info, trace};

use super::config::PacerConfig;
use super::counters::{CounterSnapshot, RawCounters};
use super::pass::ReplayPass;
use super::state::{ControllerState, CycleReport, MetricsSnapshot};
use super::store::{BudgetCell, ConfigStore};
use super::worker::{ControllerLoop, LoopSignal, LoopState};
use crate::types::Result;

/// State shared between the pacer handle and its controller thread.
///
/// Hot-path state (counters, budget, enabled flag) is atomic; the derived
/// controller state sits behind its own mutex and is only touched by cycles
/// and snapshot reads.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) counters: RawCounters,
    pub(crate) config: ConfigStore,
    pub(crate) budget: BudgetCell,
    pub(crate) state: Mutex<ControllerState>,
    pub(crate) signal: LoopSignal,
}

impl Shared {
    pub(crate) fn run_cycle(&self, now: Instant) -> CycleReport {
        let cfg = self.config.load();
        let mut state = self.state.lock();
        let counters = self.counters.snapshot();
        let report = state.step(counters, self.budget.load(), now, now_millis(), &cfg);
        self.budget.store(report.budget);
        if cfg.verbose {
            info!(
                queue = report.queue_rate,
                miss_rate = report.miss_rate,
                wal_bps = report.ingest_bps,
                eq = report.queue_pressure,
                em = report.miss_pressure,
                ew = report.ingest_pressure,
                aggressiveness = report.aggressiveness,
                budget = report.budget,
                "replay.pacer.cycle"
            );
        } else {
            trace!(
                aggressiveness = report.aggressiveness,
                budget = report.budget,
                held = report.budget_held,
                "replay.pacer.cycle"
            );
        }
        report
    }
}

/// Adaptive replay budget controller.
///
/// One instance is created by the host at startup and shared (usually via
/// `Arc`) with the WAL receiver, read handlers and replay workers. Recording
/// and budget reads are lock-free and never fail.
#[derive(Debug)]
pub struct ReplayPacer {
    shared: Arc<Shared>,
    control: Mutex<ControllerLoop>,
}

impl ReplayPacer {
    /// Creates a pacer with the default configuration; the budget starts at
    /// the configured minimum.
    pub fn init() -> Self {
        Self::build(PacerConfig::default())
    }

    /// Creates a pacer with `cfg` after validating it.
    pub fn with_config(cfg: PacerConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self::build(cfg))
    }

    fn build(cfg: PacerConfig) -> Self {
        info!(enabled = cfg.enabled, min_budget = cfg.min_budget, "replay.pacer.init");
        let budget = BudgetCell::new(cfg.min_budget);
        Self {
            shared: Arc::new(Shared {
                counters: RawCounters::default(),
                config: ConfigStore::new(cfg),
                budget,
                state: Mutex::new(ControllerState::default()),
                signal: LoopSignal::default(),
            }),
            control: Mutex::new(ControllerLoop::default()),
        }
    }

    /// Records `count` applied replay records.
    pub fn record_replay_task(&self, count: u64) {
        if count == 0 || !self.shared.config.enabled() {
            return;
        }
        self.shared.counters.add_replay_tasks(count);
    }

    /// Records a read that blocked waiting for replay.
    pub fn record_hot_miss(&self) {
        if !self.shared.config.enabled() {
            return;
        }
        self.shared.counters.add_hot_miss();
    }

    /// Records `bytes` of received WAL.
    pub fn record_wal_ingest(&self, bytes: u64) {
        if bytes == 0 || !self.shared.config.enabled() {
            return;
        }
        self.shared.counters.add_wal_bytes(bytes);
    }

    /// Budget replay workers should honour on their next invocation.
    pub fn current_budget(&self) -> u32 {
        self.shared.budget.load()
    }

    /// Starts a budget-tracking replay pass for one worker invocation.
    pub fn begin_pass(&self) -> ReplayPass<'_> {
        ReplayPass::new(self, self.current_budget())
    }

    /// Snapshot of the smoothed metrics, aggressiveness and budget.
    pub fn read_metrics(&self) -> MetricsSnapshot {
        let state = self.shared.state.lock();
        state.snapshot(self.shared.budget.load())
    }

    /// Raw counter totals since the pacer was created.
    pub fn raw_counters(&self) -> CounterSnapshot {
        self.shared.counters.snapshot()
    }

    /// Current configuration version.
    pub fn config(&self) -> Arc<PacerConfig> {
        self.shared.config.load()
    }

    /// Atomically replaces the configuration.
    ///
    /// Invalid configurations are rejected and leave the current one in place.
    pub fn update_config(&self, cfg: PacerConfig) -> Result<()> {
        let enabled = cfg.enabled;
        self.shared.config.replace(cfg)?;
        info!(enabled, "replay.pacer.config_updated");
        Ok(())
    }

    /// Starts the periodic controller thread if the pacer is enabled.
    ///
    /// A disabled pacer stays [`LoopState::Idle`]; starting twice is a no-op.
    pub fn start_controller(&self) -> LoopState {
        let mut control = self.control.lock();
        if control.state() == LoopState::Idle && !self.shared.config.enabled() {
            info!("replay.pacer.start_skipped_disabled");
            return LoopState::Idle;
        }
        control.start(&self.shared)
    }

    /// Stops and joins the controller thread; a no-op if it never started.
    pub fn shutdown(&self) {
        self.control.lock().stop(&self.shared);
    }

    /// Lifecycle state of the controller loop.
    pub fn loop_state(&self) -> LoopState {
        self.control.lock().state()
    }

    /// Runs one controller cycle on the calling thread.
    pub fn tick(&self) -> CycleReport {
        self.tick_at(Instant::now())
    }

    /// Runs one controller cycle as if the clock read `now`.
    ///
    /// `now` must not precede the instant of the previous cycle.
    pub fn tick_at(&self, now: Instant) -> CycleReport {
        self.shared.run_cycle(now)
    }
}

impl Default for ReplayPacer {
    fn default() -> Self {
        Self::init()
    }
}

impl Drop for ReplayPacer {
    fn drop(&mut self) {
        self.control.get_mut().stop(&self.shared);
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}
