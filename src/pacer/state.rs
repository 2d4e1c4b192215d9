use std::time::Instant;

use serde::Serialize;

use super::blend::{blend, limit_step};
use super::budget::{apply_hysteresis, budget_for};
use super::config::PacerConfig;
use super::counters::CounterSnapshot;
use super::smoothing::{cycle_secs, Pressures, SignalRates};

/// Derived state owned by the controller cycle.
#[derive(Debug, Default)]
pub(crate) struct ControllerState {
    smoothed: SignalRates,
    last_counters: CounterSnapshot,
    last_measurement: Option<Instant>,
    last_update_ms: u64,
    aggressiveness: f64,
}

/// Immutable copy of the controller's smoothed view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Smoothed replay throughput (tasks/s).
    pub replay_queue_rate: f64,
    /// Smoothed hot misses per replayed task.
    pub hot_miss_rate: f64,
    /// Smoothed WAL ingest in bytes per second.
    pub wal_ingest_bps: f64,
    /// Current aggressiveness in `[0, 1]`.
    pub aggressiveness: f64,
    /// Current replay budget.
    pub replay_budget: u32,
    /// Wall-clock time of the last cycle in unix millis, 0 before the first.
    pub last_update_ms: u64,
}

/// Every intermediate value computed by one controller cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleReport {
    /// Seconds the rates were computed over.
    pub elapsed_secs: f64,
    /// Unsmoothed signals for this cycle.
    pub raw_queue_rate: f64,
    /// Unsmoothed miss ratio for this cycle.
    pub raw_miss_rate: f64,
    /// Unsmoothed ingest rate for this cycle.
    pub raw_ingest_bps: f64,
    /// Smoothed replay throughput.
    pub queue_rate: f64,
    /// Smoothed miss ratio.
    pub miss_rate: f64,
    /// Smoothed ingest rate.
    pub ingest_bps: f64,
    /// Queue pressure.
    pub queue_pressure: f64,
    /// Hot-miss pressure.
    pub miss_pressure: f64,
    /// Ingest pressure.
    pub ingest_pressure: f64,
    /// Blended aggressiveness before step limiting.
    pub requested_aggressiveness: f64,
    /// Aggressiveness stored after step limiting.
    pub aggressiveness: f64,
    /// Budget produced by the linear map.
    pub mapped_budget: u32,
    /// Budget in effect after hysteresis.
    pub budget: u32,
    /// Whether hysteresis kept the previous budget.
    pub budget_held: bool,
}

impl ControllerState {
    /// Runs one smoothing, blending and mapping pass.
    ///
    /// `current_budget` is the budget currently published to workers; the
    /// returned report carries the one to publish next.
    pub(crate) fn step(
        &mut self,
        counters: CounterSnapshot,
        current_budget: u32,
        now: Instant,
        wall_ms: u64,
        cfg: &PacerConfig,
    ) -> CycleReport {
        let dt = cycle_secs(self.last_measurement, now);
        let delta = counters.delta_since(&self.last_counters);
        let raw = SignalRates::from_delta(&delta, dt);
        self.smoothed = self.smoothed.smooth(&raw, cfg.ewma_alpha);
        self.last_counters = counters;
        self.last_measurement = Some(now);
        self.last_update_ms = wall_ms;

        let pressures: Pressures = self.smoothed.pressures(cfg);
        let requested = blend(&pressures, cfg);
        self.aggressiveness =
            limit_step(self.aggressiveness, requested, cfg.max_step).clamp(0.0, 1.0);

        let mapped = budget_for(self.aggressiveness, cfg);
        let decision = apply_hysteresis(current_budget, mapped, cfg);

        CycleReport {
            elapsed_secs: dt,
            raw_queue_rate: raw.queue_rate,
            raw_miss_rate: raw.miss_ratio,
            raw_ingest_bps: raw.ingest_bps,
            queue_rate: self.smoothed.queue_rate,
            miss_rate: self.smoothed.miss_ratio,
            ingest_bps: self.smoothed.ingest_bps,
            queue_pressure: pressures.queue,
            miss_pressure: pressures.miss,
            ingest_pressure: pressures.ingest,
            requested_aggressiveness: requested,
            aggressiveness: self.aggressiveness,
            mapped_budget: mapped,
            budget: decision.budget,
            budget_held: decision.held,
        }
    }

    pub(crate) fn snapshot(&self, budget: u32) -> MetricsSnapshot {
        MetricsSnapshot {
            replay_queue_rate: self.smoothed.queue_rate,
            hot_miss_rate: self.smoothed.miss_ratio,
            wal_ingest_bps: self.smoothed.ingest_bps,
            aggressiveness: self.aggressiveness,
            replay_budget: budget,
            last_update_ms: self.last_update_ms,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_aggressiveness(aggressiveness: f64) -> Self {
        Self {
            aggressiveness,
            ..Self::default()
        }
    }
}
