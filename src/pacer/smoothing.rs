//! Counter deltas to smoothed rates to normalized pressures.
//!
//! Two of the signals are proxies rather than direct measurements: the queue
//! signal is replay throughput, not the actual backlog, and the miss ratio is
//! normalized by replayed tasks rather than by total reads.

use std::time::Instant;

use super::config::PacerConfig;
use super::counters::CounterSnapshot;

/// Elapsed time assumed for the first cycle, in seconds.
pub const FIRST_CYCLE_SECS: f64 = 1.0;
/// Floor applied to the elapsed time between cycles, in seconds.
pub const MIN_CYCLE_SECS: f64 = 0.1;

/// The three controller signals, either raw for one cycle or smoothed.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SignalRates {
    /// Replay tasks per second.
    pub queue_rate: f64,
    /// Hot misses per replayed task.
    pub miss_ratio: f64,
    /// WAL bytes per second.
    pub ingest_bps: f64,
}

/// Normalized pressures in `[0, 1]`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Pressures {
    /// Queue pressure (`eq`).
    pub queue: f64,
    /// Hot-miss pressure (`em`).
    pub miss: f64,
    /// Ingest pressure (`ew`).
    pub ingest: f64,
}

/// Seconds since the previous cycle, floored at [`MIN_CYCLE_SECS`].
pub fn cycle_secs(last: Option<Instant>, now: Instant) -> f64 {
    let dt = match last {
        Some(last) => now.saturating_duration_since(last).as_secs_f64(),
        None => FIRST_CYCLE_SECS,
    };
    dt.max(MIN_CYCLE_SECS)
}

/// One exponential smoothing step: `alpha * raw + (1 - alpha) * old`.
pub fn ewma(old: f64, raw: f64, alpha: f64) -> f64 {
    alpha * raw + (1.0 - alpha) * old
}

/// Piecewise-linear pressure: 0 at or below `expected`, saturating at 1 once
/// `raw` reaches twice `expected`.
pub fn pressure(raw: f64, expected: f64) -> f64 {
    if raw <= expected {
        return 0.0;
    }
    (raw / expected - 1.0).min(1.0)
}

impl SignalRates {
    /// Raw per-cycle signals from counter growth over `dt` seconds.
    ///
    /// The miss ratio adds one to the task delta so a cycle without replay
    /// progress still yields a finite value.
    pub fn from_delta(delta: &CounterSnapshot, dt: f64) -> Self {
        Self {
            queue_rate: delta.replay_tasks as f64 / dt,
            miss_ratio: delta.hot_misses as f64 / (delta.replay_tasks as f64 + 1.0),
            ingest_bps: delta.wal_bytes as f64 / dt,
        }
    }

    /// Folds `raw` into these smoothed values.
    pub fn smooth(&self, raw: &SignalRates, alpha: f64) -> Self {
        Self {
            queue_rate: ewma(self.queue_rate, raw.queue_rate, alpha),
            miss_ratio: ewma(self.miss_ratio, raw.miss_ratio, alpha),
            ingest_bps: ewma(self.ingest_bps, raw.ingest_bps, alpha),
        }
    }

    /// Pressures of these values against the configured targets.
    pub fn pressures(&self, cfg: &PacerConfig) -> Pressures {
        Pressures {
            queue: pressure(self.queue_rate, cfg.target_queue_rate),
            miss: pressure(self.miss_ratio, cfg.target_miss_rate),
            ingest: pressure(self.ingest_bps, cfg.target_ingest_bps),
        }
    }
}
