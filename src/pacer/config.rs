use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{PacerError, Result};

/// Default smoothing factor applied to every EWMA signal.
pub const DEFAULT_EWMA_ALPHA: f64 = 0.3;
/// Default controller cadence in milliseconds.
pub const DEFAULT_CYCLE_INTERVAL_MS: u64 = 200;

/// Tunable parameters for the replay pacer.
///
/// A config is immutable once installed; updates replace it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacerConfig {
    /// Healthy replay throughput (tasks/s), used as a queue-depth proxy.
    pub target_queue_rate: f64,
    /// Healthy hot-miss ratio, in `(0, 1]`.
    pub target_miss_rate: f64,
    /// Healthy WAL ingest rate in bytes per second.
    pub target_ingest_bps: f64,
    /// Lower bound of the replay budget.
    pub min_budget: u32,
    /// Upper bound of the replay budget.
    pub max_budget: u32,
    /// Weight of the queue pressure.
    pub queue_weight: f64,
    /// Weight of the hot-miss pressure.
    pub miss_weight: f64,
    /// Weight of the WAL ingest pressure.
    pub ingest_weight: f64,
    /// Minimum budget change, in records, before an update is applied.
    pub hysteresis: u32,
    /// Largest aggressiveness change allowed per cycle, in `(0, 1]`.
    pub max_step: f64,
    /// EWMA smoothing factor, in `(0, 1]`.
    pub ewma_alpha: f64,
    /// Controller cadence in milliseconds.
    pub cycle_interval_ms: u64,
    /// Whether recording and the controller loop are active.
    pub enabled: bool,
    /// Whether each cycle emits a diagnostic event.
    pub verbose: bool,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            target_queue_rate: 100.0,
            target_miss_rate: 0.05,
            target_ingest_bps: 10.0 * 1024.0 * 1024.0,
            min_budget: 10,
            max_budget: 2000,
            queue_weight: 0.3,
            miss_weight: 0.6,
            ingest_weight: 0.1,
            hysteresis: 20,
            max_step: 0.2,
            ewma_alpha: DEFAULT_EWMA_ALPHA,
            cycle_interval_ms: DEFAULT_CYCLE_INTERVAL_MS,
            enabled: false,
            verbose: false,
        }
    }
}

impl PacerConfig {
    /// Faster ramps for replicas where read latency matters more than stability.
    pub fn responsive() -> Self {
        Self {
            ewma_alpha: 0.5,
            hysteresis: 5,
            max_step: 0.5,
            enabled: true,
            ..Self::default()
        }
    }

    /// Heavier smoothing and slower ramps for bursty ingest.
    pub fn smooth() -> Self {
        Self {
            ewma_alpha: 0.15,
            hysteresis: 50,
            max_step: 0.1,
            enabled: true,
            ..Self::default()
        }
    }

    /// Returns a copy with the subsystem switched on or off.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns a copy with verbose cycle diagnostics switched on or off.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Returns a copy with the given budget bounds.
    pub fn budget_bounds(mut self, min: u32, max: u32) -> Self {
        self.min_budget = min;
        self.max_budget = max;
        self
    }

    /// Controller cadence as a [`Duration`].
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    /// Checks the invariants every installed config must satisfy.
    pub fn validate(&self) -> Result<()> {
        positive("target_queue_rate", self.target_queue_rate)?;
        positive("target_ingest_bps", self.target_ingest_bps)?;
        unit_interval("target_miss_rate", self.target_miss_rate)?;
        unit_interval("max_step", self.max_step)?;
        unit_interval("ewma_alpha", self.ewma_alpha)?;
        for (name, weight) in [
            ("queue_weight", self.queue_weight),
            ("miss_weight", self.miss_weight),
            ("ingest_weight", self.ingest_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!("{name} must be non-negative, got {weight}")));
            }
        }
        if self.min_budget == 0 {
            return Err(invalid("min_budget must be at least 1".to_string()));
        }
        if self.min_budget > self.max_budget {
            return Err(invalid(format!(
                "min_budget {} exceeds max_budget {}",
                self.min_budget, self.max_budget
            )));
        }
        if self.cycle_interval_ms == 0 {
            return Err(invalid("cycle_interval_ms must be positive".to_string()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> PacerError {
    PacerError::InvalidConfig(reason)
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must lie in (0, 1], got {value}")))
    }
}
