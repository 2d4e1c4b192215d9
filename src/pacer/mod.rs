//! Adaptive replay budget controller.
//!
//! Producers (WAL receiver, read handlers, replay workers) bump lock-free
//! counters. A controller cycle, normally on its own thread every
//! `cycle_interval_ms`, turns counter deltas into smoothed rates, rates into
//! pressures, pressures into a step-limited aggressiveness, and that into a
//! replay budget bounded by the config and damped by hysteresis.

mod blend;
mod budget;
mod config;
mod controller;
mod counters;
mod pass;
mod smoothing;
mod state;
mod store;
mod worker;

/// Pressure blending and per-cycle step limiting.
pub use blend::{blend, limit_step};

/// Aggressiveness to budget mapping with hysteresis.
pub use budget::{apply_hysteresis, budget_for, BudgetDecision};

/// Tunable parameters and presets.
pub use config::{PacerConfig, DEFAULT_CYCLE_INTERVAL_MS, DEFAULT_EWMA_ALPHA};

/// The controller instance owned by the host.
pub use controller::ReplayPacer;

/// Raw counter block and snapshots.
pub use counters::{CounterSnapshot, RawCounters};

/// Budget enforcement for a single replay invocation.
pub use pass::ReplayPass;

/// Rate smoothing and pressure normalization.
pub use smoothing::{
    cycle_secs, ewma, pressure, Pressures, SignalRates, FIRST_CYCLE_SECS, MIN_CYCLE_SECS,
};

/// Read-only views of controller state.
pub use state::{CycleReport, MetricsSnapshot};

/// Controller loop lifecycle.
pub use worker::LoopState;
