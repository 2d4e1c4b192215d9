use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::pacer::{CycleReport, PacerConfig, ReplayPacer};
use crate::types::Result;

/// Synthetic workload driven through a pacer on a virtual clock.
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Controller cycles to run.
    pub cycles: u32,
    /// RNG seed; equal seeds give identical runs.
    pub seed: u64,
    /// Replay workers, each running one budgeted pass per cycle.
    pub workers: u32,
    /// Mean WAL records arriving per cycle.
    pub records_per_cycle: u64,
    /// Mean hot misses per cycle while replay is behind.
    pub misses_per_cycle: u64,
    /// Mean WAL ingest in bytes per second.
    pub ingest_bps: u64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            cycles: 50,
            seed: 0,
            workers: 5,
            records_per_cycle: 4_000,
            misses_per_cycle: 40,
            ingest_bps: 8 * 1024 * 1024,
        }
    }
}

/// One simulated cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStep {
    /// Zero-based cycle number.
    pub cycle: u32,
    /// Records applied by the workers this cycle.
    pub replayed: u64,
    /// Hot misses recorded this cycle.
    pub misses: u64,
    /// Records still waiting for replay after the workers ran.
    pub backlog: u64,
    /// Controller output for the cycle.
    pub report: CycleReport,
}

/// Runs the simulation. Recording is forced on regardless of `cfg.enabled`.
pub fn run_simulation(cfg: PacerConfig, opts: &SimulationOptions) -> Result<Vec<SimulationStep>> {
    let interval = cfg.cycle_interval();
    let pacer = ReplayPacer::with_config(cfg.enabled(true))?;
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let base = Instant::now();
    let mut backlog = 0u64;
    let mut steps = Vec::with_capacity(opts.cycles as usize);

    for cycle in 0..opts.cycles {
        backlog = backlog.saturating_add(jitter(&mut rng, opts.records_per_cycle));
        let bytes = jitter(&mut rng, opts.ingest_bps) as f64 * interval.as_secs_f64();
        pacer.record_wal_ingest(bytes as u64);

        let mut replayed = 0u64;
        for _ in 0..opts.workers {
            let mut pass = pacer.begin_pass();
            while backlog > 0 {
                backlog -= 1;
                replayed += 1;
                if !pass.record_applied() {
                    break;
                }
            }
        }

        let misses = if backlog > 0 {
            jitter(&mut rng, opts.misses_per_cycle)
        } else {
            0
        };
        for _ in 0..misses {
            pacer.record_hot_miss();
        }

        let report = pacer.tick_at(base + interval * cycle);
        steps.push(SimulationStep {
            cycle,
            replayed,
            misses,
            backlog,
            report,
        });
    }
    Ok(steps)
}

/// Uniform draw in `[mean / 2, mean * 3 / 2]`.
fn jitter(rng: &mut ChaCha8Rng, mean: u64) -> u64 {
    if mean == 0 {
        return 0;
    }
    let low = mean / 2;
    let high = mean.saturating_add(mean / 2);
    rng.gen_range(low..=high)
}
