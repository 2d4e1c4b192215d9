use super::config::PacerConfig;
use super::smoothing::Pressures;

/// Weighted sum of the pressures, clamped to `[0, 1]`.
pub fn blend(pressures: &Pressures, cfg: &PacerConfig) -> f64 {
    let combined = cfg.queue_weight * pressures.queue
        + cfg.miss_weight * pressures.miss
        + cfg.ingest_weight * pressures.ingest;
    combined.clamp(0.0, 1.0)
}

/// Moves from `previous` toward `target` by at most `max_step`.
pub fn limit_step(previous: f64, target: f64, max_step: f64) -> f64 {
    let delta = target - previous;
    if delta.abs() <= max_step {
        target
    } else if delta > 0.0 {
        previous + max_step
    } else {
        previous - max_step
    }
}
