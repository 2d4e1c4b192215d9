use super::config::PacerConfig;

/// Linear map of aggressiveness onto `[min_budget, max_budget]`.
pub fn budget_for(aggressiveness: f64, cfg: &PacerConfig) -> u32 {
    let a = aggressiveness.clamp(0.0, 1.0);
    let span = f64::from(cfg.max_budget - cfg.min_budget);
    let mapped = (f64::from(cfg.min_budget) + a * span).floor();
    (mapped as u32).clamp(cfg.min_budget, cfg.max_budget)
}

/// Outcome of applying hysteresis to a mapped budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetDecision {
    /// Budget in effect after the decision.
    pub budget: u32,
    /// True when the mapped budget was discarded in favour of `current`.
    pub held: bool,
}

/// Keeps `current` unless `mapped` differs from it by at least the
/// configured hysteresis.
///
/// A `current` outside the configured bounds (left over from a previous
/// config) is always replaced.
pub fn apply_hysteresis(current: u32, mapped: u32, cfg: &PacerConfig) -> BudgetDecision {
    let in_bounds = (cfg.min_budget..=cfg.max_budget).contains(&current);
    if in_bounds && current.abs_diff(mapped) < cfg.hysteresis {
        BudgetDecision {
            budget: current,
            held: true,
        }
    } else {
        BudgetDecision {
            budget: mapped,
            held: false,
        }
    }
}
