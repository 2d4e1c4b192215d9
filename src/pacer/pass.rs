use super::controller::ReplayPacer;

/// Budget tracker for a single replay invocation.
///
/// The worker calls [`ReplayPass::record_applied`] after each redo record;
/// once it returns `false` the worker should return to its caller and let
/// the next invocation pick up where it left off. Replay order is untouched,
/// the pass only bounds how many records one invocation applies.
#[derive(Debug)]
pub struct ReplayPass<'a> {
    pacer: &'a ReplayPacer,
    budget: u32,
    applied: u32,
}

impl<'a> ReplayPass<'a> {
    pub(crate) fn new(pacer: &'a ReplayPacer, budget: u32) -> Self {
        Self {
            pacer,
            budget: budget.max(1),
            applied: 0,
        }
    }

    /// Budget captured when the pass began.
    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Records applied so far in this pass.
    pub fn applied(&self) -> u32 {
        self.applied
    }

    /// Records still allowed before the worker should yield.
    pub fn remaining(&self) -> u32 {
        self.budget.saturating_sub(self.applied)
    }

    /// Whether the budget has been used up.
    pub fn exhausted(&self) -> bool {
        self.applied >= self.budget
    }

    /// Counts one applied record and reports it to the pacer.
    ///
    /// Returns `true` while the worker may apply another record.
    pub fn record_applied(&mut self) -> bool {
        self.applied = self.applied.saturating_add(1);
        self.pacer.record_replay_task(1);
        !self.exhausted()
    }
}
