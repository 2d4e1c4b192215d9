use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::config::PacerConfig;
use crate::types::Result;

/// Versioned configuration slot with whole-value replacement.
///
/// Readers clone the current `Arc` under a brief read lock and never observe
/// a partially written config. The `enabled` flag is mirrored into an atomic
/// so recording calls never touch the lock.
#[derive(Debug)]
pub(crate) struct ConfigStore {
    current: RwLock<Arc<PacerConfig>>,
    enabled: AtomicBool,
}

impl ConfigStore {
    pub(crate) fn new(cfg: PacerConfig) -> Self {
        let enabled = cfg.enabled;
        Self {
            current: RwLock::new(Arc::new(cfg)),
            enabled: AtomicBool::new(enabled),
        }
    }

    pub(crate) fn load(&self) -> Arc<PacerConfig> {
        Arc::clone(&self.current.read())
    }

    /// Validates and installs `cfg`, leaving the previous version in place on
    /// error.
    pub(crate) fn replace(&self, cfg: PacerConfig) -> Result<()> {
        cfg.validate()?;
        let enabled = cfg.enabled;
        let mut guard = self.current.write();
        *guard = Arc::new(cfg);
        self.enabled.store(enabled, Ordering::Release);
        Ok(())
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

/// Lock-free holder of the published replay budget.
#[derive(Debug)]
pub(crate) struct BudgetCell(AtomicU32);

impl BudgetCell {
    pub(crate) fn new(budget: u32) -> Self {
        Self(AtomicU32::new(budget))
    }

    pub(crate) fn load(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    /// Publishes a new budget; only the controller cycle calls this.
    pub(crate) fn store(&self, budget: u32) {
        self.0.store(budget, Ordering::Relaxed);
    }
}
