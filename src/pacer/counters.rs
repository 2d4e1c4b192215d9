use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic raw counters fed by replay workers, read handlers and the WAL
/// receiver.
///
/// Every update is a single relaxed `fetch_add`; counters are never reset.
/// Only the controller cycle reads them back.
#[derive(Debug, Default)]
pub struct RawCounters {
    replay_tasks: AtomicU64,
    hot_misses: AtomicU64,
    wal_bytes: AtomicU64,
}

/// Point-in-time copy of [`RawCounters`].
///
/// Each counter is loaded independently, so the three values may come from
/// slightly different instants.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Completed replay work units.
    pub replay_tasks: u64,
    /// Reads that blocked on incomplete replay.
    pub hot_misses: u64,
    /// WAL bytes received.
    pub wal_bytes: u64,
}

impl RawCounters {
    pub(crate) fn add_replay_tasks(&self, count: u64) {
        self.replay_tasks.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_hot_miss(&self) {
        self.hot_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_wal_bytes(&self, bytes: u64) {
        self.wal_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Loads all three counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            replay_tasks: self.replay_tasks.load(Ordering::Relaxed),
            hot_misses: self.hot_misses.load(Ordering::Relaxed),
            wal_bytes: self.wal_bytes.load(Ordering::Relaxed),
        }
    }
}

impl CounterSnapshot {
    /// Per-counter growth since `earlier`.
    pub fn delta_since(&self, earlier: &CounterSnapshot) -> CounterSnapshot {
        CounterSnapshot {
            replay_tasks: self.replay_tasks.saturating_sub(earlier.replay_tasks),
            hot_misses: self.hot_misses.saturating_sub(earlier.hot_misses),
            wal_bytes: self.wal_bytes.saturating_sub(earlier.wal_bytes),
        }
    }
}
