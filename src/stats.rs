// Aggregated counters for the whole daemon.
//
// The reader increments its own counters directly (single-writer); workers
// keep per-thread locals and merge them in periodically. Both paths funnel
// through the same mutex so the status publisher always sees a consistent
// snapshot.

use std::sync::Mutex;

/// Monotonically increasing counters, mirroring the `stat_*` globals of the
/// original tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatsCounters {
    pub parsed_events: u64,
    pub skipped_by_offset: u64,
    pub unrelated_events: u64,
    pub discarded_in_front: u64,
    pub pushed: u64,
    pub popped: u64,
    pub old_discarded: u64,
    pub cleared: u64,
    pub converted: u64,
    pub executed: u64,
    pub errored: u64,
    pub reached_ahead: u64,
    pub reached_eof: u64,
}

/// Per-worker local accumulator, merged into the shared [`StatsCounters`]
/// on every loop iteration. Keeping these local avoids taking the stats
/// mutex for every single popped item.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerStats {
    pub popped: u64,
    pub old_discarded: u64,
    pub converted: u64,
    pub executed: u64,
    pub errored: u64,
}

/// Shared, mutex-guarded counters. The reader thread increments the fields
/// it owns directly; workers merge their locals through [`merge_worker`].
pub struct SharedStats {
    inner: Mutex<StatsCounters>,
}

impl SharedStats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StatsCounters::default()),
        }
    }

    /// Snapshot the current counters (for the status publisher).
    pub fn snapshot(&self) -> StatsCounters {
        *self.inner.lock().unwrap()
    }

    pub fn add_parsed_events(&self, n: u64) {
        self.inner.lock().unwrap().parsed_events += n;
    }

    pub fn add_skipped_by_offset(&self, n: u64) {
        self.inner.lock().unwrap().skipped_by_offset += n;
    }

    pub fn add_unrelated_events(&self, n: u64) {
        self.inner.lock().unwrap().unrelated_events += n;
    }

    pub fn add_discarded_in_front(&self, n: u64) {
        self.inner.lock().unwrap().discarded_in_front += n;
    }

    pub fn add_pushed(&self, n: u64) {
        self.inner.lock().unwrap().pushed += n;
    }

    pub fn add_cleared(&self, n: u64) {
        self.inner.lock().unwrap().cleared += n;
    }

    pub fn add_reached_ahead(&self, n: u64) {
        self.inner.lock().unwrap().reached_ahead += n;
    }

    pub fn add_reached_eof(&self, n: u64) {
        self.inner.lock().unwrap().reached_eof += n;
    }

    /// Merge a worker's local counters into the shared struct and reset the
    /// local to zero, matching `update_stats()` in the original worker loop.
    pub fn merge_worker(&self, local: &mut WorkerStats) {
        let mut shared = self.inner.lock().unwrap();
        shared.popped += local.popped;
        shared.old_discarded += local.old_discarded;
        shared.converted += local.converted;
        shared.executed += local.executed;
        shared.errored += local.errored;
        drop(shared);
        *local = WorkerStats::default();
    }
}

impl Default for SharedStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_worker_resets_local_and_accumulates_shared() {
        let shared = SharedStats::new();
        let mut local = WorkerStats {
            popped: 3,
            old_discarded: 1,
            converted: 2,
            executed: 2,
            errored: 0,
        };
        shared.merge_worker(&mut local);
        assert_eq!(local.popped, 0);

        let snap = shared.snapshot();
        assert_eq!(snap.popped, 3);
        assert_eq!(snap.old_discarded, 1);
        assert_eq!(snap.converted, 2);
        assert_eq!(snap.executed, 2);

        // merging again accumulates rather than overwrites
        local.popped = 5;
        shared.merge_worker(&mut local);
        assert_eq!(shared.snapshot().popped, 8);
    }

    #[test]
    fn pushed_popped_discarded_accounting_holds() {
        // P4: pushed == popped + old_discarded + cleared (items still queued
        // at shutdown are accounted for by clear()).
        let shared = SharedStats::new();
        shared.add_pushed(9);
        shared.add_cleared(0);
        let mut local = WorkerStats {
            popped: 8,
            old_discarded: 1,
            converted: 0,
            executed: 0,
            errored: 0,
        };
        shared.merge_worker(&mut local);

        let snap = shared.snapshot();
        assert_eq!(snap.pushed, snap.popped + snap.old_discarded + snap.cleared);
    }
}
