// The single shared state bundle every thread holds a clone of. Replaces
// the original tool's process-wide mutable globals (spec.md §9's first
// re-architecture hint) with one value `main` owns and everyone else
// borrows through `Arc`.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64};
use std::sync::Arc;

use crate::config::Options;
use crate::position::SharedPosition;
use crate::queue::Queue;
use crate::stats::SharedStats;

pub struct World {
    pub options: Options,
    pub shared_position: Arc<SharedPosition>,
    pub sql_thread_running: Arc<AtomicBool>,
    pub shutdown: Arc<AtomicBool>,
    pub stats: Arc<SharedStats>,
    pub queues: Vec<Arc<Queue>>,
    /// Wall-clock timestamp of the event the applier is presumed to be at,
    /// anchored once per outer iteration (spec.md §4.4 step 5d).
    pub applier_timestamp: Arc<AtomicU32>,
    /// Wall-clock timestamp of the most recently read-ahead event.
    pub prefetch_timestamp: Arc<AtomicU32>,
    /// Byte offset of the most recently read-ahead event.
    pub prefetch_position: Arc<AtomicU64>,
}

impl World {
    pub fn new(options: Options, initial_position: crate::position::Position) -> Self {
        let queues = (0..options.workers).map(|_| Arc::new(Queue::new())).collect();
        Self {
            shared_position: Arc::new(SharedPosition::new(initial_position)),
            sql_thread_running: Arc::new(AtomicBool::new(true)),
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(SharedStats::new()),
            queues,
            applier_timestamp: Arc::new(AtomicU32::new(0)),
            prefetch_timestamp: Arc::new(AtomicU32::new(0)),
            prefetch_position: Arc::new(AtomicU64::new(0)),
            options,
        }
    }
}
