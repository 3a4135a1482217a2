//! Commit coordinator — shared checkpoint scheduling across sibling maps
//!
//! Every map created by one factory registers a write counter here. When any
//! counter reaches its map's commit threshold, the coordinator issues one
//! durability checkpoint on the shared engine and resets *every* counter,
//! not only the one that crossed. Checkpoint frequency is therefore coupled
//! across all maps sharing an engine: a high-traffic map with a low
//! threshold checkpoints its siblings' writes too.
//!
//! The counter mutex is the only cross-map synchronization in the adapter
//! layer; it is held across the checkpoint itself, so two maps can never
//! race each other into back-to-back commits.

use std::sync::Arc;

use burrow_core::BurrowEngine;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::MapResult;

struct WriteCounter {
    writes: u64,
    threshold: u64,
}

/// Owns the per-map write counters for every map sharing one engine.
pub struct CommitCoordinator {
    engine: Arc<BurrowEngine>,
    counters: Mutex<Vec<WriteCounter>>,
}

impl CommitCoordinator {
    pub(crate) fn new(engine: Arc<BurrowEngine>) -> Self {
        Self {
            engine,
            counters: Mutex::new(Vec::new()),
        }
    }

    /// Register a new map, returning its counter slot.
    pub(crate) fn register(&self, threshold: u64) -> usize {
        let mut counters = self.counters.lock();
        counters.push(WriteCounter { writes: 0, threshold });
        counters.len() - 1
    }

    /// Record one write event against a slot. A batch of any size counts as
    /// one event. Crossing the slot's threshold issues a checkpoint and
    /// zeroes every sibling counter.
    pub(crate) fn record_write(&self, slot: usize) -> MapResult<()> {
        let mut counters = self.counters.lock();
        counters[slot].writes += 1;

        if counters[slot].writes >= counters[slot].threshold {
            self.engine.commit()?;
            debug!(slot, "checkpoint issued, counters reset");
            for counter in counters.iter_mut() {
                counter.writes = 0;
            }
        }
        Ok(())
    }

    /// Current write count of a slot (test observability).
    #[cfg(test)]
    pub(crate) fn writes(&self, slot: usize) -> u64 {
        self.counters.lock()[slot].writes
    }
}
