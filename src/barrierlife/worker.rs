//! Partition worker loop.
//!
//! `Idle -> Running -> Idle` until the flag is closed. A round reads the whole
//! current plane and writes only this worker's band of the next plane.

use std::sync::Arc;
use std::thread;

use tracing::{debug, error};

use super::memory::SharedGridMemory;
use super::plan::Partition;
use super::rules::advance_rows;
use super::sync::SyncFlag;

/// Marks the flag abandoned if the worker unwinds, so the coordinator's
/// fan-in wakes up instead of waiting forever.
struct AbandonOnUnwind<'a>(&'a SyncFlag);

impl Drop for AbandonOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!(partition = self.0.partition(), "worker unwinding, abandoning partition");
            self.0.abandon();
        }
    }
}

pub struct PartitionWorker {
    index: usize,
    partition: Partition,
    memory: Arc<SharedGridMemory>,
}

impl PartitionWorker {
    pub fn new(index: usize, partition: Partition, memory: Arc<SharedGridMemory>) -> Self {
        Self {
            index,
            partition,
            memory,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Serve rounds until the flag is closed. Returns the number of rounds run.
    pub fn run(self) -> u64 {
        let memory = &*self.memory;
        let flag = memory.flag(self.index);
        let _guard = AbandonOnUnwind(flag);

        let size = memory.size();
        let rows = self.partition.rows();
        let band = self.partition.plane_range(size);
        let mut rounds = 0u64;
        debug!(partition = self.index, ?rows, "worker ready");

        while flag.wait_for_request() {
            let generation = memory.generation();
            let (current, next) = memory.planes_for(generation);
            // SAFETY: while this flag is `Requested` the coordinator holds the
            // round open: nobody writes `current`, and `band` is written by
            // this worker alone since partitions are disjoint.
            let (src, dst) = unsafe { (current.as_slice(), next.slice_mut(band.clone())) };
            advance_rows(src, dst, size, rows.clone());
            flag.complete(generation);
            rounds += 1;
        }

        debug!(partition = self.index, rounds, "worker exiting");
        rounds
    }
}
