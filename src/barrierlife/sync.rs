//! Per-partition rendezvous flag between the coordinator and one worker.
//!
//! A flag is a two-state handshake (`Idle` / `Requested`) with two terminal
//! states layered on top: `Closed` asks the worker to exit and `Abandoned`
//! records that the worker died mid-round. Waiting blocks on a condvar
//! keyed to the flag's state, never spins. The mutex hand-off is what makes
//! a worker's plane writes visible to the coordinator once it sees `Idle`.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagState {
    /// No pending request; the worker's last round (if any) is complete.
    Idle,
    /// The coordinator has released the worker for one round.
    Requested,
    /// Shutdown: the worker exits instead of waiting for another request.
    Closed,
    /// The worker thread unwound while holding a request.
    Abandoned,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("partition {partition} was signalled while a request was still pending")]
    DoubleRequest { partition: usize },

    #[error("partition {partition} did not report completion within {timeout:?}")]
    Timeout { partition: usize, timeout: Duration },

    #[error("worker for partition {partition} terminated during a round")]
    Abandoned { partition: usize },

    #[error("partition {partition} was closed")]
    Closed { partition: usize },

    #[error("partition {partition} computed generation {found}, expected {expected}")]
    GenerationMismatch {
        partition: usize,
        expected: u64,
        found: u64,
    },
}

/// Absolute fan-in deadline shared by every flag of one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
            timeout,
        }
    }

    #[inline]
    pub fn at(&self) -> Instant {
        self.at
    }

    /// The budget this deadline was started with.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug)]
struct FlagSlot {
    state: FlagState,
    /// Generation the worker read on its most recent completed round.
    completed: u64,
}

#[derive(Debug)]
pub struct SyncFlag {
    partition: usize,
    slot: Mutex<FlagSlot>,
    changed: Condvar,
}

impl SyncFlag {
    pub fn new(partition: usize) -> Self {
        Self {
            partition,
            slot: Mutex::new(FlagSlot {
                state: FlagState::Idle,
                completed: 0,
            }),
            changed: Condvar::new(),
        }
    }

    #[inline]
    pub fn partition(&self) -> usize {
        self.partition
    }

    pub fn state(&self) -> FlagState {
        self.slot.lock().state
    }

    /// Coordinator side: `Idle -> Requested`, then wake the worker.
    pub fn request(&self) -> Result<(), SyncError> {
        let mut slot = self.slot.lock();
        match slot.state {
            FlagState::Idle => {
                slot.state = FlagState::Requested;
                drop(slot);
                self.changed.notify_all();
                Ok(())
            }
            FlagState::Requested => Err(SyncError::DoubleRequest {
                partition: self.partition,
            }),
            FlagState::Closed => Err(SyncError::Closed {
                partition: self.partition,
            }),
            FlagState::Abandoned => Err(SyncError::Abandoned {
                partition: self.partition,
            }),
        }
    }

    /// Worker side: block while `Idle`.
    ///
    /// Returns `true` when released for a round, `false` once the flag is closed.
    pub fn wait_for_request(&self) -> bool {
        let mut slot = self.slot.lock();
        loop {
            match slot.state {
                FlagState::Idle => self.changed.wait(&mut slot),
                FlagState::Requested => return true,
                FlagState::Closed | FlagState::Abandoned => return false,
            }
        }
    }

    /// Worker side: `Requested -> Idle`, record the generation, wake the coordinator.
    ///
    /// A flag closed mid-round stays closed.
    pub fn complete(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if slot.state == FlagState::Requested {
            slot.state = FlagState::Idle;
            slot.completed = generation;
        }
        drop(slot);
        self.changed.notify_all();
    }

    /// Coordinator side: block while `Requested`.
    ///
    /// Returns the generation the worker reported. With a deadline, gives up
    /// once it passes, however long earlier waits of the same round took.
    pub fn wait_idle(&self, deadline: Option<Deadline>) -> Result<u64, SyncError> {
        let mut slot = self.slot.lock();
        loop {
            match slot.state {
                FlagState::Idle => return Ok(slot.completed),
                FlagState::Abandoned => {
                    return Err(SyncError::Abandoned {
                        partition: self.partition,
                    });
                }
                FlagState::Closed => {
                    return Err(SyncError::Closed {
                        partition: self.partition,
                    });
                }
                FlagState::Requested => match deadline {
                    None => self.changed.wait(&mut slot),
                    Some(deadline) => {
                        if self.changed.wait_until(&mut slot, deadline.at()).timed_out()
                            && slot.state == FlagState::Requested
                        {
                            return Err(SyncError::Timeout {
                                partition: self.partition,
                                timeout: deadline.timeout(),
                            });
                        }
                    }
                },
            }
        }
    }

    /// Ask the worker to exit. `Abandoned` is sticky.
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        if slot.state != FlagState::Abandoned {
            slot.state = FlagState::Closed;
        }
        drop(slot);
        self.changed.notify_all();
    }

    /// Mark the worker dead.
    pub fn abandon(&self) {
        self.slot.lock().state = FlagState::Abandoned;
        self.changed.notify_all();
    }
}
