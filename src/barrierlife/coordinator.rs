//! Barrier coordinator: fan-out to every partition, fan-in, publish.
//!
//! The coordinator is reactive. It sits idle on its command channel and runs
//! exactly one round per `Step` command, so it can never run ahead of the
//! consumer.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, trace, warn};

use super::error::EngineError;
use super::memory::SharedGridMemory;
use super::sync::{Deadline, SyncError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Signaling,
    WaitingForCompletion,
    Publishing,
}

/// Requests sent from the engine handle to the coordinator thread.
pub(crate) enum Command {
    /// Run one round and reply with the newly published generation.
    Step {
        reply: Sender<Result<u64, EngineError>>,
    },
    Shutdown,
}

pub struct BarrierCoordinator {
    memory: Arc<SharedGridMemory>,
    workers: Vec<JoinHandle<u64>>,
    step_timeout: Option<Duration>,
    state: CoordinatorState,
    /// First round failure. Once set, every later step is refused.
    failure: Option<SyncError>,
}

impl BarrierCoordinator {
    pub fn new(
        memory: Arc<SharedGridMemory>,
        workers: Vec<JoinHandle<u64>>,
        step_timeout: Option<Duration>,
    ) -> Self {
        debug_assert_eq!(workers.len(), memory.flags().len());
        Self {
            memory,
            workers,
            step_timeout,
            state: CoordinatorState::Idle,
            failure: None,
        }
    }

    #[inline]
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    #[inline]
    pub fn failure(&self) -> Option<&SyncError> {
        self.failure.as_ref()
    }

    #[inline]
    fn enter(&mut self, next: CoordinatorState) {
        trace!(from = ?self.state, to = ?next, "coordinator transition");
        self.state = next;
    }

    /// Advance the grid by one generation. Returns the published generation.
    ///
    /// Any synchronization failure halts the engine for good.
    pub fn step(&mut self) -> Result<u64, EngineError> {
        if let Some(cause) = &self.failure {
            return Err(EngineError::Halted(cause.clone()));
        }
        match self.round() {
            Ok(generation) => Ok(generation),
            Err(cause) => {
                error!(
                    %cause,
                    generation = self.memory.generation(),
                    "barrier round failed, halting engine"
                );
                self.memory.close_all();
                self.memory.abort_round();
                self.enter(CoordinatorState::Idle);
                self.failure = Some(cause.clone());
                Err(EngineError::Sync(cause))
            }
        }
    }

    fn round(&mut self) -> Result<u64, SyncError> {
        let memory = Arc::clone(&self.memory);
        let generation = memory.generation();
        // One budget for the whole round, not one per flag.
        let deadline = self.step_timeout.map(Deadline::after);

        // Every partition is released before any completion is awaited.
        self.enter(CoordinatorState::Signaling);
        memory.begin_round();
        for flag in memory.flags() {
            flag.request()?;
        }

        self.enter(CoordinatorState::WaitingForCompletion);
        for flag in memory.flags() {
            let found = flag.wait_idle(deadline)?;
            if found != generation {
                return Err(SyncError::GenerationMismatch {
                    partition: flag.partition(),
                    expected: generation,
                    found,
                });
            }
        }

        self.enter(CoordinatorState::Publishing);
        memory.publish(generation + 1);
        self.enter(CoordinatorState::Idle);
        Ok(generation + 1)
    }

    /// Coordinator thread body: serve commands until shutdown or disconnect.
    pub(crate) fn serve(mut self, commands: Receiver<Command>) {
        debug!(workers = self.workers.len(), "coordinator ready");
        for command in commands.iter() {
            match command {
                Command::Step { reply } => {
                    // The caller may have gone away; the round still happened.
                    let _ = reply.send(self.step());
                }
                Command::Shutdown => break,
            }
        }
        self.shutdown();
    }

    /// Close every flag and join the workers.
    ///
    /// After a failed round, workers that are still running are left detached
    /// rather than blocking shutdown on them.
    pub fn shutdown(&mut self) {
        self.memory.close_all();
        for (index, handle) in self.workers.drain(..).enumerate() {
            if self.failure.is_some() && !handle.is_finished() {
                warn!(partition = index, "worker still running after failure, detaching");
                continue;
            }
            match handle.join() {
                Ok(rounds) => trace!(partition = index, rounds, "worker joined"),
                Err(_) => warn!(partition = index, "worker panicked"),
            }
        }
        debug!(generation = self.memory.generation(), "coordinator stopped");
    }
}

impl Drop for BarrierCoordinator {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.shutdown();
        }
    }
}
