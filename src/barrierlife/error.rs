//! Engine error types.

use thiserror::Error;

use super::sync::SyncError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("grid size must be at least 1")]
    ZeroGridSize,

    #[error("a {grid_size}x{grid_size} grid does not fit in memory")]
    GridTooLarge { grid_size: usize },

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("{worker_count} workers cannot each own a row of a {grid_size}x{grid_size} grid")]
    TooManyWorkers {
        grid_size: usize,
        worker_count: usize,
    },

    #[error("grid size {grid_size} is not divisible by worker count {worker_count}")]
    UnevenPartition {
        grid_size: usize,
        worker_count: usize,
    },

    #[error("seed plane has {actual} cells, expected {expected}")]
    SeedSizeMismatch { expected: usize, actual: usize },

    #[error("seed density {0} is outside [0, 1]")]
    InvalidDensity(f64),

    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("barrier round failed: {0}")]
    Sync(#[from] SyncError),

    /// A previous round failed; the planes are no longer consistent.
    #[error("engine halted after an earlier failure: {0}")]
    Halted(SyncError),

    #[error("coordinator thread is gone")]
    CoordinatorGone,
}

impl EngineError {
    /// Errors raised by `initialize` before any thread starts.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            EngineError::ZeroGridSize
                | EngineError::GridTooLarge { .. }
                | EngineError::ZeroWorkers
                | EngineError::TooManyWorkers { .. }
                | EngineError::UnevenPartition { .. }
                | EngineError::SeedSizeMismatch { .. }
                | EngineError::InvalidDensity(_)
        )
    }
}
