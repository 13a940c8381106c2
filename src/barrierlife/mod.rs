//! BarrierLife engine internals and public API.
//!
//! One coordinator thread and K partition workers share two generation
//! planes. Each round the coordinator releases every worker through its
//! `SyncFlag`, waits for all of them, then publishes the next plane.

mod coordinator;
mod engine;
mod error;
mod grid;
mod memory;
mod plan;
pub mod rules;
mod sync;
mod worker;

pub use coordinator::{BarrierCoordinator, CoordinatorState};
pub use engine::{BarrierLife, EngineConfig, GenerationView, Role, SeedPolicy};
pub use error::EngineError;
pub use grid::Grid;
pub use memory::{GenerationPlane, SharedGridMemory};
pub use plan::{Partition, PartitionPlan};
pub use sync::{Deadline, FlagState, SyncError, SyncFlag};
pub use worker::PartitionWorker;
