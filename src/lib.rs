//! Toroidal Conway's Game of Life (B3/S23) stepped by partition workers
//! behind a per-partition flag barrier.

pub mod barrierlife;
pub use barrierlife::{BarrierLife, EngineConfig, EngineError, GenerationView, Grid, SeedPolicy};
