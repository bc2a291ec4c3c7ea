//! Instruction pipeline timing.
//!
//! This module contains the per-instruction timing logic the core schedulers
//! drive. It includes the following components:
//! 1. **Latches:** Per-instruction working records and their arena.
//! 2. **Handlers:** The speculation strategy selected once per session.
//! 3. **Stages:** Fetch, Decode, Execute, and Memory executors.
//! 4. **Commit:** Register writeback and retirement accounting.

/// Register writeback and retirement accounting.
pub mod commit;

/// Speculation strategies and the stage context.
pub mod handlers;

/// Instruction latches and the latch arena.
pub mod latches;

/// Pipeline stage executors (fetch, decode, execute, memory).
pub mod stages;

pub use self::handlers::{
    PassthroughStrategy, PredictingStrategy, SpeculationStrategy, StageContext, StageHandlers,
};
pub use self::latches::{InstructionLatch, LatchId, LatchPool};
