//! Common utilities and types used throughout the timing core.
//!
//! This module provides the shared building blocks of the simulator. It includes:
//! 1. **Constants:** Instruction sizes, pool capacity, and publication interval.
//! 2. **Error Handling:** Architectural fault causes and host-level error types.

/// Common constants used throughout the timing core.
pub mod constants;

/// Error types and architectural fault definitions.
pub mod error;

pub use constants::{INSN_LATCH_POOL_SIZE, NUM_PRIV_LEVELS, STATS_PUBLISH_INTERVAL};
pub use error::{ExceptionCause, MmuFault, SimError, SimResult};
