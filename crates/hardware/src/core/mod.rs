//! Timing core implementation.
//!
//! This module contains the simulation CPU, the per-instruction pipeline
//! timing logic, and the timing units it consults.

/// Privilege levels.
pub mod arch;

/// Simulation CPU: hart context, lifecycle, and stage entry points.
pub mod cpu;

/// Instruction latches, speculation strategies, and stage executors.
pub mod pipeline;

/// Timing units (branch prediction unit, caches).
pub mod units;

pub use self::cpu::SimCpu;
