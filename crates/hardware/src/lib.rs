//! Cycle-level timing core for a micro-architectural RISC-V simulator.
//!
//! The functional model executes instructions; this crate decides how many
//! cycles each pipeline stage takes. It provides the following:
//! 1. **Branch Prediction:** A set-associative BTB with 2-bit direction counters
//!    and a return-address stack, verified and trained at execute.
//! 2. **Stage Timing:** Fetch, decode, execute, and memory executors that charge
//!    page-walk and cache latency and repair the pipeline on misprediction.
//! 3. **Memory Timing:** A reference L1/L2 cache hierarchy in front of a DRAM
//!    memory controller.
//! 4. **Lifecycle:** Simulation start/stop/reset, statistics reports, a commit
//!    trace, and periodic statistics snapshots for an external viewer.

/// Common constants and error types.
pub mod common;
/// Session configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Timing core (simulation CPU, pipeline timing, timing units).
pub mod core;
/// Decoded instruction record and decoder contract.
pub mod isa;
/// Simulator driver, snapshot publisher, and trace sink.
pub mod sim;
/// Memory-side collaborator contracts and the reference memory hierarchy.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Simulation object of one session.
pub use crate::core::SimCpu;
/// Top-level simulator pairing a `SimCpu` with a core scheduler.
pub use crate::sim::Simulator;
