//! Simulation driver and observability glue.
//!
//! Provides the top-level [`Simulator`], the statistics snapshot publisher,
//! and the commit trace sink.

/// Statistics snapshot publication for the external viewer.
pub mod publisher;

/// Simulator owning the simulation CPU and the core scheduler.
pub mod simulator;

/// Commit trace sink.
pub mod trace;

pub use self::publisher::{ShmPublisher, SnapshotPublisher};
pub use self::simulator::{CoreEngine, Simulator};
pub use self::trace::SimTrace;
