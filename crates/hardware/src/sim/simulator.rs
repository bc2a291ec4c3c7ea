//! Simulator: owns the simulation CPU and the core scheduler side-by-side.
//!
//! The scheduler needs `&mut SimCpu` while it runs, so it is stored next to the
//! CPU instead of inside it.

use crate::config::CoreType;
use crate::core::cpu::SimCpu;

/// Cycle scheduler of a core model (in-order or out-of-order).
///
/// The scheduler decides which stage executor runs on which latch in each
/// cycle; the timing of each stage is supplied by [`SimCpu`].
pub trait CoreEngine {
    /// Returns the scheduler to its initial state.
    fn reset(&mut self);

    /// Runs until the scheduler hands control back; returns its exit status.
    fn run(&mut self, cpu: &mut SimCpu) -> i32;
}

/// Top-level simulator: simulation CPU + core scheduler.
pub struct Simulator {
    /// Simulation CPU (timing state, statistics, collaborators).
    pub cpu: SimCpu,
    core: Box<dyn CoreEngine>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("cpu", &self.cpu)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Pairs `cpu` with the scheduler `core`.
    pub fn new(cpu: SimCpu, core: Box<dyn CoreEngine>) -> Self {
        let kind = match cpu.config().general.core_type {
            CoreType::InOrder => "in-order",
            CoreType::OutOfOrder => "out-of-order",
        };
        tracing::info!(core = kind, "setting up core");
        Self { cpu, core }
    }

    /// Resets the simulation CPU and then the scheduler.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.core.reset();
    }

    /// Resets everything and hands control to the scheduler.
    ///
    /// Returns the scheduler's exit status.
    pub fn switch_to_cpu_simulation(&mut self) -> i32 {
        self.reset();
        self.core.run(&mut self.cpu)
    }
}
