//! Simulation CPU Definition and Initialization.
//!
//! This module defines [`SimCpu`], the simulation object that owns every piece of
//! timing state of a session. It coordinates the following:
//! 1. **State Management:** Hart context, simulation clock, and statistics.
//! 2. **Pipeline Support:** The latch arena and the speculation strategy.
//! 3. **Collaborators:** Memory map, memory hierarchy, and decoder.
//! 4. **Observability:** Trace sink and stats-display publisher.

/// Stage executor entry points and commit helpers.
pub mod execution;

/// Simulation start, stop, and reset.
pub mod lifecycle;

/// Hart context consumed by the timing core.
pub mod state;

pub use self::state::{CodeWindow, HartState, PageWalk, StageId};

use std::time::Instant;

use crate::common::constants::STATS_PUBLISH_INTERVAL;
use crate::common::error::ExceptionCause;
use crate::config::Config;
use crate::core::pipeline::{InstructionLatch, LatchPool, StageHandlers};
use crate::core::units::bru::Bpu;
use crate::isa::Decoder;
use crate::sim::publisher::{ShmPublisher, SnapshotPublisher};
use crate::sim::trace::SimTrace;
use crate::soc::traits::{MemoryHierarchy, MemoryMap};
use crate::stats::StatsTable;

/// Program counter the hart starts at before the first simulation run.
const RESET_PC: u64 = 0x1000;

/// Pending exception raised by a committed instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimException {
    /// An exception awaits handling by the functional model.
    pub pending: bool,
    /// Cause of the exception.
    pub cause: Option<ExceptionCause>,
    /// Program counter of the faulting instruction.
    pub pc: u64,
    /// Raw encoding of the faulting instruction.
    pub insn: u32,
    /// Disassembly of the faulting instruction.
    pub insn_str: String,
}

impl SimException {
    /// Records the fault carried by `latch`.
    pub fn raise_from(&mut self, latch: &InstructionLatch) {
        self.pending = true;
        self.cause = latch.insn.exception_cause;
        self.pc = latch.insn.pc;
        self.insn = latch.insn.binary;
        self.insn_str.clone_from(&latch.insn.str);
    }

    /// Drops the pending exception.
    pub fn clear(&mut self) {
        self.pending = false;
    }
}

/// The simulation object of one session.
pub struct SimCpu {
    config: Config,
    /// Architectural context of the simulated hart.
    pub hart: HartState,
    clock: u64,
    simulation: bool,
    stats: StatsTable,
    latch_pool: LatchPool,
    handlers: StageHandlers,
    mem: Box<dyn MemoryHierarchy>,
    mem_map: Box<dyn MemoryMap>,
    decoder: Box<dyn Decoder>,
    exception: SimException,
    trace: SimTrace,
    publisher: Option<Box<dyn SnapshotPublisher>>,
    sim_start: Option<Instant>,
    last_elapsed_ms: Option<u64>,
}

impl std::fmt::Debug for SimCpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimCpu")
            .field("hart", &self.hart)
            .field("clock", &self.clock)
            .field("simulation", &self.simulation)
            .field("handlers", &self.handlers)
            .field("latch_pool", &self.latch_pool)
            .finish_non_exhaustive()
    }
}

impl SimCpu {
    /// Builds the simulation object.
    ///
    /// When `general.enable_stats_display` is set, the shared statistics region
    /// is created here; failing to create, size, or map it terminates the
    /// process.
    pub fn new(
        config: Config,
        mem: Box<dyn MemoryHierarchy>,
        mem_map: Box<dyn MemoryMap>,
        decoder: Box<dyn Decoder>,
    ) -> Self {
        let publisher: Option<Box<dyn SnapshotPublisher>> = if config.general.enable_stats_display {
            match ShmPublisher::create(&config.general.stats_shm_name) {
                Ok(p) => Some(Box::new(p)),
                Err(e) => {
                    tracing::error!(error = %e, "stats-display setup failed, terminating");
                    std::process::exit(1);
                }
            }
        } else {
            None
        };
        Self::with_publisher(config, mem, mem_map, decoder, publisher)
    }

    /// Builds the simulation object around an explicit snapshot publisher.
    pub fn with_publisher(
        config: Config,
        mem: Box<dyn MemoryHierarchy>,
        mem_map: Box<dyn MemoryMap>,
        decoder: Box<dyn Decoder>,
        publisher: Option<Box<dyn SnapshotPublisher>>,
    ) -> Self {
        let handlers = StageHandlers::from_config(&config);
        tracing::debug!(?config, "simulation parameters");
        Self {
            simulation: config.general.start_in_sim,
            hart: HartState::new(RESET_PC),
            clock: 0,
            stats: StatsTable::default(),
            latch_pool: LatchPool::default(),
            handlers,
            mem,
            mem_map,
            decoder,
            exception: SimException::default(),
            trace: SimTrace::new(),
            publisher,
            sim_start: None,
            last_elapsed_ms: None,
            config,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current simulation clock.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Returns `true` while a simulation run is active.
    pub fn is_simulating(&self) -> bool {
        self.simulation
    }

    /// Per-privilege counters of the current run.
    pub fn stats(&self) -> &StatsTable {
        &self.stats
    }

    /// The latch arena.
    pub fn latch_pool(&self) -> &LatchPool {
        &self.latch_pool
    }

    /// Mutable access to the latch arena.
    pub fn latch_pool_mut(&mut self) -> &mut LatchPool {
        &mut self.latch_pool
    }

    /// The speculation strategy of the session.
    pub fn handlers(&self) -> &StageHandlers {
        &self.handlers
    }

    /// The branch prediction unit, when prediction is modelled.
    pub fn bpu(&self) -> Option<&Bpu> {
        self.handlers.bpu()
    }

    /// The memory hierarchy.
    pub fn mem(&self) -> &dyn MemoryHierarchy {
        self.mem.as_ref()
    }

    /// The pending-exception record.
    pub fn exception(&self) -> &SimException {
        &self.exception
    }

    /// The trace sink.
    pub fn trace(&self) -> &SimTrace {
        &self.trace
    }

    /// Host time of the last completed run, in milliseconds.
    pub fn last_elapsed_ms(&self) -> Option<u64> {
        self.last_elapsed_ms
    }

    /// Advances the simulation clock and the memory system by one cycle and
    /// publishes a snapshot when the new value falls on the publication
    /// interval.
    pub fn advance_clock(&mut self) {
        self.clock += 1;
        self.mem.tick();
        let _ = self.publish_if_due();
    }

    /// Publishes a statistics snapshot when `clock % STATS_PUBLISH_INTERVAL == 0`.
    ///
    /// Returns `true` when a snapshot was written.
    pub fn publish_if_due(&mut self) -> bool {
        if self.clock % STATS_PUBLISH_INTERVAL != 0 || self.publisher.is_none() {
            return false;
        }
        // Cache counters live in the hierarchy until copied.
        self.copy_cache_stats_to_global_stats();
        match self.publisher.as_mut() {
            Some(publisher) => {
                publisher.publish(&self.stats);
                true
            }
            None => false,
        }
    }
}
