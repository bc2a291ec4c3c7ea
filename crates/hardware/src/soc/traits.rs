//! Collaborator contracts of the timing core.
//!
//! The timing core never touches guest memory or cache state directly. It
//! consults two collaborators:
//! 1. **[`MemoryMap`]:** The functional memory map and page-table walker. It
//!    performs the actual fetch or data access and reports faults.
//! 2. **[`MemoryHierarchy`]:** The cache and DRAM timing engine. It answers
//!    latency queries and exposes statistics, flush, and queue-reset operations.

use crate::common::error::MmuFault;
use crate::config::DramModel;
use crate::core::arch::PrivilegeMode;
use crate::core::cpu::{HartState, StageId};
use crate::core::pipeline::InstructionLatch;
use crate::core::units::cache::CacheStats;
use crate::soc::memory::DramSession;

/// Functional memory map and page-table walker.
///
/// Both operations may raise `hart.page_walk.latency` to charge a hardware
/// walk, and both record the guest physical address they resolved on the hart
/// (`code_guest_paddr` or `data_guest_paddr`).
pub trait MemoryMap {
    /// Reads the instruction at `latch.insn.pc` into `latch.insn.binary`.
    ///
    /// # Errors
    ///
    /// Returns [`MmuFault`] when translation faults during fetch.
    fn read_instruction(
        &mut self,
        hart: &mut HartState,
        latch: &mut InstructionLatch,
    ) -> Result<(), MmuFault>;

    /// Performs the load, store, or atomic access described by `latch.insn`.
    ///
    /// # Errors
    ///
    /// Returns [`MmuFault`] when translation faults during the access.
    fn load_store_atomic(
        &mut self,
        hart: &mut HartState,
        latch: &mut InstructionLatch,
    ) -> Result<(), MmuFault>;
}

/// Cache and DRAM timing engine.
pub trait MemoryHierarchy {
    /// Cycles to fetch `width` bytes at guest physical `addr`.
    fn fetch_latency(&mut self, addr: u64, width: u64, stage: StageId, priv_level: PrivilegeMode) -> u64;

    /// Cycles to read `width` bytes at guest physical `addr`.
    fn data_read_latency(&mut self, addr: u64, width: u64, stage: StageId, priv_level: PrivilegeMode) -> u64;

    /// Cycles to write `width` bytes at guest physical `addr`.
    fn data_write_latency(&mut self, addr: u64, width: u64, stage: StageId, priv_level: PrivilegeMode) -> u64;

    /// Hit latency of an L1 instruction-cache read.
    fn icache_read_latency(&self) -> u64;

    /// Hit latency of an L1 data-cache read.
    fn dcache_read_latency(&self) -> u64;

    /// Hit latency of an L1 data-cache write.
    fn dcache_write_latency(&self) -> u64;

    /// L1 instruction-cache counters for `priv_level`.
    fn icache_stats(&self, priv_level: PrivilegeMode) -> CacheStats;

    /// L1 data-cache counters for `priv_level`.
    fn dcache_stats(&self, priv_level: PrivilegeMode) -> CacheStats;

    /// L2 counters for `priv_level`.
    fn l2_stats(&self, priv_level: PrivilegeMode) -> CacheStats;

    /// Zeroes the L1 counters.
    fn reset_l1_stats(&mut self);

    /// Zeroes the L2 counters.
    fn reset_l2_stats(&mut self);

    /// Invalidates both L1 caches.
    fn flush_l1(&mut self);

    /// Invalidates the L2 cache.
    fn flush_l2(&mut self);

    /// Advances the memory system by one cycle. The default does nothing.
    fn tick(&mut self) {}

    /// Discards the CPU-issued requests waiting for DRAM.
    fn reset_frontend_queue(&mut self);

    /// Discards every pending request in the memory controller.
    fn reset_controller(&mut self);

    /// Active DRAM timing model.
    fn dram_model(&self) -> DramModel;

    /// Tears down the DRAM timing model and rebuilds it for a new session.
    fn reinit_dram(&mut self, session: &DramSession);

    /// Prints the DRAM model's statistics.
    fn print_dram_stats(&self);
}
