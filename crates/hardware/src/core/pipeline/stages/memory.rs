//! Memory Access (MEM) Stage.
//!
//! Performs loads, stores, and atomics through the memory map and charges their
//! latency. Loads and atomic loads pay the data-read latency, stores and atomic
//! stores the data-write latency; with L1 caches modelled, the part of the page
//! walk that overlaps the cache access is not charged twice.

use crate::common::error::ExceptionCause;
use crate::core::cpu::StageId;
use crate::core::pipeline::handlers::StageContext;
use crate::core::pipeline::latches::InstructionLatch;
use crate::soc::traits::MemoryMap;

/// Executes the memory stage for one latch.
pub fn mem_stage(ctx: &mut StageContext<'_>, mem_map: &mut dyn MemoryMap, latch: &mut InstructionLatch) {
    ctx.hart.page_walk.begin(StageId::Memory);

    if mem_map.load_store_atomic(ctx.hart, latch).is_err() {
        latch.insn.raise(ExceptionCause::MmuMemory);
        latch.max_clock_cycles = ctx.hart.page_walk.latency;
        return;
    }

    let walk = ctx.hart.page_walk.latency;
    let priv_level = ctx.hart.priv_level;
    let addr = ctx.hart.data_guest_paddr;
    let insn = &latch.insn;
    let mut cycles = walk;

    if insn.is_load || insn.is_atomic_load {
        cycles += ctx
            .mem
            .data_read_latency(addr, insn.bytes_to_rw, StageId::Memory, priv_level);
    }
    if insn.is_store || insn.is_atomic_store {
        cycles += ctx
            .mem
            .data_write_latency(addr, insn.bytes_to_rw, StageId::Memory, priv_level);
    }

    if ctx.config.cache.enable_l1_caches {
        let read = ctx.mem.dcache_read_latency();
        let write = ctx.mem.dcache_write_latency();
        if insn.is_load {
            cycles = cycles.saturating_sub(walk.min(read));
        }
        if insn.is_store {
            cycles = cycles.saturating_sub(walk.min(write));
        }
        if insn.is_atomic {
            cycles = cycles.saturating_sub(walk.min(read.min(write)));
        }
    }
    latch.max_clock_cycles = cycles;
}
