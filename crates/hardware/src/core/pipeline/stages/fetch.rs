//! Instruction Fetch (IF) Stage.
//!
//! Reads the instruction at the fetch program counter through the memory map,
//! charges translation and instruction-fetch latency, advances the fetch
//! pointer past the instruction, and applies fetch-time speculation.

use crate::common::constants::INSTRUCTION_SIZE_32;
use crate::common::error::ExceptionCause;
use crate::core::cpu::StageId;
use crate::core::pipeline::handlers::{SpeculationStrategy, StageContext};
use crate::core::pipeline::latches::InstructionLatch;
use crate::soc::traits::MemoryMap;

/// Executes the instruction fetch stage for one latch.
///
/// # Arguments
///
/// * `ctx` - Hart, statistics, memory hierarchy, and configuration
/// * `mem_map` - Functional memory map performing the read
/// * `handlers` - Speculation strategy of the session
/// * `latch` - Latch of the instruction being fetched
///
/// # Behavior
///
/// - On a fault the latch carries [`ExceptionCause::MmuFetch`] and the stage
///   budget is the page-walk latency alone
/// - Otherwise the budget is walk latency plus fetch latency, less the walk/L1
///   overlap when L1 caches are modelled
pub fn fetch_stage<S: SpeculationStrategy>(
    ctx: &mut StageContext<'_>,
    mem_map: &mut dyn MemoryMap,
    handlers: &mut S,
    latch: &mut InstructionLatch,
) {
    ctx.hart.page_walk.begin(StageId::Fetch);
    latch.elapsed_clock_cycles = 1;
    ctx.mem.reset_frontend_queue();

    if mem_map.read_instruction(ctx.hart, latch).is_err() {
        latch.insn.raise(ExceptionCause::MmuFetch);
        latch.max_clock_cycles = ctx.hart.page_walk.latency;
        return;
    }

    let walk = ctx.hart.page_walk.latency;
    let priv_level = ctx.hart.priv_level;
    let mut cycles = walk
        + ctx.mem.fetch_latency(
            ctx.hart.code_guest_paddr,
            INSTRUCTION_SIZE_32,
            StageId::Fetch,
            priv_level,
        );
    if ctx.config.cache.enable_l1_caches {
        // TLB and L1-I are probed in parallel.
        cycles = cycles.saturating_sub(walk.min(ctx.mem.icache_read_latency()));
    }
    latch.max_clock_cycles = cycles;

    ctx.hart.advance_fetch(latch.insn.size());
    handlers.on_fetch(ctx, latch);
    ctx.stats[priv_level].ins_fetch += 1;
}
