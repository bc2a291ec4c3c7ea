//! Instruction Decode (ID) Stage.

use crate::core::pipeline::handlers::{SpeculationStrategy, StageContext};
use crate::core::pipeline::latches::InstructionLatch;
use crate::isa::Decoder;

/// Bit offset of the static rounding-mode field.
const RM_SHIFT: u32 = 12;

/// Width mask of the rounding-mode field.
const RM_MASK: u32 = 0x7;

/// Executes the instruction decode stage for one latch.
///
/// Captures the FP status and effective rounding mode, hands the raw encoding
/// to `decoder` (asking for disassembly when `general.create_ins_str` is set),
/// and for branches runs the decode-time speculation hook.
///
/// Returns `true` when the hook redirected fetch and the earlier stages must
/// be flushed.
pub fn decode_stage<S: SpeculationStrategy>(
    ctx: &mut StageContext<'_>,
    decoder: &dyn Decoder,
    handlers: &mut S,
    latch: &mut InstructionLatch,
) -> bool {
    let binary = latch.insn.binary;
    latch.insn.current_fs = ctx.hart.fs;
    latch.insn.rm = ctx.hart.resolve_rm(((binary >> RM_SHIFT) & RM_MASK) as u8);

    decoder.decode(&mut latch.insn, binary, ctx.config.general.create_ins_str);

    if latch.insn.branch_kind.is_branch() {
        handlers.on_decode(ctx, latch)
    } else {
        false
    }
}
