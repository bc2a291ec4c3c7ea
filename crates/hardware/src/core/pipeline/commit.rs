//! Commit helpers.
//!
//! Called by the core scheduler when an instruction retires:
//! 1. Write the result to the integer or floating-point register file.
//! 2. Count the retirement in the per-type statistics.
//! 3. Size the stage budget of non-pipelined functional units.

use crate::common::constants::{F32_HIGH, F64_HIGH};
use crate::config::PipelineConfig;
use crate::core::cpu::HartState;
use crate::core::pipeline::latches::InstructionLatch;
use crate::isa::{FuType, InsnType};
use crate::stats::StatsTable;

/// FP status value marking the FP state dirty.
const FS_DIRTY: u8 = 3;

/// Writes the integer result to `rd`; writes to `x0` are dropped and not counted.
pub fn update_arch_reg_int(hart: &mut HartState, stats: &mut StatsTable, latch: &InstructionLatch) {
    let rd = latch.insn.rd;
    if rd != 0 {
        hart.regs[rd] = latch.insn.buffer;
        stats[hart.priv_level].int_regfile_writes += 1;
    }
}

/// Writes the FP result to `rd`, NaN-boxing single-precision values.
pub fn update_arch_reg_fp(hart: &mut HartState, stats: &mut StatsTable, latch: &mut InstructionLatch) {
    let insn = &mut latch.insn;
    if insn.f32_mask {
        insn.buffer |= F32_HIGH;
    } else if insn.f64_mask {
        insn.buffer |= F64_HIGH;
    }
    hart.fp_regs[insn.rd] = insn.buffer;
    if insn.set_fs {
        hart.fs = FS_DIRTY;
    }
    stats[hart.priv_level].fp_regfile_writes += 1;
}

/// Counts a retired instruction.
pub fn update_insn_commit_stats(hart: &HartState, stats: &mut StatsTable, latch: &InstructionLatch) {
    let s = &mut stats[hart.priv_level];
    s.ins_simulated += 1;
    s.ins_type[latch.insn.insn_type.index()] += 1;
    if latch.insn.insn_type == InsnType::CondBranch && latch.is_branch_taken {
        s.ins_cond_branch_taken += 1;
    }
}

/// Stage budget of an instruction on the non-pipelined unit `fu`.
///
/// FP ALU operations take their configured latency; every other unit takes one
/// cycle.
pub fn max_cycles_for_non_pipe_fu(config: &PipelineConfig, fu: FuType, latch: &InstructionLatch) -> u64 {
    match fu {
        FuType::FpuAlu => config.fpu_alu_latency[latch.insn.fpu_alu_op as usize],
        _ => 1,
    }
}
