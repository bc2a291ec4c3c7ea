//! Instruction Execute (EX) Stage.
//!
//! The functional model has already produced the instruction's result and, for
//! branches, its condition and target. This stage resolves control flow against
//! the prediction made at fetch.

use crate::common::error::SimResult;
use crate::core::pipeline::handlers::{SpeculationStrategy, StageContext};
use crate::core::pipeline::latches::InstructionLatch;

/// Executes the branch-resolution part of the execute stage for one latch.
///
/// Returns `true` when the pipeline must be flushed and fetch restarted at
/// `latch.branch_target`. Non-branch instructions never flush.
///
/// # Errors
///
/// Propagates [`crate::common::SimError::PredictorInconsistency`] from the
/// strategy.
pub fn execute_stage<S: SpeculationStrategy>(
    ctx: &mut StageContext<'_>,
    handlers: &mut S,
    latch: &mut InstructionLatch,
) -> SimResult<bool> {
    if !latch.insn.branch_kind.is_branch() {
        return Ok(false);
    }
    handlers.on_execute(ctx, latch)
}
