//! Stage execution entry points.
//!
//! The core scheduler (in-order or out-of-order) owns the cycle loop and calls
//! these once per instruction per stage. Each call borrows the pieces of
//! [`SimCpu`] the stage needs and forwards to the executors in
//! [`crate::core::pipeline::stages`].

use crate::common::error::SimResult;
use crate::core::cpu::SimCpu;
use crate::core::pipeline::commit;
use crate::core::pipeline::stages;
use crate::core::pipeline::{LatchId, StageContext};
use crate::isa::FuType;

/// Logs a stage call on a latch that is not allocated.
fn stale(stage: &'static str, id: LatchId) {
    tracing::warn!(stage, slot = id.index(), "stage called on a free latch");
}

impl SimCpu {
    /// Allocates a latch for the instruction at the current fetch PC.
    ///
    /// Returns `None` when the arena is exhausted.
    pub fn allocate_latch(&mut self) -> Option<LatchId> {
        self.latch_pool.allocate(self.hart.pc)
    }

    /// Runs the fetch stage on latch `id`.
    pub fn fetch(&mut self, id: LatchId) {
        let Self {
            hart,
            stats,
            mem,
            config,
            latch_pool,
            handlers,
            mem_map,
            ..
        } = self;
        let Some(latch) = latch_pool.get_mut(id) else {
            return stale("fetch", id);
        };
        let mut ctx = StageContext {
            hart,
            stats,
            mem: mem.as_mut(),
            config,
        };
        stages::fetch_stage(&mut ctx, mem_map.as_mut(), handlers, latch);
    }

    /// Runs the decode stage on latch `id`.
    ///
    /// Returns `true` when the earlier stages must be flushed.
    pub fn decode(&mut self, id: LatchId) -> bool {
        let Self {
            hart,
            stats,
            mem,
            config,
            latch_pool,
            handlers,
            decoder,
            ..
        } = self;
        let Some(latch) = latch_pool.get_mut(id) else {
            stale("decode", id);
            return false;
        };
        let mut ctx = StageContext {
            hart,
            stats,
            mem: mem.as_mut(),
            config,
        };
        stages::decode_stage(&mut ctx, decoder.as_ref(), handlers, latch)
    }

    /// Runs branch resolution on latch `id`.
    ///
    /// Returns `true` when the pipeline must be flushed and fetch restarted at
    /// the latch's `branch_target`.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::common::SimError::PredictorInconsistency`].
    pub fn execute(&mut self, id: LatchId) -> SimResult<bool> {
        let Self {
            hart,
            stats,
            mem,
            config,
            latch_pool,
            handlers,
            ..
        } = self;
        let Some(latch) = latch_pool.get_mut(id) else {
            stale("execute", id);
            return Ok(false);
        };
        let mut ctx = StageContext {
            hart,
            stats,
            mem: mem.as_mut(),
            config,
        };
        stages::execute_stage(&mut ctx, handlers, latch)
    }

    /// Runs the memory stage on latch `id`.
    pub fn memory(&mut self, id: LatchId) {
        let Self {
            hart,
            stats,
            mem,
            config,
            latch_pool,
            mem_map,
            ..
        } = self;
        let Some(latch) = latch_pool.get_mut(id) else {
            return stale("memory", id);
        };
        let mut ctx = StageContext {
            hart,
            stats,
            mem: mem.as_mut(),
            config,
        };
        stages::mem_stage(&mut ctx, mem_map.as_mut(), latch);
    }

    /// Restarts fetch at `target` after a misprediction, discarding
    /// speculative fetch requests.
    pub fn redirect_fetch(&mut self, target: u64) {
        self.hart.redirect(target);
        self.mem.reset_frontend_queue();
    }

    /// Releases every latch after a pipeline flush.
    pub fn flush_pipeline(&mut self) {
        self.latch_pool.flush();
    }

    /// Writes the integer result of latch `id` back to the register file.
    pub fn update_arch_reg_int(&mut self, id: LatchId) {
        if let Some(latch) = self.latch_pool.get(id) {
            commit::update_arch_reg_int(&mut self.hart, &mut self.stats, latch);
        }
    }

    /// Writes the floating-point result of latch `id` back to the register file.
    pub fn update_arch_reg_fp(&mut self, id: LatchId) {
        if let Some(latch) = self.latch_pool.get_mut(id) {
            commit::update_arch_reg_fp(&mut self.hart, &mut self.stats, latch);
        }
    }

    /// Counts the retirement of latch `id` and appends it to the trace.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the trace line cannot be written.
    pub fn commit(&mut self, id: LatchId) -> SimResult<()> {
        let Some(latch) = self.latch_pool.get(id) else {
            stale("commit", id);
            return Ok(());
        };
        commit::update_insn_commit_stats(&self.hart, &mut self.stats, latch);
        self.trace.commit(latch, &self.hart.regs)
    }

    /// Records the fault carried by latch `id` as the pending exception and
    /// traces it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the trace line cannot be written.
    pub fn raise_exception(&mut self, id: LatchId) -> SimResult<()> {
        let Some(latch) = self.latch_pool.get(id) else {
            stale("exception", id);
            return Ok(());
        };
        self.exception.raise_from(latch);
        self.trace
            .exception(self.clock, self.hart.priv_level, &self.exception)
    }

    /// Stage budget of latch `id` on the non-pipelined unit `fu`.
    pub fn max_cycles_for_non_pipe_fu(&self, fu: FuType, id: LatchId) -> u64 {
        self.latch_pool
            .get(id)
            .map_or(1, |latch| commit::max_cycles_for_non_pipe_fu(&self.config.pipeline, fu, latch))
    }
}
