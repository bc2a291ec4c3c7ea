//! Speculation strategies invoked by the stage executors.
//!
//! Whether branch prediction is modelled is decided once, when the simulation
//! object is built, by choosing a [`StageHandlers`] variant:
//! 1. **Predicting:** Fetch probes the BPU and redirects on a taken prediction,
//!    decode inserts missed branches and drives the return-address stack, and
//!    execute verifies the prediction and trains the predictor.
//! 2. **Passthrough:** Fetch and decode do nothing; execute treats every taken
//!    branch as a redirect.
//!
//! The stage executors call through [`StageHandlers`] unconditionally and never
//! consult the configuration again.

use crate::common::error::{SimError, SimResult};
use crate::config::Config;
use crate::core::cpu::HartState;
use crate::core::pipeline::latches::InstructionLatch;
use crate::core::units::bru::Bpu;
use crate::isa::BranchKind;
use crate::soc::traits::MemoryHierarchy;
use crate::stats::StatsTable;

/// Shared state a stage executor and its handler operate on.
pub struct StageContext<'a> {
    /// Architectural context of the hart.
    pub hart: &'a mut HartState,
    /// Per-privilege counters.
    pub stats: &'a mut StatsTable,
    /// Cache and DRAM timing engine.
    pub mem: &'a mut dyn MemoryHierarchy,
    /// Session configuration.
    pub config: &'a Config,
}

impl std::fmt::Debug for StageContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("hart", &self.hart)
            .finish_non_exhaustive()
    }
}

/// Per-stage speculation hooks.
pub trait SpeculationStrategy {
    /// Applies fetch-time prediction to a freshly fetched instruction.
    fn on_fetch(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch);

    /// Applies decode-time training and return prediction to a branch.
    ///
    /// Returns `true` when fetch was redirected and the earlier stages must be
    /// flushed.
    fn on_decode(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) -> bool;

    /// Resolves a branch against its prediction.
    ///
    /// Returns `true` on a misprediction; `latch.branch_target` then holds the
    /// address fetch must resume at.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::PredictorInconsistency`] when a taken conditional
    /// branch was predicted to a target other than the resolved one.
    fn on_execute(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) -> SimResult<bool>;
}

/// Handlers used when branch prediction is modelled.
#[derive(Debug)]
pub struct PredictingStrategy {
    bpu: Bpu,
}

impl PredictingStrategy {
    /// Wraps a branch prediction unit.
    pub fn new(bpu: Bpu) -> Self {
        Self { bpu }
    }

    /// The underlying predictor.
    pub fn bpu(&self) -> &Bpu {
        &self.bpu
    }

    /// Mutable access to the underlying predictor.
    pub fn bpu_mut(&mut self) -> &mut Bpu {
        &mut self.bpu
    }

    /// Re-probes at execute, keeping the latch's handle current.
    fn reprobe(&mut self, latch: &mut InstructionLatch) {
        let pc = latch.insn.pc;
        latch.bpu_probe = self.bpu.probe(pc);
        if latch.bpu_probe.is_none() {
            tracing::debug!(pc = format_args!("{pc:#x}"), "execute re-probe missed; entry will be reinserted");
        }
    }

    fn resolve_conditional(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) -> SimResult<bool> {
        self.reprobe(latch);
        let mode = ctx.hart.priv_level;
        let stats = &mut ctx.stats[mode];
        let insn = &latch.insn;
        let mut mispredict = false;

        if insn.cond {
            if latch.predicted_target == 0 {
                stats.bpu_cond_incorrect += 1;
                latch.branch_target = insn.target;
                mispredict = true;
            } else {
                if latch.predicted_target != insn.target {
                    tracing::error!(
                        pc = format_args!("{:#x}", insn.pc),
                        predicted = format_args!("{:#x}", latch.predicted_target),
                        actual = format_args!("{:#x}", insn.target),
                        "predictor inconsistency"
                    );
                    return Err(SimError::PredictorInconsistency {
                        pc: insn.pc,
                        predicted: latch.predicted_target,
                        actual: insn.target,
                    });
                }
                latch.is_pred_correct = true;
                latch.branch_target = latch.predicted_target;
                stats.bpu_cond_correct += 1;
            }
            latch.is_branch_taken = true;
        } else {
            if latch.predicted_target == 0 {
                latch.is_pred_correct = true;
                stats.bpu_cond_correct += 1;
            } else {
                stats.bpu_cond_incorrect += 1;
                latch.branch_target = insn.fall_through();
                mispredict = true;
            }
            latch.is_branch_taken = false;
        }

        self.bpu.update(
            insn.pc,
            insn.target,
            insn.cond,
            BranchKind::Conditional,
            false,
            &mut latch.bpu_probe,
        );
        Ok(mispredict)
    }

    fn resolve_unconditional(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) -> bool {
        self.reprobe(latch);
        let insn = &latch.insn;
        self.bpu.update(
            insn.pc,
            insn.target,
            true,
            BranchKind::Unconditional,
            insn.is_func_ret,
            &mut latch.bpu_probe,
        );

        let mode = ctx.hart.priv_level;
        let stats = &mut ctx.stats[mode];
        let mispredict = if latch.predicted_target == insn.target {
            latch.is_pred_correct = true;
            // Kept so a supervisory timeout after commit can resume here.
            latch.branch_target = latch.predicted_target;
            stats.bpu_uncond_correct += 1;
            false
        } else {
            latch.branch_target = insn.target;
            stats.bpu_uncond_incorrect += 1;
            true
        };
        latch.is_branch_taken = true;
        mispredict
    }
}

impl SpeculationStrategy for PredictingStrategy {
    fn on_fetch(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) {
        let pc = latch.insn.pc;
        let mode = ctx.hart.priv_level;
        let stats = &mut ctx.stats[mode];
        stats.btb_probes += 1;

        latch.bpu_probe = self.bpu.probe(pc);
        let target = match latch.bpu_probe {
            Some(handle) => {
                stats.btb_hits += 1;
                self.bpu.get_target(pc, handle)
            }
            None => 0,
        };
        if target != 0 {
            ctx.hart.redirect(target);
        }
        latch.predicted_target = target;
    }

    fn on_decode(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) -> bool {
        let insn = &latch.insn;
        if latch.bpu_probe.is_none() {
            latch.bpu_probe = Some(self.bpu.add(insn.pc, insn.branch_kind, insn.is_func_ret));
        }

        if !self.bpu.ras_enabled() {
            return false;
        }

        let mode = ctx.hart.priv_level;
        let stats = &mut ctx.stats[mode];
        if insn.is_func_call {
            self.bpu.push_return(insn.fall_through());
            stats.ras_push += 1;
        }

        if insn.is_func_ret {
            if let Some(target) = self.bpu.pop_return() {
                stats.ras_pop += 1;
                if target != 0 {
                    ctx.hart.redirect(target);
                    latch.predicted_target = target;
                    ctx.mem.reset_frontend_queue();
                    return true;
                }
            }
        }
        false
    }

    fn on_execute(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) -> SimResult<bool> {
        match latch.insn.branch_kind {
            BranchKind::Conditional => self.resolve_conditional(ctx, latch),
            BranchKind::Unconditional => Ok(self.resolve_unconditional(ctx, latch)),
            BranchKind::None => Ok(false),
        }
    }
}

/// Handlers used when branch prediction is not modelled.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughStrategy;

impl SpeculationStrategy for PassthroughStrategy {
    fn on_fetch(&mut self, _ctx: &mut StageContext<'_>, _latch: &mut InstructionLatch) {}

    fn on_decode(&mut self, _ctx: &mut StageContext<'_>, _latch: &mut InstructionLatch) -> bool {
        false
    }

    fn on_execute(&mut self, _ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) -> SimResult<bool> {
        let taken = match latch.insn.branch_kind {
            BranchKind::Unconditional => true,
            BranchKind::Conditional => latch.insn.cond,
            BranchKind::None => false,
        };
        if taken {
            latch.is_branch_taken = true;
            latch.branch_target = latch.insn.target;
        }
        Ok(taken)
    }
}

/// The strategy selected for a session.
///
/// Static dispatch over the two variants.
#[derive(Debug)]
pub enum StageHandlers {
    /// Branch prediction modelled.
    Predicting(PredictingStrategy),
    /// Branch prediction not modelled.
    Passthrough(PassthroughStrategy),
}

impl StageHandlers {
    /// Selects the strategy from the `bpu` section of `config`.
    pub fn from_config(config: &Config) -> Self {
        if config.bpu.enabled {
            tracing::debug!(
                btb_size = config.bpu.btb_size,
                btb_ways = config.bpu.btb_ways,
                ras_size = config.bpu.ras_size,
                "setting up branch prediction unit"
            );
            Self::Predicting(PredictingStrategy::new(Bpu::new(&config.bpu)))
        } else {
            Self::Passthrough(PassthroughStrategy)
        }
    }

    /// The predictor, when prediction is modelled.
    pub fn bpu(&self) -> Option<&Bpu> {
        match self {
            Self::Predicting(p) => Some(p.bpu()),
            Self::Passthrough(_) => None,
        }
    }

    /// Mutable access to the predictor, when prediction is modelled.
    pub fn bpu_mut(&mut self) -> Option<&mut Bpu> {
        match self {
            Self::Predicting(p) => Some(p.bpu_mut()),
            Self::Passthrough(_) => None,
        }
    }
}

impl SpeculationStrategy for StageHandlers {
    #[inline]
    fn on_fetch(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) {
        match self {
            Self::Predicting(p) => p.on_fetch(ctx, latch),
            Self::Passthrough(p) => p.on_fetch(ctx, latch),
        }
    }

    #[inline]
    fn on_decode(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) -> bool {
        match self {
            Self::Predicting(p) => p.on_decode(ctx, latch),
            Self::Passthrough(p) => p.on_decode(ctx, latch),
        }
    }

    #[inline]
    fn on_execute(&mut self, ctx: &mut StageContext<'_>, latch: &mut InstructionLatch) -> SimResult<bool> {
        match self {
            Self::Predicting(p) => p.on_execute(ctx, latch),
            Self::Passthrough(p) => p.on_execute(ctx, latch),
        }
    }
}
