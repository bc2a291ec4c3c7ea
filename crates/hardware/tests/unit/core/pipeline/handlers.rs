//! Speculation Strategy Tests.
//!
//! Drives the predicting and passthrough hooks directly against a
//! [`StageHarness`], covering fetch-time prediction, decode-time insertion and
//! return-address handling, and execute-time verification.

use proptest::prelude::*;
use rvcycle_core::common::SimError;
use rvcycle_core::config::Config;
use rvcycle_core::core::arch::PrivilegeMode;
use rvcycle_core::core::pipeline::{
    InstructionLatch, PassthroughStrategy, PredictingStrategy, SpeculationStrategy, StageHandlers,
};
use rvcycle_core::core::units::bru::Bpu;
use rvcycle_core::isa::BranchKind;
use rvcycle_core::stats::SimStats;

use crate::common::builder::instruction::{CALL_16, InsnBuilder, RET_16};
use crate::common::builder::latch::LatchBuilder;
use crate::common::harness::{StageHarness, predicting_config};

const M: PrivilegeMode = PrivilegeMode::Machine;

fn predicting(ras_size: usize) -> (StageHarness, PredictingStrategy) {
    let config = predicting_config(32, 2, ras_size);
    let strategy = PredictingStrategy::new(Bpu::new(&config.bpu));
    (StageHarness::new(config), strategy)
}

/// Trains `pc` as a taken transfer to `target` of the given kind.
fn train(strategy: &mut PredictingStrategy, pc: u64, target: u64, kind: BranchKind) {
    let mut probe = None;
    strategy.bpu_mut().update(pc, target, true, kind, false, &mut probe);
    strategy.bpu_mut().update(pc, target, true, kind, false, &mut probe);
}

// ══════════════════════════════════════════════════════════
// 1. Fetch
// ══════════════════════════════════════════════════════════

#[test]
fn fetch_miss_predicts_nothing() {
    let (mut h, mut s) = predicting(4);
    let mut latch = LatchBuilder::at(0x1000).build();
    h.hart.pc = 0x1004;
    s.on_fetch(&mut h.ctx(), &mut latch);

    assert_eq!(latch.predicted_target, 0);
    assert_eq!(latch.bpu_probe, None);
    assert_eq!(h.hart.pc, 0x1004, "fetch continues sequentially");
    assert_eq!(h.stats[M].btb_probes, 1);
    assert_eq!(h.stats[M].btb_hits, 0);
}

#[test]
fn fetch_hit_redirects_to_predicted_target() {
    let (mut h, mut s) = predicting(4);
    train(&mut s, 0x1000, 0x2000, BranchKind::Conditional);
    let mut latch = LatchBuilder::at(0x1000).build();
    s.on_fetch(&mut h.ctx(), &mut latch);

    assert_eq!(latch.predicted_target, 0x2000);
    assert!(latch.bpu_probe.is_some());
    assert_eq!(h.hart.pc, 0x2000);
    assert_eq!(h.stats[M].btb_hits, 1);
}

#[test]
fn fetch_hit_on_not_taken_entry_does_not_redirect() {
    let (mut h, mut s) = predicting(4);
    let mut probe = None;
    s.bpu_mut()
        .update(0x1000, 0x2000, false, BranchKind::Conditional, false, &mut probe);
    let mut latch = LatchBuilder::at(0x1000).build();
    h.hart.pc = 0x1004;
    s.on_fetch(&mut h.ctx(), &mut latch);

    assert!(latch.bpu_probe.is_some(), "hit recorded");
    assert_eq!(latch.predicted_target, 0);
    assert_eq!(h.hart.pc, 0x1004);
    assert_eq!(h.stats[M].btb_hits, 1);
}

// ══════════════════════════════════════════════════════════
// 2. Decode
// ══════════════════════════════════════════════════════════

#[test]
fn decode_inserts_branch_missed_at_fetch() {
    let (mut h, mut s) = predicting(4);
    let mut latch = LatchBuilder::new(InsnBuilder::new(0x1000).cond_branch(0x2000, true).build()).build();
    assert!(!s.on_decode(&mut h.ctx(), &mut latch));
    assert!(latch.bpu_probe.is_some());
    assert_eq!(s.bpu_mut().probe(0x1000), latch.bpu_probe);
}

#[test]
fn decode_pushes_fall_through_on_call() {
    let (mut h, mut s) = predicting(4);
    let insn = InsnBuilder::new(0x3000).binary(CALL_16).call(0x4000).build();
    let mut latch = LatchBuilder::new(insn).build();
    assert!(!s.on_decode(&mut h.ctx(), &mut latch));
    assert_eq!(s.bpu().ras().top(), Some(0x3002));
    assert_eq!(h.stats[M].ras_push, 1);
}

#[test]
fn decode_return_pops_and_redirects() {
    let (mut h, mut s) = predicting(4);
    s.bpu_mut().push_return(0x3002);
    let insn = InsnBuilder::new(0x4000).binary(RET_16).ret(0x3002).build();
    let mut latch = LatchBuilder::new(insn).build();
    h.hart.pc = 0x4002;

    assert!(s.on_decode(&mut h.ctx(), &mut latch), "earlier stages must be flushed");
    assert_eq!(h.hart.pc, 0x3002);
    assert_eq!(latch.predicted_target, 0x3002);
    assert_eq!(h.stats[M].ras_pop, 1);
    assert_eq!(h.mem.log().borrow().frontend_resets, 1);
}

#[test]
fn decode_return_with_empty_ras_keeps_fetching() {
    let (mut h, mut s) = predicting(4);
    let insn = InsnBuilder::new(0x4000).binary(RET_16).ret(0x3002).build();
    let mut latch = LatchBuilder::new(insn).build();
    h.hart.pc = 0x4002;

    assert!(!s.on_decode(&mut h.ctx(), &mut latch));
    assert_eq!(h.hart.pc, 0x4002);
    assert_eq!(h.stats[M].ras_pop, 0);
    assert_eq!(h.mem.log().borrow().frontend_resets, 0);
}

#[test]
fn decode_without_ras_ignores_calls_and_returns() {
    let (mut h, mut s) = predicting(0);
    let call = InsnBuilder::new(0x3000).binary(CALL_16).call(0x4000).build();
    let mut latch = LatchBuilder::new(call).build();
    assert!(!s.on_decode(&mut h.ctx(), &mut latch));
    assert_eq!(h.stats[M].ras_push, 0);
    assert!(latch.bpu_probe.is_some(), "the branch is still inserted");
}

// ══════════════════════════════════════════════════════════
// 3. Execute
// ══════════════════════════════════════════════════════════

fn execute(taken: bool, predicted: u64, kind: BranchKind) -> (Result<bool, SimError>, InstructionLatch, StageHarness) {
    let (mut h, mut s) = predicting(4);
    let builder = InsnBuilder::new(0x1000);
    let insn = match kind {
        BranchKind::Conditional => builder.cond_branch(0x2000, taken).build(),
        _ => builder.jump(0x2000).build(),
    };
    let mut latch = LatchBuilder::new(insn).predicted(predicted).build();
    let result = s.on_execute(&mut h.ctx(), &mut latch);
    (result, latch, h)
}

#[test]
fn taken_conditional_without_prediction_mispredicts() {
    let (result, latch, h) = execute(true, 0, BranchKind::Conditional);
    assert!(result.unwrap());
    assert_eq!(latch.branch_target, 0x2000);
    assert!(latch.is_branch_taken);
    assert!(!latch.is_pred_correct);
    assert_eq!(h.stats[M].bpu_cond_incorrect, 1);
}

#[test]
fn not_taken_conditional_predicted_taken_resumes_at_fall_through() {
    let (result, latch, h) = execute(false, 0x2000, BranchKind::Conditional);
    assert!(result.unwrap());
    assert_eq!(latch.branch_target, 0x1004);
    assert!(!latch.is_branch_taken);
    assert_eq!(h.stats[M].bpu_cond_incorrect, 1);
}

#[test]
fn taken_conditional_with_wrong_target_is_inconsistent() {
    let (result, _, _) = execute(true, 0x3000, BranchKind::Conditional);
    match result {
        Err(SimError::PredictorInconsistency {
            pc,
            predicted,
            actual,
        }) => {
            assert_eq!((pc, predicted, actual), (0x1000, 0x3000, 0x2000));
        }
        other => panic!("expected predictor inconsistency, got {other:?}"),
    }
}

#[test]
fn execute_trains_with_resolved_outcome() {
    let (mut h, mut s) = predicting(4);
    let insn = InsnBuilder::new(0x1000).cond_branch(0x2000, true).build();
    let mut latch = LatchBuilder::new(insn).build();
    let _ = s.on_execute(&mut h.ctx(), &mut latch).unwrap();

    let handle = s.bpu_mut().probe(0x1000).expect("missing entry inserted at execute");
    assert_eq!(s.bpu().get_target(0x1000, handle), 0x2000);
}

#[test]
fn correct_unconditional_keeps_branch_target() {
    let (result, latch, h) = execute(true, 0x2000, BranchKind::Unconditional);
    assert!(!result.unwrap());
    assert!(latch.is_pred_correct);
    assert_eq!(latch.branch_target, 0x2000);
    assert_eq!(h.stats[M].bpu_uncond_correct, 1);
}

#[test]
fn non_branch_never_mispredicts() {
    let (mut h, mut s) = predicting(4);
    let mut latch = LatchBuilder::new(InsnBuilder::new(0x1000).build()).build();
    assert!(!s.on_execute(&mut h.ctx(), &mut latch).unwrap());
    assert_eq!(h.stats[M], SimStats::default());
}

#[test]
fn return_reinserted_at_execute_still_defers_to_ras() {
    let (mut h, mut s) = predicting(4);
    let insn = InsnBuilder::new(0x4000).binary(RET_16).ret(0x3002).build();
    let mut latch = LatchBuilder::new(insn).build();
    assert!(s.on_execute(&mut h.ctx(), &mut latch).unwrap(), "no prediction to confirm");

    let mut refetch = LatchBuilder::at(0x4000).build();
    h.hart.pc = 0x4002;
    s.on_fetch(&mut h.ctx(), &mut refetch);
    assert!(refetch.bpu_probe.is_some(), "entry was reinserted");
    assert_eq!(refetch.predicted_target, 0);
    assert_eq!(h.hart.pc, 0x4002);
}

proptest! {
    #[test]
    fn conditional_resolution(taken in any::<bool>(), predicted_taken in any::<bool>(), target in (0x100u64..0x10_0000).prop_map(|t| t & !1)) {
        let (mut h, mut s) = predicting(4);
        let insn = InsnBuilder::new(0x1000).cond_branch(target, taken).build();
        let predicted = if predicted_taken { target } else { 0 };
        let mut latch = LatchBuilder::new(insn).predicted(predicted).build();

        let mispredict = s.on_execute(&mut h.ctx(), &mut latch).unwrap();

        prop_assert_eq!(mispredict, taken != predicted_taken);
        prop_assert_eq!(latch.is_branch_taken, taken);
        prop_assert_eq!(latch.is_pred_correct, !mispredict);
        if mispredict {
            let resume = if taken { target } else { 0x1004 };
            prop_assert_eq!(latch.branch_target, resume);
        }
        let st = &h.stats[M];
        prop_assert_eq!(st.bpu_cond_correct + st.bpu_cond_incorrect, 1);
        prop_assert_eq!(st.bpu_cond_incorrect, u64::from(mispredict));
    }

    #[test]
    fn unconditional_resolution(target in 1u64..0x10_0000, predicted in 0u64..0x10_0000) {
        let (mut h, mut s) = predicting(4);
        let insn = InsnBuilder::new(0x1000).jump(target).build();
        let mut latch = LatchBuilder::new(insn).predicted(predicted).build();

        let mispredict = s.on_execute(&mut h.ctx(), &mut latch).unwrap();

        prop_assert_eq!(mispredict, predicted != target);
        prop_assert!(latch.is_branch_taken);
        prop_assert_eq!(latch.branch_target, target, "correction and timeout resume agree");
        let st = &h.stats[M];
        prop_assert_eq!(st.bpu_uncond_correct + st.bpu_uncond_incorrect, 1);
    }

    #[test]
    fn passthrough_redirects_exactly_on_taken(cond in any::<bool>(), unconditional in any::<bool>()) {
        let mut h = StageHarness::new(Config::default());
        let builder = InsnBuilder::new(0x1000);
        let insn = if unconditional {
            builder.jump(0x2000).build()
        } else {
            builder.cond_branch(0x2000, cond).build()
        };
        let mut latch = LatchBuilder::new(insn).build();

        let redirect = PassthroughStrategy.on_execute(&mut h.ctx(), &mut latch).unwrap();

        let taken = unconditional || cond;
        prop_assert_eq!(redirect, taken);
        prop_assert_eq!(latch.is_branch_taken, taken);
        prop_assert_eq!(latch.branch_target, if taken { 0x2000 } else { 0 });
        prop_assert_eq!(h.stats[M], SimStats::default());
    }
}

// ══════════════════════════════════════════════════════════
// 4. Passthrough and selection
// ══════════════════════════════════════════════════════════

#[test]
fn passthrough_fetch_and_decode_do_nothing() {
    let mut h = StageHarness::new(Config::default());
    let insn = InsnBuilder::new(0x4000).binary(RET_16).ret(0x3002).build();
    let mut latch = LatchBuilder::new(insn).build();
    h.hart.pc = 0x4002;

    PassthroughStrategy.on_fetch(&mut h.ctx(), &mut latch);
    assert!(!PassthroughStrategy.on_decode(&mut h.ctx(), &mut latch));
    assert_eq!(h.hart.pc, 0x4002);
    assert_eq!(latch.predicted_target, 0);
    assert_eq!(h.stats[M].btb_probes, 0);
}

#[test]
fn handlers_selected_from_config() {
    let handlers = StageHandlers::from_config(&Config::default());
    assert!(matches!(handlers, StageHandlers::Passthrough(_)));
    assert!(handlers.bpu().is_none());

    let handlers = StageHandlers::from_config(&predicting_config(64, 4, 8));
    assert!(matches!(handlers, StageHandlers::Predicting(_)));
    let bpu = handlers.bpu().unwrap();
    assert_eq!(bpu.btb().capacity(), 64);
    assert_eq!(bpu.ras().capacity(), 8);
}
