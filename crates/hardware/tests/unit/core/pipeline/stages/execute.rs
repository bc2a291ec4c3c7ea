//! Instruction Execute Stage Tests.
//!
//! Verifies that only branches reach the speculation hook and that its
//! verdict and errors are passed through unchanged.

use pretty_assertions::assert_eq;
use rvcycle_core::common::SimError;
use rvcycle_core::config::Config;
use rvcycle_core::core::arch::PrivilegeMode;
use rvcycle_core::core::pipeline::stages::execute_stage;
use rvcycle_core::core::pipeline::{PassthroughStrategy, StageHandlers};

use crate::common::builder::instruction::InsnBuilder;
use crate::common::builder::latch::LatchBuilder;
use crate::common::harness::{StageHarness, predicting_config};

#[test]
fn non_branch_never_flushes() {
    let config = predicting_config(32, 2, 4);
    let mut handlers = StageHandlers::from_config(&config);
    let mut h = StageHarness::new(config);
    let mut latch = LatchBuilder::new(InsnBuilder::new(0x1000).load(8).build()).build();

    assert!(!execute_stage(&mut h.ctx(), &mut handlers, &mut latch).unwrap());
    assert_eq!(h.stats.total().bpu_cond_correct + h.stats.total().bpu_cond_incorrect, 0);
    assert_eq!(handlers.bpu().unwrap().btb().lookup(0x1000), None, "predictor untouched");
}

#[test]
fn passthrough_flushes_on_taken_branch() {
    let mut h = StageHarness::new(Config::default());
    let mut latch = LatchBuilder::new(InsnBuilder::new(0x1000).cond_branch(0x1800, true).build()).build();

    assert!(execute_stage(&mut h.ctx(), &mut PassthroughStrategy, &mut latch).unwrap());
    assert_eq!(latch.branch_target, 0x1800);
}

#[test]
fn predicted_branch_resolved_correct() {
    let config = predicting_config(32, 2, 4);
    let mut handlers = StageHandlers::from_config(&config);
    let mut h = StageHarness::new(config);
    let mut latch = LatchBuilder::new(InsnBuilder::new(0x1000).cond_branch(0x1800, false).build()).build();

    assert!(!execute_stage(&mut h.ctx(), &mut handlers, &mut latch).unwrap());
    assert!(latch.is_pred_correct);
    assert_eq!(h.stats[PrivilegeMode::Machine].bpu_cond_correct, 1);
}

#[test]
fn inconsistent_prediction_is_an_error() {
    let config = predicting_config(32, 2, 4);
    let mut handlers = StageHandlers::from_config(&config);
    let mut h = StageHarness::new(config);
    let mut latch = LatchBuilder::new(InsnBuilder::new(0x1000).cond_branch(0x1800, true).build())
        .predicted(0x1900)
        .build();

    let err = execute_stage(&mut h.ctx(), &mut handlers, &mut latch).unwrap_err();
    assert!(matches!(
        err,
        SimError::PredictorInconsistency {
            pc: 0x1000,
            predicted: 0x1900,
            actual: 0x1800,
        }
    ));
}
