//! Hart State Tests.
//!
//! Verifies fetch redirection, the fetch-pointer advance through a buffered
//! code window, rounding-mode resolution, and page-walk bookkeeping.

use rstest::rstest;
use rvcycle_core::core::arch::PrivilegeMode;
use rvcycle_core::core::cpu::{CodeWindow, HartState, PageWalk, StageId};

#[test]
fn new_hart_starts_in_machine_mode() {
    let hart = HartState::new(0x1000);
    assert_eq!(hart.priv_level, PrivilegeMode::Machine);
    assert_eq!(hart.pc, 0x1000);
    assert_eq!(hart.code_guest_paddr, 0x1000);
    assert_eq!(hart.page_walk, PageWalk::default());
    assert_eq!(hart.page_walk.latency, 1);
}

#[test]
fn redirect_discards_code_window() {
    let mut hart = HartState::new(0x1000);
    hart.code_window = Some(CodeWindow { ptr: 0, end: 64 });
    hart.redirect(0x2000);
    assert_eq!(hart.pc, 0x2000);
    assert_eq!(hart.code_window, None);
}

#[test]
fn advance_moves_pc_paddr_and_window() {
    let mut hart = HartState::new(0x1000);
    hart.code_guest_paddr = 0x8000_1000;
    hart.code_window = Some(CodeWindow { ptr: 8, end: 64 });

    hart.advance_fetch(2);
    hart.advance_fetch(4);

    assert_eq!(hart.pc, 0x1006);
    assert_eq!(hart.code_guest_paddr, 0x8000_1006);
    assert_eq!(hart.code_window, Some(CodeWindow { ptr: 14, end: 64 }));
}

#[rstest]
#[case::compressed_left(60, 2, Some(CodeWindow { ptr: 62, end: 64 }))]
#[case::exhausted(60, 4, None)]
#[case::overrun(62, 4, None)]
fn advance_drops_exhausted_window(#[case] ptr: u64, #[case] size: u64, #[case] window: Option<CodeWindow>) {
    let mut hart = HartState::new(0x1000);
    hart.code_window = Some(CodeWindow { ptr, end: 64 });
    hart.advance_fetch(size);
    assert_eq!(hart.code_window, window);
}

#[rstest]
#[case::static_rne(0, 0)]
#[case::static_rmm(4, 4)]
#[case::dynamic(7, 3)]
fn rounding_mode_resolution(#[case] rm: u8, #[case] expected: u8) {
    let mut hart = HartState::new(0);
    hart.frm = 3;
    assert_eq!(hart.resolve_rm(rm), expected);
}

#[test]
fn walk_begin_resets_latency() {
    let mut walk = PageWalk {
        latency: 40,
        stage: StageId::Fetch,
        itlb_lookup_accounted: true,
        itlb_hit_accounted: true,
    };
    walk.begin(StageId::Memory);
    assert_eq!(walk.latency, 1);
    assert_eq!(walk.stage, StageId::Memory);
    assert!(walk.itlb_lookup_accounted, "itlb flags belong to the fetch in flight");

    walk.begin(StageId::Fetch);
    assert!(!walk.itlb_lookup_accounted);
    assert!(!walk.itlb_hit_accounted);
}

#[rstest]
#[case(0, 64, 4, true)]
#[case(60, 64, 4, true)]
#[case(62, 64, 4, false)]
#[case(u64::MAX - 1, u64::MAX, 4, false)]
#[case(u64::MAX - 1, u64::MAX, 1, true)]
fn code_window_room(#[case] ptr: u64, #[case] end: u64, #[case] bytes: u64, #[case] room: bool) {
    assert_eq!(CodeWindow { ptr, end }.has_room(bytes), room);
}
