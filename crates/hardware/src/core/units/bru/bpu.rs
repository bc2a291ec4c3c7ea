//! Branch Prediction Unit facade.
//!
//! Combines the BTB and the RAS behind the probe / add / update protocol used by
//! the stage handlers:
//! 1. **Probe:** fetch looks up the PC and remembers the handle on the latch.
//! 2. **Add:** decode inserts an entry when the fetch probe missed.
//! 3. **Update:** execute trains the entry with the resolved outcome, inserting
//!    a fresh one when the probe missed.

use crate::config::BpuConfig;
use crate::core::units::bru::btb::{Btb, BtbHandle};
use crate::core::units::bru::ras::Ras;
use crate::isa::BranchKind;

/// Branch prediction unit: target buffer plus return-address stack.
#[derive(Debug)]
pub struct Bpu {
    btb: Btb,
    ras: Ras,
}

impl Bpu {
    /// Builds the predictor from its configuration section.
    pub fn new(config: &BpuConfig) -> Self {
        Self {
            btb: Btb::new(config.btb_size, config.btb_ways, config.btb_eviction),
            ras: Ras::new(config.ras_size),
        }
    }

    /// Returns `true` when return-address tracking is configured.
    #[inline(always)]
    pub fn ras_enabled(&self) -> bool {
        self.ras.capacity() > 0
    }

    /// Looks up `pc`, returning the entry handle on a hit.
    #[inline]
    pub fn probe(&mut self, pc: u64) -> Option<BtbHandle> {
        self.btb.probe(pc)
    }

    /// Target predicted for the entry at `handle`, or 0 for "no taken prediction".
    #[inline]
    pub fn get_target(&self, pc: u64, handle: BtbHandle) -> u64 {
        self.btb.predicted_target(pc, handle, self.ras_enabled())
    }

    /// Inserts an entry for a branch whose fetch-time probe missed.
    pub fn add(&mut self, pc: u64, kind: BranchKind, is_return: bool) -> BtbHandle {
        self.btb.allocate(pc, kind, is_return)
    }

    /// Trains the predictor with a resolved outcome.
    ///
    /// `probe` is the latch's probe snapshot; it is replaced with the handle of
    /// the trained entry, which is freshly allocated when the probe missed.
    /// `is_return` keeps return entries deferring to the RAS even after a
    /// re-allocation.
    pub fn update(
        &mut self,
        pc: u64,
        target: u64,
        taken: bool,
        kind: BranchKind,
        is_return: bool,
        probe: &mut Option<BtbHandle>,
    ) {
        *probe = Some(self.btb.train(pc, *probe, kind, is_return, target, taken));
    }

    /// Pushes a return address on a call.
    pub fn push_return(&mut self, addr: u64) {
        self.ras.push(addr);
    }

    /// Pops the predicted return address on a return.
    pub fn pop_return(&mut self) -> Option<u64> {
        self.ras.pop()
    }

    /// Read access to the target buffer.
    pub fn btb(&self) -> &Btb {
        &self.btb
    }

    /// Read access to the return-address stack.
    pub fn ras(&self) -> &Ras {
        &self.ras
    }

    /// Clears all predictor state.
    pub fn flush(&mut self) {
        self.btb.flush();
        self.ras.flush();
    }
}
