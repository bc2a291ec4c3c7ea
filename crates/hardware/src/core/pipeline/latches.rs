//! Instruction latches and the latch arena.
//!
//! Every in-flight instruction owns one [`InstructionLatch`] for its whole trip
//! through the pipeline. Latches live in a preallocated [`LatchPool`] and are
//! addressed by [`LatchId`]; slots are reused round-robin and the pool is drained
//! as a whole on a pipeline flush.

use crate::common::constants::INSN_LATCH_POOL_SIZE;
use crate::core::units::bru::BtbHandle;
use crate::isa::Insn;

/// Simulation-time state of one in-flight instruction.
#[derive(Clone, Debug, Default)]
pub struct InstructionLatch {
    /// Decoded instruction record.
    pub insn: Insn,
    /// Target committed at fetch; 0 means no taken prediction.
    pub predicted_target: u64,
    /// Branch resolved taken.
    pub is_branch_taken: bool,
    /// Prediction verified correct at execute.
    pub is_pred_correct: bool,
    /// Correction (or resume-after-timeout) target set at execute.
    pub branch_target: u64,
    /// Cycles spent so far in the current stage.
    pub elapsed_clock_cycles: u64,
    /// Cycles budgeted for the current stage.
    pub max_clock_cycles: u64,
    /// Predictor entry found by the latest probe.
    pub bpu_probe: Option<BtbHandle>,
}

impl InstructionLatch {
    /// Prepares the latch for a new instruction at `pc`.
    fn reuse(&mut self, pc: u64) {
        *self = Self::default();
        self.insn.pc = pc;
    }

    /// Returns `true` once the current stage has spent its budget.
    pub fn stage_done(&self) -> bool {
        self.elapsed_clock_cycles >= self.max_clock_cycles
    }
}

/// Index of a latch inside a [`LatchPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LatchId(usize);

impl LatchId {
    /// Slot number inside the pool.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Fixed-capacity arena of instruction latches.
#[derive(Debug)]
pub struct LatchPool {
    latches: Vec<InstructionLatch>,
    in_use: Vec<bool>,
    next: usize,
    live: usize,
}

impl Default for LatchPool {
    fn default() -> Self {
        Self::new(INSN_LATCH_POOL_SIZE)
    }
}

impl LatchPool {
    /// Creates a pool with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            latches: vec![InstructionLatch::default(); capacity],
            in_use: vec![false; capacity],
            next: 0,
            live: 0,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.latches.len()
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` when no slot is allocated.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Claims the next free slot for an instruction at `pc`.
    ///
    /// Slots are handed out round-robin starting after the last allocation.
    /// Returns `None` when every slot is in use.
    pub fn allocate(&mut self, pc: u64) -> Option<LatchId> {
        let cap = self.capacity();
        let slot = (0..cap)
            .map(|i| (self.next + i) % cap)
            .find(|&i| !self.in_use[i])?;
        self.in_use[slot] = true;
        self.latches[slot].reuse(pc);
        self.next = (slot + 1) % cap;
        self.live += 1;
        Some(LatchId(slot))
    }

    /// Shared access to an allocated latch.
    pub fn get(&self, id: LatchId) -> Option<&InstructionLatch> {
        self.in_use
            .get(id.0)
            .copied()
            .unwrap_or(false)
            .then(|| &self.latches[id.0])
    }

    /// Exclusive access to an allocated latch.
    pub fn get_mut(&mut self, id: LatchId) -> Option<&mut InstructionLatch> {
        if self.in_use.get(id.0).copied().unwrap_or(false) {
            Some(&mut self.latches[id.0])
        } else {
            None
        }
    }

    /// Returns a slot to the pool. Freeing a free slot is a no-op.
    pub fn free(&mut self, id: LatchId) {
        if let Some(used) = self.in_use.get_mut(id.0) {
            if *used {
                *used = false;
                self.live -= 1;
            }
        }
    }

    /// Releases every slot, keeping the round-robin position.
    pub fn flush(&mut self) {
        self.in_use.fill(false);
        self.live = 0;
    }

    /// Returns the pool to its initial, unallocated state.
    pub fn reset(&mut self) {
        self.latches.fill(InstructionLatch::default());
        self.in_use.fill(false);
        self.next = 0;
        self.live = 0;
    }
}
