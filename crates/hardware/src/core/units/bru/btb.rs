//! Branch Target Buffer (BTB).
//!
//! The BTB is a set-associative table, keyed by program counter, that stores the
//! last resolved target of each control-flow instruction together with a 2-bit
//! direction counter. A probe yields an opaque [`BtbHandle`] that later training
//! calls use to reach the same entry without a second search.

use crate::config::EvictionPolicy;
use crate::core::units::cache::policies::{self, ReplacementPolicy};
use crate::isa::BranchKind;

/// Counter value at or above which a conditional branch is predicted taken.
const COUNTER_TAKEN_THRESHOLD: u8 = 2;

/// Saturation value of the 2-bit direction counter.
const COUNTER_MAX: u8 = 3;

/// Initial counter value of a freshly allocated entry (weakly not-taken).
const COUNTER_INIT: u8 = 1;

/// Location of an entry inside the BTB, returned by a probe or allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BtbHandle {
    set: usize,
    way: usize,
}

/// An entry in the Branch Target Buffer.
#[derive(Clone, Copy, Debug, Default)]
struct BtbEntry {
    /// Full program counter of the owning instruction.
    tag: u64,
    /// Last trained target; 0 until the first update.
    target: u64,
    /// Control-flow class recorded at allocation.
    kind: BranchKind,
    /// Entry belongs to a function return.
    is_return: bool,
    /// 2-bit saturating direction counter.
    counter: u8,
    /// Indicates if this entry contains valid data.
    valid: bool,
}

/// Branch Target Buffer structure.
pub struct Btb {
    table: Vec<BtbEntry>,
    sets: usize,
    ways: usize,
    eviction: EvictionPolicy,
    policy: Box<dyn ReplacementPolicy + Send + Sync>,
}

impl std::fmt::Debug for Btb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Btb")
            .field("sets", &self.sets)
            .field("ways", &self.ways)
            .field("eviction", &self.eviction)
            .finish_non_exhaustive()
    }
}

impl Btb {
    /// Creates a Branch Target Buffer with `size` entries split into sets of `ways`.
    ///
    /// A zero size or associativity is clamped to one entry / one way.
    pub fn new(size: usize, ways: usize, eviction: EvictionPolicy) -> Self {
        let size = size.max(1);
        let ways = ways.clamp(1, size);
        let sets = size / ways;
        Self {
            table: vec![BtbEntry::default(); sets * ways],
            sets,
            ways,
            eviction,
            policy: policies::build(eviction, sets, ways),
        }
    }

    /// Total number of entries.
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    /// Set index for `pc`; the low bit is dropped since encodings are 2-byte aligned.
    fn set_index(&self, pc: u64) -> usize {
        ((pc >> 1) as usize) % self.sets
    }

    fn slot(&self, handle: BtbHandle) -> usize {
        handle.set * self.ways + handle.way
    }

    fn find(&self, pc: u64) -> Option<BtbHandle> {
        let set = self.set_index(pc);
        let base = set * self.ways;
        (0..self.ways)
            .find(|&way| {
                let e = &self.table[base + way];
                e.valid && e.tag == pc
            })
            .map(|way| BtbHandle { set, way })
    }

    fn owns(&self, pc: u64, handle: BtbHandle) -> bool {
        handle.set < self.sets && handle.way < self.ways && {
            let e = &self.table[self.slot(handle)];
            e.valid && e.tag == pc
        }
    }

    /// Searches for `pc`, refreshing the entry's recency on a hit.
    pub fn probe(&mut self, pc: u64) -> Option<BtbHandle> {
        let hit = self.find(pc)?;
        self.policy.update(hit.set, hit.way);
        Some(hit)
    }

    /// Looks up the stored target for `pc` without touching replacement state.
    ///
    /// Returns `None` when `pc` is not resident.
    pub fn lookup(&self, pc: u64) -> Option<u64> {
        self.find(pc).map(|h| self.table[self.slot(h)].target)
    }

    /// Returns the target to fetch from if the entry at `handle` predicts a taken
    /// transfer for `pc`, or 0 when it does not.
    ///
    /// Unconditional entries always predict taken unless they are returns and
    /// `returns_via_ras` is set; conditional entries follow their counter.
    pub fn predicted_target(&self, pc: u64, handle: BtbHandle, returns_via_ras: bool) -> u64 {
        if !self.owns(pc, handle) {
            return 0;
        }
        let e = &self.table[self.slot(handle)];
        let taken = match e.kind {
            BranchKind::Unconditional => !(e.is_return && returns_via_ras),
            BranchKind::Conditional => e.counter >= COUNTER_TAKEN_THRESHOLD,
            BranchKind::None => false,
        };
        if taken { e.target } else { 0 }
    }

    /// Allocates an entry for `pc`, evicting a victim if the set is full.
    ///
    /// If `pc` is already resident its existing entry is returned unchanged.
    pub fn allocate(&mut self, pc: u64, kind: BranchKind, is_return: bool) -> BtbHandle {
        if let Some(hit) = self.probe(pc) {
            return hit;
        }
        let set = self.set_index(pc);
        let base = set * self.ways;
        let way = (0..self.ways)
            .find(|&w| !self.table[base + w].valid)
            .unwrap_or_else(|| self.policy.get_victim(set));
        self.table[base + way] = BtbEntry {
            tag: pc,
            target: 0,
            kind,
            is_return,
            counter: COUNTER_INIT,
            valid: true,
        };
        self.policy.update(set, way);
        BtbHandle { set, way }
    }

    /// Trains the entry for `pc` with a resolved outcome.
    ///
    /// A stale or missing handle allocates a fresh entry first. Returns the
    /// handle of the trained entry.
    pub fn train(
        &mut self,
        pc: u64,
        handle: Option<BtbHandle>,
        kind: BranchKind,
        is_return: bool,
        target: u64,
        taken: bool,
    ) -> BtbHandle {
        let handle = match handle {
            Some(h) if self.owns(pc, h) => h,
            _ => self.allocate(pc, kind, is_return),
        };
        let slot = self.slot(handle);
        let e = &mut self.table[slot];
        e.target = target;
        e.kind = kind;
        e.is_return = is_return;
        if taken {
            e.counter = (e.counter + 1).min(COUNTER_MAX);
        } else {
            e.counter = e.counter.saturating_sub(1);
        }
        handle
    }

    /// Invalidates every entry and resets replacement state.
    pub fn flush(&mut self) {
        self.table.fill(BtbEntry::default());
        self.policy = policies::build(self.eviction, self.sets, self.ways);
    }
}
