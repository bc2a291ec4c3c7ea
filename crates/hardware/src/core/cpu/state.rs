//! Hart context consumed by the timing core.
//!
//! The functional model owns the full architectural state; this module holds the
//! slice the timing core reads and writes: privilege level, the fetch program
//! counter and its buffered code window, the guest physical addresses of the
//! current fetch and data access, the register files touched at commit, and the
//! page-walk bookkeeping shared with the memory-map collaborator.

use crate::common::constants::RM_DYNAMIC;
use crate::core::arch::PrivilegeMode;

/// Pipeline stage on whose behalf a page-table walk is performed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StageId {
    /// Instruction fetch.
    #[default]
    Fetch,
    /// Load, store, or atomic access.
    Memory,
}

/// Page-walk bookkeeping for the access in flight.
///
/// Each fetch or memory stage resets `latency` to 1; the memory-map collaborator
/// raises it when a hardware walk is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWalk {
    /// Cycles charged for translation.
    pub latency: u64,
    /// Stage that issued the walk.
    pub stage: StageId,
    /// Instruction-TLB lookup already counted for this fetch.
    pub itlb_lookup_accounted: bool,
    /// Instruction-TLB hit already counted for this fetch.
    pub itlb_hit_accounted: bool,
}

impl Default for PageWalk {
    fn default() -> Self {
        Self {
            latency: 1,
            stage: StageId::Fetch,
            itlb_lookup_accounted: false,
            itlb_hit_accounted: false,
        }
    }
}

impl PageWalk {
    /// Prepares for a new access from `stage`.
    pub fn begin(&mut self, stage: StageId) {
        self.latency = 1;
        self.stage = stage;
        if stage == StageId::Fetch {
            self.itlb_lookup_accounted = false;
            self.itlb_hit_accounted = false;
        }
    }
}

/// Size of the shortest (compressed) instruction.
const MIN_INSN_BYTES: u64 = 2;

/// Host-side window of already translated code.
///
/// While a window is present, fetch reads sequentially from it without a new
/// translation; a redirect discards it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeWindow {
    /// Offset of the next instruction within the window.
    pub ptr: u64,
    /// End of the window (exclusive).
    pub end: u64,
}

impl CodeWindow {
    /// Returns `true` while at least `bytes` remain in the window.
    pub fn has_room(&self, bytes: u64) -> bool {
        self.ptr.checked_add(bytes).is_some_and(|next| next <= self.end)
    }
}

/// Architectural context the timing core operates on.
#[derive(Clone, Debug)]
pub struct HartState {
    /// Current privilege level.
    pub priv_level: PrivilegeMode,
    /// Program counter of the next instruction to fetch.
    pub pc: u64,
    /// Buffered code window, if any.
    pub code_window: Option<CodeWindow>,
    /// Guest physical address of the instruction being fetched.
    pub code_guest_paddr: u64,
    /// Guest physical address of the current data access.
    pub data_guest_paddr: u64,
    /// Integer register file.
    pub regs: [u64; 32],
    /// Floating-point register file (raw bits).
    pub fp_regs: [u64; 32],
    /// Floating-point status field of `mstatus` (0 = off, 3 = dirty).
    pub fs: u8,
    /// Dynamic rounding mode (`frm` CSR).
    pub frm: u8,
    /// Page-walk state of the access in flight.
    pub page_walk: PageWalk,
}

impl Default for HartState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl HartState {
    /// Creates a hart in machine mode about to fetch from `pc`.
    pub fn new(pc: u64) -> Self {
        Self {
            priv_level: PrivilegeMode::Machine,
            pc,
            code_window: None,
            code_guest_paddr: pc,
            data_guest_paddr: 0,
            regs: [0; 32],
            fp_regs: [0; 32],
            fs: 0,
            frm: 0,
            page_walk: PageWalk::default(),
        }
    }

    /// Steers fetch to `target`, discarding the buffered code window.
    pub fn redirect(&mut self, target: u64) {
        self.code_window = None;
        self.pc = target;
        tracing::trace!(target = format_args!("{target:#x}"), "fetch redirected");
    }

    /// Advances the fetch pointer past an instruction of `size` bytes.
    ///
    /// A code window too short for another compressed instruction is dropped.
    pub fn advance_fetch(&mut self, size: u64) {
        self.pc = self.pc.wrapping_add(size);
        self.code_guest_paddr = self.code_guest_paddr.wrapping_add(size);
        if let Some(window) = self.code_window.as_mut() {
            window.ptr = window.ptr.saturating_add(size);
        }
        if self.code_window.is_some_and(|w| !w.has_room(MIN_INSN_BYTES)) {
            self.code_window = None;
        }
    }

    /// Effective rounding mode for a static `rm` field: the dynamic value
    /// selects `frm`.
    pub fn resolve_rm(&self, rm: u8) -> u8 {
        if rm == RM_DYNAMIC { self.frm } else { rm }
    }
}
