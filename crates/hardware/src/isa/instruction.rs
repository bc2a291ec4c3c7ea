//! Decoded instruction record.
//!
//! The functional model decodes each instruction into an [`Insn`]; the timing
//! core only reads the fields it needs for prediction, latency, and statistics.

use crate::common::constants::instruction_size;
use crate::common::error::ExceptionCause;

/// Control-flow class of an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BranchKind {
    /// Not a control-flow instruction.
    #[default]
    None,
    /// Conditional branch (BEQ, BNE, C.BEQZ, ...).
    Conditional,
    /// Unconditional jump (JAL, JALR, C.J, ...).
    Unconditional,
}

impl BranchKind {
    /// Returns `true` for either branch class.
    #[inline(always)]
    pub fn is_branch(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Instruction class used for the per-type commit counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsnType {
    /// Integer arithmetic and logic.
    #[default]
    Arithmetic,
    /// Integer multiply.
    IntMul,
    /// Integer divide and remainder.
    IntDiv,
    /// Integer load.
    Load,
    /// Integer store.
    Store,
    /// Atomic memory operation, LR, or SC.
    Atomic,
    /// Floating-point load.
    FpLoad,
    /// Floating-point store.
    FpStore,
    /// Floating-point add and subtract.
    FpAdd,
    /// Floating-point multiply.
    FpMul,
    /// Fused multiply-add.
    FpFma,
    /// Floating-point divide and square root.
    FpDivSqrt,
    /// Other floating-point operations (moves, compares, conversions).
    FpMisc,
    /// CSR access, fences, ECALL, and other system instructions.
    System,
    /// Conditional branch.
    CondBranch,
    /// Direct jump (JAL).
    Jal,
    /// Indirect jump (JALR).
    Jalr,
}

impl InsnType {
    /// Number of instruction classes.
    pub const COUNT: usize = 17;

    /// Every class, in counter-slot order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Arithmetic,
        Self::IntMul,
        Self::IntDiv,
        Self::Load,
        Self::Store,
        Self::Atomic,
        Self::FpLoad,
        Self::FpStore,
        Self::FpAdd,
        Self::FpMul,
        Self::FpFma,
        Self::FpDivSqrt,
        Self::FpMisc,
        Self::System,
        Self::CondBranch,
        Self::Jal,
        Self::Jalr,
    ];

    /// Returns the counter slot of this class.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short label used in reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Arithmetic => "arithmetic",
            Self::IntMul => "int_mul",
            Self::IntDiv => "int_div",
            Self::Load => "load",
            Self::Store => "store",
            Self::Atomic => "atomic",
            Self::FpLoad => "fp_load",
            Self::FpStore => "fp_store",
            Self::FpAdd => "fp_add",
            Self::FpMul => "fp_mul",
            Self::FpFma => "fp_fma",
            Self::FpDivSqrt => "fp_div_sqrt",
            Self::FpMisc => "fp_misc",
            Self::System => "system",
            Self::CondBranch => "cond_branch",
            Self::Jal => "jal",
            Self::Jalr => "jalr",
        }
    }
}

/// Operation class of a non-pipelined floating-point ALU instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FpuAluOp {
    /// Add or subtract.
    #[default]
    Add,
    /// Multiply.
    Mul,
    /// Divide.
    Div,
    /// Square root.
    Sqrt,
    /// Sign injection, min/max, compare, conversion.
    Misc,
}

/// Functional unit that executes an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FuType {
    /// Pipelined integer ALU.
    #[default]
    IntAlu,
    /// Pipelined integer multiplier.
    IntMul,
    /// Integer divider.
    IntDiv,
    /// Floating-point ALU (non-pipelined).
    FpuAlu,
    /// Floating-point fused multiply-add.
    FpuFma,
    /// Load/store unit.
    Lsu,
    /// Branch unit.
    Branch,
    /// System unit.
    System,
}

/// A decoded instruction as seen by the timing core.
#[derive(Clone, Debug, Default)]
pub struct Insn {
    /// Program counter.
    pub pc: u64,
    /// Raw encoding (16-bit encodings occupy the low half).
    pub binary: u32,
    /// Control-flow class.
    pub branch_kind: BranchKind,
    /// Instruction class for statistics.
    pub insn_type: InsnType,
    /// Functional unit.
    pub fu_type: FuType,
    /// FP ALU operation class (valid when `fu_type == FuType::FpuAlu`).
    pub fpu_alu_op: FpuAluOp,
    /// Call instruction (link register written with the return address).
    pub is_func_call: bool,
    /// Return instruction (indirect jump through the link register).
    pub is_func_ret: bool,
    /// First source register.
    pub rs1: usize,
    /// Second source register.
    pub rs2: usize,
    /// Destination register.
    pub rd: usize,
    /// Integer load.
    pub is_load: bool,
    /// Integer store.
    pub is_store: bool,
    /// Atomic instruction.
    pub is_atomic: bool,
    /// Atomic instruction with a read phase.
    pub is_atomic_load: bool,
    /// Atomic instruction with a write phase.
    pub is_atomic_store: bool,
    /// Access width in bytes.
    pub bytes_to_rw: u64,
    /// Resolved branch condition (taken).
    pub cond: bool,
    /// Computed branch target.
    pub target: u64,
    /// Result value produced by the functional model.
    pub buffer: u64,
    /// Single-precision FP result (NaN-boxed at writeback).
    pub f32_mask: bool,
    /// Double-precision FP result.
    pub f64_mask: bool,
    /// Writeback marks the FP state dirty.
    pub set_fs: bool,
    /// FP status captured at decode.
    pub current_fs: u8,
    /// Effective rounding mode captured at decode.
    pub rm: u8,
    /// Fault raised while processing this instruction.
    pub exception: bool,
    /// Cause of the fault, when `exception` is set.
    pub exception_cause: Option<ExceptionCause>,
    /// Disassembly text (filled only when instruction strings are enabled).
    pub str: String,
}

impl Insn {
    /// Creates a record for the instruction at `pc` with raw encoding `binary`.
    pub fn new(pc: u64, binary: u32) -> Self {
        Self {
            pc,
            binary,
            ..Self::default()
        }
    }

    /// Encoding length in bytes (4 for `0b11` low bits, 2 otherwise).
    #[inline(always)]
    pub fn size(&self) -> u64 {
        instruction_size(self.binary)
    }

    /// Address of the next sequential instruction.
    #[inline(always)]
    pub fn fall_through(&self) -> u64 {
        self.pc.wrapping_add(self.size())
    }

    /// Records an architectural fault.
    pub fn raise(&mut self, cause: ExceptionCause) {
        self.exception = true;
        self.exception_cause = Some(cause);
    }
}
