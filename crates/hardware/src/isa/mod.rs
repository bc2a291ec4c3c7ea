//! Instruction Set Architecture (ISA) definitions used by the timing core.
//!
//! Decoding itself is external; this module defines the record it fills and
//! the contract it implements.

/// Decoder contract implemented by the functional model.
pub mod decode;

/// Decoded instruction record and classification enums.
pub mod instruction;

pub use decode::Decoder;
pub use instruction::{BranchKind, FpuAluOp, FuType, Insn, InsnType};
