//! Decoder contract.
//!
//! Binary-to-operation decoding belongs to the functional model. The timing core
//! hands it the raw encoding after capturing the floating-point context and
//! expects the semantic fields of [`Insn`] to be populated.

use crate::isa::instruction::Insn;

/// Semantic instruction decoder supplied by the functional model.
pub trait Decoder {
    /// Populates the semantic fields of `insn` from `binary`.
    ///
    /// `insn.current_fs` and `insn.rm` are already set when this is called.
    /// When `create_str` is set the decoder also fills `insn.str` with the
    /// disassembly; otherwise it may leave it empty.
    fn decode(&self, insn: &mut Insn, binary: u32, create_str: bool);
}
