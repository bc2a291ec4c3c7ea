//! Commit trace.
//!
//! While tracing is active, every committed instruction appends one line:
//!
//! ```text
//! pc=80000010 beq a0,a1,80000020 rs1_val=5 rs2_val=5
//! ```
//!
//! Conditional branches carry their source register values (`c.beqz` and
//! `c.bnez` only `rs1`). Exceptions append a line with the clock cycle, the
//! faulting encoding, and the privilege mode.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::common::error::{SimError, SimResult};
use crate::core::arch::PrivilegeMode;
use crate::core::cpu::SimException;
use crate::core::pipeline::InstructionLatch;

/// Compressed conditional branches; trace only `rs1`.
const ONE_SOURCE_BRANCHES: [&str; 2] = ["c.beqz", "c.bnez"];

/// Two-operand conditional branches; trace `rs1` and `rs2`.
const TWO_SOURCE_BRANCHES: [&str; 4] = ["beq", "bne", "blt", "bge"];

/// File-backed trace sink.
#[derive(Debug, Default)]
pub struct SimTrace {
    out: Option<(PathBuf, BufWriter<File>)>,
}

impl SimTrace {
    /// Creates an inactive sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a trace file is open.
    pub fn is_active(&self) -> bool {
        self.out.is_some()
    }

    /// Path of the open trace file.
    pub fn path(&self) -> Option<&Path> {
        self.out.as_ref().map(|(p, _)| p.as_path())
    }

    /// Opens (truncating) `path` for tracing. An already open trace is closed first.
    pub fn start(&mut self, path: &Path) -> SimResult<()> {
        self.stop()?;
        let file = File::create(path).map_err(|e| SimError::io(path, e))?;
        self.out = Some((path.to_path_buf(), BufWriter::new(file)));
        Ok(())
    }

    /// Flushes and closes the trace file, if open.
    pub fn stop(&mut self) -> SimResult<()> {
        if let Some((path, mut w)) = self.out.take() {
            w.flush().map_err(|e| SimError::io(&path, e))?;
        }
        Ok(())
    }

    /// Appends the commit line of `latch`; `regs` supplies branch operands.
    pub fn commit(&mut self, latch: &InstructionLatch, regs: &[u64; 32]) -> SimResult<()> {
        let Some((path, w)) = self.out.as_mut() else {
            return Ok(());
        };
        let insn = &latch.insn;
        let write = |w: &mut BufWriter<File>| -> std::io::Result<()> {
            write!(w, "pc={:x} {}", insn.pc, insn.str)?;
            if ONE_SOURCE_BRANCHES.iter().any(|m| insn.str.starts_with(m)) {
                write!(w, " rs1_val={:x}", regs[insn.rs1])?;
            } else if TWO_SOURCE_BRANCHES.iter().any(|m| insn.str.starts_with(m)) {
                write!(w, " rs1_val={:x} rs2_val={:x}", regs[insn.rs1], regs[insn.rs2])?;
            }
            writeln!(w)
        };
        write(w).map_err(|e| SimError::io(path.as_path(), e))
    }

    /// Appends an exception line.
    pub fn exception(&mut self, clock: u64, mode: PrivilegeMode, exception: &SimException) -> SimResult<()> {
        let Some((path, w)) = self.out.as_mut() else {
            return Ok(());
        };
        writeln!(
            w,
            "cycle={} pc={:x} insn={:x} {} mode={}",
            clock, exception.pc, exception.insn, exception.insn_str, mode
        )
        .map_err(|e| SimError::io(path.as_path(), e))
    }
}
