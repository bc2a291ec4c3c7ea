//! Error and fault definitions.
//!
//! This module separates the two kinds of failure the timing core deals with:
//! 1. **Architectural Faults:** Recorded on the instruction latch as an
//!    [`ExceptionCause`] and carried through the pipeline as ordinary state.
//! 2. **Host Errors:** [`SimError`] values for configuration, file, shared-memory,
//!    and predictor-consistency failures.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Cause recorded on an instruction latch when an architectural fault occurs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExceptionCause {
    /// The page-table walker raised a fault while fetching the instruction.
    MmuFetch,
    /// The page-table walker raised a fault during a load, store, or atomic access.
    MmuMemory,
}

impl ExceptionCause {
    /// Returns a human-readable description of the fault.
    pub fn description(self) -> &'static str {
        match self {
            Self::MmuFetch => "MMU exception during fetch",
            Self::MmuMemory => "MMU exception during memory access",
        }
    }
}

impl fmt::Display for ExceptionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Fault reported by the memory-map collaborator for a fetch or data access.
///
/// The walker has already charged its latency to the page-walk state by the time
/// this is returned; the value only signals that the access did not complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MmuFault;

/// Host-level errors raised by the timing core.
#[derive(Debug, Error)]
pub enum SimError {
    /// A taken conditional branch hit in the predictor but the committed
    /// prediction disagrees with the architecturally resolved target.
    #[error(
        "predictor inconsistency at pc {pc:#x}: predicted {predicted:#x}, resolved {actual:#x}"
    )]
    PredictorInconsistency {
        /// Program counter of the branch.
        pc: u64,
        /// Target committed at fetch time.
        predicted: u64,
        /// Target resolved at execute time.
        actual: u64,
    },

    /// The stats-display shared-memory region could not be established.
    #[error("cannot {op} stats shared memory {name}")]
    StatsRegion {
        /// The failing step (`create`, `resize`, or `map`).
        op: &'static str,
        /// Name of the shared-memory object.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A trace or statistics file could not be written.
    #[error("i/o error on {path}")]
    Io {
        /// Path of the file being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration document is malformed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration file {path}")]
    ConfigFile {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl SimError {
    /// Wraps an I/O error with the path of the file involved.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result alias for fallible timing-core operations.
pub type SimResult<T> = Result<T, SimError>;
