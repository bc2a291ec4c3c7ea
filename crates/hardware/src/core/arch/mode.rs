//! RISC-V Privilege Modes.
//!
//! This module defines the privilege levels used to partition simulation counters.
//! It implements the following:
//! 1. **Mode Classification:** User (U), Supervisor (S), Hypervisor (H), and Machine (M).
//! 2. **Indexing:** Stable slot indices into per-privilege statistics tables.
//! 3. **Observability:** Human-readable naming for trace output and reports.

use crate::common::constants::NUM_PRIV_LEVELS;

/// RISC-V privilege mode levels.
///
/// The discriminant is the architectural encoding and doubles as the slot index
/// in every per-privilege counter table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrivilegeMode {
    /// User mode (U-mode).
    User = 0,

    /// Supervisor mode (S-mode).
    Supervisor = 1,

    /// Hypervisor mode (reserved encoding, kept for counter layout).
    Hypervisor = 2,

    /// Machine mode (M-mode).
    #[default]
    Machine = 3,
}

impl PrivilegeMode {
    /// All privilege levels in counter-slot order.
    pub const ALL: [Self; NUM_PRIV_LEVELS] = [
        Self::User,
        Self::Supervisor,
        Self::Hypervisor,
        Self::Machine,
    ];

    /// Converts a `u8` value to a privilege mode.
    ///
    /// Only the low two bits are significant.
    pub fn from_u8(val: u8) -> Self {
        match val & 0b11 {
            0 => Self::User,
            1 => Self::Supervisor,
            2 => Self::Hypervisor,
            _ => Self::Machine,
        }
    }

    /// Returns the counter slot for this privilege level.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the human-readable name of the privilege mode.
    pub fn name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Supervisor => "supervisor",
            Self::Hypervisor => "hypervisor",
            Self::Machine => "machine",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
