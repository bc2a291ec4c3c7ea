//! Global Timing-Core Constants.
//!
//! This module defines constants shared across the timing core. It includes:
//! 1. **Instruction Constants:** Encoding-length detection and instruction sizes.
//! 2. **Pool Constants:** Capacity of the in-flight instruction latch arena.
//! 3. **Publication Constants:** Interval for the stats-display snapshot.

/// Size of a compressed (16-bit) RISC-V instruction in bytes.
pub const INSTRUCTION_SIZE_16: u64 = 2;

/// Size of a standard (32-bit) RISC-V instruction in bytes.
pub const INSTRUCTION_SIZE_32: u64 = 4;

/// Bit mask selecting the encoding-length field of an instruction.
pub const COMPRESSED_INSTRUCTION_MASK: u32 = 0x3;

/// Value of the encoding-length field for a standard 32-bit instruction.
///
/// Any other value in the low two bits denotes a compressed instruction.
pub const STANDARD_INSTRUCTION_VALUE: u32 = 0x3;

/// Number of privilege-level slots carried by every statistics table (U, S, H, M).
pub const NUM_PRIV_LEVELS: usize = 4;

/// Number of entries in the instruction latch pool.
pub const INSN_LATCH_POOL_SIZE: usize = 128;

/// Simulated clock cycles between two stats-display snapshots.
pub const STATS_PUBLISH_INTERVAL: u64 = 500_000;

/// Default name of the POSIX shared-memory object read by the stats viewer.
pub const STATS_SHM_NAME: &str = "/rvcycle-stats-shm";

/// Access permissions for the stats-display shared-memory object.
pub const STATS_SHM_PERMS: u32 = 0o666;

/// Static rounding-mode field value meaning "use the dynamic `frm` CSR".
pub const RM_DYNAMIC: u8 = 0b111;

/// Upper 32 bits set when NaN-boxing a single-precision result.
pub const F32_HIGH: u64 = 0xFFFF_FFFF_0000_0000;

/// NaN-boxing mask for a double-precision result (no upper bits to set).
pub const F64_HIGH: u64 = 0;

/// Returns `true` when `binary` is a standard 32-bit encoding (low two bits `0b11`).
#[inline(always)]
pub const fn is_standard_encoding(binary: u32) -> bool {
    (binary & COMPRESSED_INSTRUCTION_MASK) == STANDARD_INSTRUCTION_VALUE
}

/// Returns the byte length of the instruction whose raw encoding is `binary`.
#[inline(always)]
pub const fn instruction_size(binary: u32) -> u64 {
    if is_standard_encoding(binary) {
        INSTRUCTION_SIZE_32
    } else {
        INSTRUCTION_SIZE_16
    }
}
