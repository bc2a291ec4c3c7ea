//! RISC-V architecture-specific components.
//!
//! The timing core only needs the privilege level to partition its counters;
//! register files and CSRs live in the functional model.

/// Privilege mode definitions.
pub mod mode;

pub use mode::PrivilegeMode;
