//! Memory-side collaborators of the timing core.
//!
//! This module defines the contracts the stage executors consult
//! ([`MemoryMap`], [`MemoryHierarchy`]) and a reference timing hierarchy built
//! from the cache model and a DRAM memory controller.

/// Memory controller, DRAM models, and the reference cache hierarchy.
pub mod memory;

/// Collaborator traits consumed by the stage executors.
pub mod traits;

pub use self::memory::CacheHierarchy;
pub use self::traits::{MemoryHierarchy, MemoryMap};
