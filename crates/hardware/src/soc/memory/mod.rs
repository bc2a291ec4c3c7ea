//! Memory timing: the memory controller, DRAM models, and the reference
//! cache hierarchy.

/// Memory controller, request queues, and DRAM timing models.
pub mod controller;

/// Reference L1/L2 cache hierarchy implementing `MemoryHierarchy`.
pub mod hierarchy;

pub use self::controller::{DramSession, MemAccessQueue, MemController};
pub use self::hierarchy::CacheHierarchy;
