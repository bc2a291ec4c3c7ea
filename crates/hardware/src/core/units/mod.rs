//! Timing units of the core.
//!
//! This module contains the branch prediction unit and the cache timing model
//! shared by the reference memory hierarchy.

/// Branch prediction unit: BTB, RAS, and the probe/add/update facade.
pub mod bru;

/// Set-associative cache timing model with replacement policies.
pub mod cache;
