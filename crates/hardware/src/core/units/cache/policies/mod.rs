//! Replacement Policies.
//!
//! Victim-selection algorithms shared by the set-associative timing structures
//! (caches and the branch target buffer).
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used.
//! - `Random`: Random selection.

/// Least Recently Used replacement policy.
pub mod lru;

/// Random replacement policy.
pub mod random;

pub use lru::LruPolicy;
pub use random::RandomPolicy;

use crate::config::EvictionPolicy;

/// Trait for replacement policies.
///
/// Defines the interface for updating usage state and selecting victim ways.
pub trait ReplacementPolicy: Send + Sync {
    /// Updates the policy state when a way is accessed.
    ///
    /// # Arguments
    ///
    /// * `set` - The set index.
    /// * `way` - The way index within the set that was accessed.
    fn update(&mut self, set: usize, way: usize);

    /// Selects a victim way to evict from a specific set.
    ///
    /// # Arguments
    ///
    /// * `set` - The set index.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn get_victim(&mut self, set: usize) -> usize;
}

/// Builds the policy selected by `kind` for a `sets` x `ways` structure.
pub fn build(kind: EvictionPolicy, sets: usize, ways: usize) -> Box<dyn ReplacementPolicy + Send + Sync> {
    match kind {
        EvictionPolicy::Lru => Box::new(LruPolicy::new(sets, ways)),
        EvictionPolicy::Random => Box::new(RandomPolicy::new(sets, ways)),
    }
}
