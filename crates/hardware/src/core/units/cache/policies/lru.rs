//! Least Recently Used (LRU) Replacement Policy.
//!
//! Every way carries the stamp of its last access, taken from a monotonically
//! increasing counter. The victim is the way with the oldest stamp.

use super::ReplacementPolicy;

/// Per-way last-use stamps for a `sets` x `ways` structure.
#[derive(Debug)]
pub struct LruPolicy {
    ways: usize,
    /// Flattened `[set][way]` stamp table.
    stamps: Vec<u64>,
    /// Stamp handed to the next access.
    now: u64,
}

impl LruPolicy {
    /// Creates a policy whose initial order prefers the highest way as victim.
    pub fn new(sets: usize, ways: usize) -> Self {
        let ways = ways.max(1);
        let stamps = (0..sets)
            .flat_map(|_| (0..ways).rev().map(|w| w as u64))
            .collect();
        Self {
            ways,
            stamps,
            now: ways as u64,
        }
    }

    fn set_stamps(&self, set: usize) -> &[u64] {
        let base = set * self.ways;
        self.stamps.get(base..base + self.ways).unwrap_or(&[])
    }
}

impl ReplacementPolicy for LruPolicy {
    fn update(&mut self, set: usize, way: usize) {
        if let Some(stamp) = self.stamps.get_mut(set * self.ways + way) {
            *stamp = self.now;
            self.now += 1;
        }
    }

    fn get_victim(&mut self, set: usize) -> usize {
        self.set_stamps(set)
            .iter()
            .enumerate()
            .min_by_key(|&(_, stamp)| *stamp)
            .map_or(0, |(way, _)| way)
    }
}
