//! Random Replacement Policy.
//!
//! Victims come from a fixed-seed xorshift64 stream, so two runs over the
//! same trace evict the same ways.

use super::ReplacementPolicy;

const SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Pseudo-random victim selection. Access history is ignored.
#[derive(Debug)]
pub struct RandomPolicy {
    ways: u64,
    state: u64,
}

impl RandomPolicy {
    /// Creates a policy for structures with `ways` ways per set.
    pub fn new(_sets: usize, ways: usize) -> Self {
        Self {
            ways: ways.max(1) as u64,
            state: SEED,
        }
    }

    fn next(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn update(&mut self, _set: usize, _way: usize) {}

    fn get_victim(&mut self, _set: usize) -> usize {
        // High bits of xorshift are better mixed than the low ones.
        ((self.next() >> 32) % self.ways) as usize
    }
}
