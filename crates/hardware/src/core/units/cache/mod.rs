//! Set-Associative Cache Timing Model.
//!
//! This module implements a configurable set-associative cache used only for
//! timing: it tracks tags, validity, and dirtiness, never data. Each access is
//! attributed to the privilege level that issued it so the per-level hit and
//! miss counters can be folded into the session statistics.

/// Replacement policy implementations (LRU, Random).
pub mod policies;

use self::policies::ReplacementPolicy;
use crate::common::constants::NUM_PRIV_LEVELS;
use crate::config::CacheConfig;
use crate::core::arch::PrivilegeMode;

/// Per-privilege access counters of one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Read accesses.
    pub read: u64,
    /// Read accesses that missed.
    pub read_miss: u64,
    /// Write accesses.
    pub write: u64,
    /// Write accesses that missed.
    pub write_miss: u64,
}

/// Result of one cache access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineAccess {
    /// The line was present.
    pub hit: bool,
    /// Line address of the dirty line evicted by the fill, to be written back.
    pub dirty_victim: Option<u64>,
}

/// Cache line entry containing tag, validity, and dirty bits.
#[derive(Clone, Copy, Default)]
struct CacheLine {
    tag: u64,
    valid: bool,
    dirty: bool,
}

/// Cache timing model implementing a set-associative cache.
pub struct CacheSim {
    /// Read hit latency in cycles.
    pub read_latency: u64,
    /// Write hit latency in cycles.
    pub write_latency: u64,
    lines: Vec<CacheLine>,
    num_sets: usize,
    ways: usize,
    line_bytes: usize,
    config: CacheConfig,
    policy: Box<dyn ReplacementPolicy + Send + Sync>,
    stats: [CacheStats; NUM_PRIV_LEVELS],
}

impl std::fmt::Debug for CacheSim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSim")
            .field("num_sets", &self.num_sets)
            .field("ways", &self.ways)
            .field("line_bytes", &self.line_bytes)
            .field("read_latency", &self.read_latency)
            .field("write_latency", &self.write_latency)
            .finish_non_exhaustive()
    }
}

impl CacheSim {
    /// Creates a new cache with the specified configuration.
    ///
    /// Zero sizes are replaced with safe minimums (one way, 64-byte lines,
    /// 4 KiB capacity).
    pub fn new(config: &CacheConfig) -> Self {
        let ways = config.ways.max(1);
        let line_bytes = if config.line_bytes == 0 { 64 } else { config.line_bytes };
        let size = if config.size_bytes == 0 { 4096 } else { config.size_bytes };
        let num_sets = (size / line_bytes / ways).max(1);

        Self {
            read_latency: config.read_latency,
            write_latency: config.write_latency,
            lines: vec![CacheLine::default(); num_sets * ways],
            num_sets,
            ways,
            line_bytes,
            config: config.clone(),
            policy: policies::build(config.eviction, num_sets, ways),
            stats: [CacheStats::default(); NUM_PRIV_LEVELS],
        }
    }

    fn locate(&self, addr: u64) -> (usize, u64) {
        let set_index = ((addr as usize) / self.line_bytes) % self.num_sets;
        let tag = addr / (self.line_bytes * self.num_sets) as u64;
        (set_index, tag)
    }

    /// Line size in bytes.
    pub fn line_bytes(&self) -> usize {
        self.line_bytes
    }

    /// Checks if the cache holds the line containing `addr`.
    pub fn contains(&self, addr: u64) -> bool {
        let (set_index, tag) = self.locate(addr);
        let base = set_index * self.ways;
        self.lines[base..base + self.ways]
            .iter()
            .any(|l| l.valid && l.tag == tag)
    }

    /// Installs the line for `addr`, returning the line address of a dirty
    /// victim.
    fn install_line(&mut self, set_index: usize, tag: u64, is_write: bool) -> Option<u64> {
        let base = set_index * self.ways;
        let victim_way = (0..self.ways)
            .find(|&w| !self.lines[base + w].valid)
            .unwrap_or_else(|| self.policy.get_victim(set_index));
        let line_bytes = self.line_bytes as u64;
        let num_sets = self.num_sets as u64;
        let victim = &mut self.lines[base + victim_way];
        let written_back = (victim.valid && victim.dirty)
            .then(|| (victim.tag * num_sets + set_index as u64) * line_bytes);
        *victim = CacheLine {
            tag,
            valid: true,
            dirty: is_write,
        };
        self.policy.update(set_index, victim_way);
        written_back
    }

    /// Accesses the cache on behalf of `priv_level`, allocating on a miss.
    pub fn access(&mut self, addr: u64, is_write: bool, priv_level: PrivilegeMode) -> LineAccess {
        let (set_index, tag) = self.locate(addr);
        let base = set_index * self.ways;

        let hit_way = (0..self.ways).find(|&w| {
            let l = &self.lines[base + w];
            l.valid && l.tag == tag
        });

        let stats = &mut self.stats[priv_level.index()];
        if is_write {
            stats.write += 1;
        } else {
            stats.read += 1;
        }

        match hit_way {
            Some(way) => {
                self.policy.update(set_index, way);
                if is_write {
                    self.lines[base + way].dirty = true;
                }
                LineAccess {
                    hit: true,
                    dirty_victim: None,
                }
            }
            None => {
                if is_write {
                    stats.write_miss += 1;
                } else {
                    stats.read_miss += 1;
                }
                LineAccess {
                    hit: false,
                    dirty_victim: self.install_line(set_index, tag, is_write),
                }
            }
        }
    }

    /// Counters attributed to `priv_level`.
    pub fn stats(&self, priv_level: PrivilegeMode) -> CacheStats {
        self.stats[priv_level.index()]
    }

    /// Zeroes all access counters.
    pub fn reset_stats(&mut self) {
        self.stats = [CacheStats::default(); NUM_PRIV_LEVELS];
    }

    /// Invalidates every line and restarts replacement state.
    pub fn flush(&mut self) {
        self.lines.fill(CacheLine::default());
        self.policy = policies::build(self.config.eviction, self.num_sets, self.ways);
    }
}
