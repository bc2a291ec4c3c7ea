//! Reference memory hierarchy.
//!
//! [`CacheHierarchy`] composes split L1 caches, an optional unified L2, and the
//! memory controller into a [`MemoryHierarchy`]. Latency of an access is the hit
//! latency of the first level that holds the line, plus the latency of every
//! level below it on a miss, plus write-back penalties of dirty victims.
//!
//! When L1 caches are not modelled every access goes straight to DRAM.

use crate::config::{CacheHierarchyConfig, Config, DramModel};
use crate::core::arch::PrivilegeMode;
use crate::core::cpu::StageId;
use crate::core::units::cache::{CacheSim, CacheStats};
use crate::soc::memory::controller::{AccessKind, DramSession, MemController};
use crate::soc::traits::MemoryHierarchy;

/// L1-I / L1-D / L2 caches in front of a memory controller.
#[derive(Debug)]
pub struct CacheHierarchy {
    l1_i: CacheSim,
    l1_d: CacheSim,
    l2: CacheSim,
    l1_enabled: bool,
    l2_enabled: bool,
    controller: MemController,
}

/// Which L1 an access starts at.
#[derive(Clone, Copy)]
enum Port {
    Instruction,
    Data,
}

impl CacheHierarchy {
    /// Builds the hierarchy described by `config`.
    pub fn new(config: &Config) -> Self {
        let CacheHierarchyConfig {
            enable_l1_caches,
            enable_l2_cache,
            l1_i,
            l1_d,
            l2,
            ..
        } = &config.cache;
        Self {
            l1_i: CacheSim::new(l1_i),
            l1_d: CacheSim::new(l1_d),
            l2: CacheSim::new(l2),
            l1_enabled: *enable_l1_caches,
            l2_enabled: *enable_l1_caches && *enable_l2_cache,
            controller: MemController::new(&config.memory),
        }
    }

    /// The memory controller.
    pub fn controller(&self) -> &MemController {
        &self.controller
    }

    /// Latency of writing a dirty line back to DRAM.
    fn write_back(&mut self, line_addr: u64, stage: StageId) -> u64 {
        self.controller.access(line_addr, AccessKind::Write, stage)
    }

    /// Latency of writing a dirty L1 victim to the next level.
    ///
    /// With L2 the victim is written into L2, which may in turn evict a dirty
    /// L2 line to DRAM.
    fn write_back_from_l1(&mut self, line_addr: u64, stage: StageId, priv_level: PrivilegeMode) -> u64 {
        if !self.l2_enabled {
            return self.write_back(line_addr, stage);
        }
        let outcome = self.l2.access(line_addr, true, priv_level);
        let l2_victim = outcome.dirty_victim.map_or(0, |v| self.write_back(v, stage));
        self.l2.write_latency + l2_victim
    }

    /// Latency of filling the L1 line at `addr` from the levels below.
    fn fill_from_below(&mut self, addr: u64, stage: StageId, priv_level: PrivilegeMode) -> u64 {
        if !self.l2_enabled {
            return self.controller.access(addr, AccessKind::Read, stage);
        }
        let outcome = self.l2.access(addr, false, priv_level);
        let writeback = outcome.dirty_victim.map_or(0, |v| self.write_back(v, stage));
        if outcome.hit {
            self.l2.read_latency + writeback
        } else {
            self.l2.read_latency + writeback + self.controller.access(addr, AccessKind::Read, stage)
        }
    }

    /// Latency of one line-sized access through `port`.
    fn line_access(
        &mut self,
        port: Port,
        addr: u64,
        is_write: bool,
        stage: StageId,
        priv_level: PrivilegeMode,
    ) -> u64 {
        let cache = match port {
            Port::Instruction => &mut self.l1_i,
            Port::Data => &mut self.l1_d,
        };
        let hit_latency = if is_write {
            cache.write_latency
        } else {
            cache.read_latency
        };
        let outcome = cache.access(addr, is_write, priv_level);
        if outcome.hit {
            return hit_latency;
        }
        let writeback = outcome
            .dirty_victim
            .map_or(0, |v| self.write_back_from_l1(v, stage, priv_level));
        hit_latency + writeback + self.fill_from_below(addr, stage, priv_level)
    }

    /// Latency of a `width`-byte access, splitting at a line boundary.
    fn access(
        &mut self,
        port: Port,
        addr: u64,
        width: u64,
        is_write: bool,
        stage: StageId,
        priv_level: PrivilegeMode,
    ) -> u64 {
        if !self.l1_enabled {
            let kind = if is_write {
                AccessKind::Write
            } else {
                AccessKind::Read
            };
            return self.controller.access(addr, kind, stage);
        }
        let line = match port {
            Port::Instruction => self.l1_i.line_bytes(),
            Port::Data => self.l1_d.line_bytes(),
        } as u64;
        let first = self.line_access(port, addr, is_write, stage, priv_level);
        let last_byte = addr.wrapping_add(width.max(1) - 1);
        if last_byte / line != addr / line {
            first.max(self.line_access(port, last_byte, is_write, stage, priv_level))
        } else {
            first
        }
    }
}

impl MemoryHierarchy for CacheHierarchy {
    fn fetch_latency(&mut self, addr: u64, width: u64, stage: StageId, priv_level: PrivilegeMode) -> u64 {
        self.access(Port::Instruction, addr, width, false, stage, priv_level)
    }

    fn data_read_latency(&mut self, addr: u64, width: u64, stage: StageId, priv_level: PrivilegeMode) -> u64 {
        self.access(Port::Data, addr, width, false, stage, priv_level)
    }

    fn data_write_latency(&mut self, addr: u64, width: u64, stage: StageId, priv_level: PrivilegeMode) -> u64 {
        self.access(Port::Data, addr, width, true, stage, priv_level)
    }

    fn icache_read_latency(&self) -> u64 {
        self.l1_i.read_latency
    }

    fn dcache_read_latency(&self) -> u64 {
        self.l1_d.read_latency
    }

    fn dcache_write_latency(&self) -> u64 {
        self.l1_d.write_latency
    }

    fn icache_stats(&self, priv_level: PrivilegeMode) -> CacheStats {
        self.l1_i.stats(priv_level)
    }

    fn dcache_stats(&self, priv_level: PrivilegeMode) -> CacheStats {
        self.l1_d.stats(priv_level)
    }

    fn l2_stats(&self, priv_level: PrivilegeMode) -> CacheStats {
        self.l2.stats(priv_level)
    }

    fn reset_l1_stats(&mut self) {
        self.l1_i.reset_stats();
        self.l1_d.reset_stats();
    }

    fn reset_l2_stats(&mut self) {
        self.l2.reset_stats();
    }

    fn flush_l1(&mut self) {
        self.l1_i.flush();
        self.l1_d.flush();
    }

    fn flush_l2(&mut self) {
        self.l2.flush();
    }

    fn tick(&mut self) {
        self.controller.tick();
    }

    fn reset_frontend_queue(&mut self) {
        self.controller.reset_frontend_queue();
    }

    fn reset_controller(&mut self) {
        self.controller.reset();
    }

    fn dram_model(&self) -> DramModel {
        self.controller.dram_model()
    }

    fn reinit_dram(&mut self, session: &DramSession) {
        self.controller.reinit_dram(session);
    }

    fn print_dram_stats(&self) {
        self.controller.print_dram_stats();
    }
}
