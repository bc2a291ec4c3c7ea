//! Simulation statistics collection and reporting.
//!
//! This module tracks the counters of a simulation run, one record per privilege
//! level. It provides:
//! 1. **Instruction flow:** Fetched and committed instructions, per-type mix.
//! 2. **Register files:** Integer and floating-point writeback counts.
//! 3. **Branch prediction:** BTB probes/hits and per-kind prediction outcomes.
//! 4. **Cache hierarchy:** L1-I, L1-D, and L2 read/write counters copied in from
//!    the memory hierarchy.
//!
//! The per-level record is `#[repr(C)]` so a [`StatsTable`] can be copied
//! byte-for-byte into the stats-display region.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::{Index, IndexMut};
use std::path::Path;

use serde::Serialize;

use crate::common::constants::NUM_PRIV_LEVELS;
use crate::common::error::{SimError, SimResult};
use crate::core::arch::PrivilegeMode;
use crate::isa::InsnType;

/// Counters of one privilege level.
///
/// Every field only increases during a run; [`StatsTable::reset`] zeroes them at
/// simulation start.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Instructions fetched.
    pub ins_fetch: u64,
    /// Instructions committed.
    pub ins_simulated: u64,
    /// Committed instructions by [`InsnType`].
    pub ins_type: [u64; InsnType::COUNT],
    /// Committed conditional branches that were taken.
    pub ins_cond_branch_taken: u64,

    /// Integer register file writes.
    pub int_regfile_writes: u64,
    /// Floating-point register file writes.
    pub fp_regfile_writes: u64,

    /// Fetch-time BTB probes.
    pub btb_probes: u64,
    /// Fetch-time BTB hits.
    pub btb_hits: u64,
    /// Correctly predicted conditional branches.
    pub bpu_cond_correct: u64,
    /// Mispredicted conditional branches.
    pub bpu_cond_incorrect: u64,
    /// Correctly predicted unconditional branches.
    pub bpu_uncond_correct: u64,
    /// Mispredicted unconditional branches.
    pub bpu_uncond_incorrect: u64,
    /// Return addresses pushed on calls.
    pub ras_push: u64,
    /// Return addresses popped on returns.
    pub ras_pop: u64,

    /// L1 instruction cache reads.
    pub icache_read: u64,
    /// L1 instruction cache read misses.
    pub icache_read_miss: u64,
    /// L1 data cache reads.
    pub dcache_read: u64,
    /// L1 data cache read misses.
    pub dcache_read_miss: u64,
    /// L1 data cache writes.
    pub dcache_write: u64,
    /// L1 data cache write misses.
    pub dcache_write_miss: u64,
    /// L2 cache reads.
    pub l2_cache_read: u64,
    /// L2 cache read misses.
    pub l2_cache_read_miss: u64,
    /// L2 cache writes.
    pub l2_cache_write: u64,
    /// L2 cache write misses.
    pub l2_cache_write_miss: u64,
}

impl SimStats {
    /// Sums `other` into `self`, field by field.
    fn accumulate(&mut self, other: &Self) {
        self.ins_fetch += other.ins_fetch;
        self.ins_simulated += other.ins_simulated;
        for (a, b) in self.ins_type.iter_mut().zip(other.ins_type.iter()) {
            *a += b;
        }
        self.ins_cond_branch_taken += other.ins_cond_branch_taken;
        self.int_regfile_writes += other.int_regfile_writes;
        self.fp_regfile_writes += other.fp_regfile_writes;
        self.btb_probes += other.btb_probes;
        self.btb_hits += other.btb_hits;
        self.bpu_cond_correct += other.bpu_cond_correct;
        self.bpu_cond_incorrect += other.bpu_cond_incorrect;
        self.bpu_uncond_correct += other.bpu_uncond_correct;
        self.bpu_uncond_incorrect += other.bpu_uncond_incorrect;
        self.ras_push += other.ras_push;
        self.ras_pop += other.ras_pop;
        self.icache_read += other.icache_read;
        self.icache_read_miss += other.icache_read_miss;
        self.dcache_read += other.dcache_read;
        self.dcache_read_miss += other.dcache_read_miss;
        self.dcache_write += other.dcache_write;
        self.dcache_write_miss += other.dcache_write_miss;
        self.l2_cache_read += other.l2_cache_read;
        self.l2_cache_read_miss += other.l2_cache_read_miss;
        self.l2_cache_write += other.l2_cache_write;
        self.l2_cache_write_miss += other.l2_cache_write_miss;
    }
}

/// Per-privilege-level statistics of a simulation run.
#[repr(transparent)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsTable {
    levels: [SimStats; NUM_PRIV_LEVELS],
}

/// One entry of the JSON statistics report.
#[derive(Serialize)]
struct LevelReport<'a> {
    mode: &'static str,
    #[serde(flatten)]
    stats: &'a SimStats,
}

impl Index<PrivilegeMode> for StatsTable {
    type Output = SimStats;

    fn index(&self, mode: PrivilegeMode) -> &SimStats {
        &self.levels[mode.index()]
    }
}

impl IndexMut<PrivilegeMode> for StatsTable {
    fn index_mut(&mut self, mode: PrivilegeMode) -> &mut SimStats {
        &mut self.levels[mode.index()]
    }
}

impl StatsTable {
    /// Zeroes every counter of every level.
    pub fn reset(&mut self) {
        self.levels = [SimStats::default(); NUM_PRIV_LEVELS];
    }

    /// The per-level records in privilege order (U, S, H, M).
    pub fn levels(&self) -> &[SimStats; NUM_PRIV_LEVELS] {
        &self.levels
    }

    /// Sum of all levels.
    pub fn total(&self) -> SimStats {
        let mut total = SimStats::default();
        for level in &self.levels {
            total.accumulate(level);
        }
        total
    }

    /// Writes the table as a JSON array, one object per privilege level.
    pub fn write_to_file(&self, path: &Path) -> SimResult<()> {
        let report: Vec<LevelReport<'_>> = PrivilegeMode::ALL
            .iter()
            .map(|&mode| LevelReport {
                mode: mode.name(),
                stats: &self[mode],
            })
            .collect();

        let file = File::create(path).map_err(|e| SimError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.flush().map_err(|e| SimError::io(path, e))?;
        Ok(())
    }

    /// Prints the summed counters to stdout.
    pub fn print_to_terminal(&self) {
        let t = self.total();
        let pct = |num: u64, den: u64| {
            if den > 0 {
                100.0 * num as f64 / den as f64
            } else {
                0.0
            }
        };

        println!("\n==========================================================");
        println!("RISC-V TIMING SIMULATION STATISTICS");
        println!("==========================================================");
        println!("sim_insts_fetched        {}", t.ins_fetch);
        println!("sim_insts_committed      {}", t.ins_simulated);
        println!("regfile.int_writes       {}", t.int_regfile_writes);
        println!("regfile.fp_writes        {}", t.fp_regfile_writes);
        println!("----------------------------------------------------------");
        println!("INSTRUCTION MIX");
        let committed = t.ins_simulated.max(1);
        for ty in InsnType::ALL {
            let n = t.ins_type[ty.index()];
            println!(
                "  op.{:<20} {} ({:.2}%)",
                ty.name(),
                n,
                pct(n, committed)
            );
        }
        println!("  cond_branch.taken       {}", t.ins_cond_branch_taken);
        println!("----------------------------------------------------------");
        println!("BRANCH PREDICTION");
        println!(
            "  btb.probes             {} | hits: {} ({:.2}%)",
            t.btb_probes,
            t.btb_hits,
            pct(t.btb_hits, t.btb_probes)
        );
        let cond = t.bpu_cond_correct + t.bpu_cond_incorrect;
        println!(
            "  bp.cond                {} | correct: {} ({:.2}%)",
            cond,
            t.bpu_cond_correct,
            pct(t.bpu_cond_correct, cond)
        );
        let uncond = t.bpu_uncond_correct + t.bpu_uncond_incorrect;
        println!(
            "  bp.uncond              {} | correct: {} ({:.2}%)",
            uncond,
            t.bpu_uncond_correct,
            pct(t.bpu_uncond_correct, uncond)
        );
        println!("  ras.push               {}", t.ras_push);
        println!("  ras.pop                {}", t.ras_pop);
        println!("----------------------------------------------------------");
        println!("MEMORY HIERARCHY");
        let print_cache = |name: &str, accesses: u64, misses: u64| {
            println!(
                "  {:<10} accesses: {:<10} | misses: {:<10} | miss_rate: {:.2}%",
                name,
                accesses,
                misses,
                pct(misses, accesses)
            );
        };
        print_cache("L1-I.rd", t.icache_read, t.icache_read_miss);
        print_cache("L1-D.rd", t.dcache_read, t.dcache_read_miss);
        print_cache("L1-D.wr", t.dcache_write, t.dcache_write_miss);
        print_cache("L2.rd", t.l2_cache_read, t.l2_cache_read_miss);
        print_cache("L2.wr", t.l2_cache_write, t.l2_cache_write_miss);
        println!("==========================================================");
    }
}
