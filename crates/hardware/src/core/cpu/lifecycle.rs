//! Simulation lifecycle.
//!
//! A session alternates between functional emulation (idle) and timing
//! simulation (running):
//!
//! ```text
//! idle --start(pc)--> running --stop(pc)--> idle
//! ```
//!
//! `start` while running and `stop` while idle are no-ops.

use std::time::Instant;

use crate::common::error::SimResult;
use crate::config::DramModel;
use crate::core::arch::PrivilegeMode;
use crate::core::cpu::SimCpu;
use crate::soc::memory::DramSession;

impl SimCpu {
    /// Enters timing simulation, resuming at `pc`.
    ///
    /// Resets the clock and statistics, flushes the predictor and caches as
    /// configured, rebuilds the external DRAM model, and opens the trace.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the trace file cannot be created; the run is
    /// started regardless.
    pub fn start(&mut self, pc: u64) -> SimResult<()> {
        if self.simulation {
            return Ok(());
        }
        self.simulation = true;
        self.clock = 0;
        self.stats.reset();
        self.sim_start = Some(Instant::now());

        if self.config.bpu.flush_on_sim_start {
            if let Some(bpu) = self.handlers.bpu_mut() {
                bpu.flush();
            }
        }

        let cache = &self.config.cache;
        if cache.enable_l1_caches {
            self.mem.reset_l1_stats();
            if cache.flush_on_sim_start {
                self.mem.flush_l1();
            }
            if cache.enable_l2_cache {
                self.mem.reset_l2_stats();
                if cache.flush_on_sim_start {
                    self.mem.flush_l2();
                }
            }
        }

        if self.mem.dram_model() == DramModel::External {
            self.mem.reinit_dram(&DramSession::from_config(&self.config));
        }

        let mut result = Ok(());
        if self.config.general.do_sim_trace {
            self.config.general.create_ins_str = true;
            result = self.trace.start(&self.config.general.sim_trace_file);
        }

        tracing::info!(pc = format_args!("{pc:#x}"), "switching to full-system simulation mode");
        result
    }

    /// Leaves timing simulation, resuming emulation at `pc`.
    ///
    /// Closes the trace, folds cache counters into the statistics, and writes
    /// the final report to `general.sim_stats_path` and the terminal.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error from closing the trace or writing the
    /// report; the run is stopped regardless.
    pub fn stop(&mut self, pc: u64) -> SimResult<()> {
        if !self.simulation {
            return Ok(());
        }
        self.simulation = false;
        let elapsed_ms = self
            .sim_start
            .take()
            .map_or(0, |t| t.elapsed().as_millis() as u64);
        self.last_elapsed_ms = Some(elapsed_ms);

        if self.mem.dram_model() == DramModel::External {
            self.mem.print_dram_stats();
        }

        let trace_result = if self.config.general.do_sim_trace {
            let r = self.trace.stop();
            if r.is_ok() {
                tracing::info!(path = %self.config.general.sim_trace_file.display(), "saved simulation trace");
            }
            r
        } else {
            Ok(())
        };

        self.copy_cache_stats_to_global_stats();
        let stats_result = self.stats.write_to_file(&self.config.general.sim_stats_path);
        self.stats.print_to_terminal();

        tracing::info!(pc = format_args!("{pc:#x}"), "switching to emulation mode");
        tracing::info!(elapsed_ms, "time elapsed on host machine");
        trace_result.and(stats_result)
    }

    /// Clears the pending exception, empties the latch arena, and drops every
    /// request queued in the memory controller.
    ///
    /// The core scheduler's own reset is driven by
    /// [`crate::sim::Simulator::reset`].
    pub fn reset(&mut self) {
        self.exception.clear();
        self.latch_pool.reset();
        self.mem.reset_controller();
    }

    /// Copies the memory hierarchy's cache counters into the statistics.
    ///
    /// L1 counters are copied only when L1 caches are modelled, L2 counters
    /// only when L2 is enabled as well.
    pub fn copy_cache_stats_to_global_stats(&mut self) {
        let cache = &self.config.cache;
        if !cache.enable_l1_caches {
            return;
        }
        for mode in PrivilegeMode::ALL {
            let s = &mut self.stats[mode];
            let i = self.mem.icache_stats(mode);
            s.icache_read = i.read;
            s.icache_read_miss = i.read_miss;

            let d = self.mem.dcache_stats(mode);
            s.dcache_read = d.read;
            s.dcache_read_miss = d.read_miss;
            s.dcache_write = d.write;
            s.dcache_write_miss = d.write_miss;

            if cache.enable_l2_cache {
                let l2 = self.mem.l2_stats(mode);
                s.l2_cache_read = l2.read;
                s.l2_cache_read_miss = l2.read_miss;
                s.l2_cache_write = l2.write;
                s.l2_cache_write_miss = l2.write_miss;
            }
        }
    }
}
