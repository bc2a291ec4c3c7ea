//! Memory controller and DRAM timing models.
//!
//! This module provides:
//! 1. **FixedLatencyDram:** Fixed latency per access (the `Base` model).
//! 2. **RowBufferDram:** Row-buffer-aware latency (CAS, RAS, precharge), rebuilt at
//!    every simulation start (the `External` model).
//! 3. **MemController:** Owns the frontend (CPU-issued) and backend (DRAM-issued)
//!    request queues and routes accesses to the active model.
//!
//! A request occupies its queue from issue until the controller's cycle count
//! reaches its completion cycle. A request arriving at a full queue waits for
//! the oldest entry to complete, and that wait is added to its latency.

use std::path::PathBuf;

use crate::config::{Config, DramModel, MemoryConfig};
use crate::core::cpu::StageId;

/// Default depth of each request queue.
const ACCESS_QUEUE_DEPTH: usize = 64;

/// Row size of the row-buffer model (2 KiB rows).
const ROW_MASK: u64 = !2047;

/// A DRAM timing model that reports access latency in cycles.
pub trait DramTiming: Send + Sync {
    /// Returns the number of cycles required for an access to `addr`.
    fn access_latency(&mut self, addr: u64) -> u64;

    /// Prints model-specific statistics. The default prints nothing.
    fn print_stats(&self) {}
}

/// Fixed-latency DRAM; every access takes the same number of cycles.
#[derive(Debug)]
pub struct FixedLatencyDram {
    latency: u64,
}

impl FixedLatencyDram {
    /// Creates a model with the given fixed latency in cycles.
    pub fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl DramTiming for FixedLatencyDram {
    fn access_latency(&mut self, _addr: u64) -> u64 {
        self.latency
    }
}

/// Row-buffer hit/miss counters of [`RowBufferDram`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowBufferStats {
    /// Accesses to the open row.
    pub row_hits: u64,
    /// Accesses that closed a different open row.
    pub row_conflicts: u64,
    /// Accesses with no row open.
    pub row_empty: u64,
}

/// DRAM with a single open row; models CAS, RAS, and precharge latencies.
#[derive(Debug)]
pub struct RowBufferDram {
    last_row: Option<u64>,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
    stats: RowBufferStats,
    session: DramSession,
}

impl RowBufferDram {
    /// Creates a model with no row open.
    pub fn new(t_cas: u64, t_ras: u64, t_pre: u64, session: DramSession) -> Self {
        Self {
            last_row: None,
            t_cas,
            t_ras,
            t_pre,
            stats: RowBufferStats::default(),
            session,
        }
    }

    /// Row-buffer counters of the current session.
    pub fn stats(&self) -> RowBufferStats {
        self.stats
    }
}

impl DramTiming for RowBufferDram {
    fn access_latency(&mut self, addr: u64) -> u64 {
        let row = addr & ROW_MASK;
        match self.last_row {
            Some(open_row) if open_row == row => {
                self.stats.row_hits += 1;
                self.t_cas
            }
            Some(_) => {
                self.last_row = Some(row);
                self.stats.row_conflicts += 1;
                self.t_pre + self.t_ras + self.t_cas
            }
            None => {
                self.last_row = Some(row);
                self.stats.row_empty += 1;
                self.t_ras + self.t_cas
            }
        }
    }

    fn print_stats(&self) {
        let s = &self.session;
        println!("DRAM ({}, {} MiB)", s.core_name, s.ram_size_mib);
        println!("  device config          {}", s.ini_file.display());
        println!("  system config          {}", s.system_ini_file.display());
        println!("  results dir            {}", s.stats_dir.display());
        println!("  row.hits               {}", self.stats.row_hits);
        println!("  row.conflicts          {}", self.stats.row_conflicts);
        println!("  row.empty              {}", self.stats.row_empty);
    }
}

/// Session parameters handed to the DRAM model when it is rebuilt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DramSession {
    /// Device timing configuration file.
    pub ini_file: PathBuf,
    /// System timing configuration file.
    pub system_ini_file: PathBuf,
    /// Directory receiving the model's results.
    pub stats_dir: PathBuf,
    /// Core name used to label results.
    pub core_name: String,
    /// Guest memory size in MiB.
    pub ram_size_mib: u64,
}

impl DramSession {
    /// Collects the session parameters from the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            ini_file: config.memory.dram_ini_file.clone(),
            system_ini_file: config.memory.dram_system_ini_file.clone(),
            stats_dir: config.memory.dram_stats_dir.clone(),
            core_name: config.general.core_name.clone(),
            ram_size_mib: config.memory.guest_ram_size,
        }
    }
}

/// Direction of a queued request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// Line fill.
    Read,
    /// Write-back.
    Write,
}

/// A request waiting for DRAM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingAccess {
    /// Line address.
    pub addr: u64,
    /// Direction.
    pub kind: AccessKind,
    /// Stage that caused the request.
    pub stage: StageId,
    /// Controller cycle at which the request completes.
    pub done_at: u64,
}

/// Bounded FIFO of pending DRAM requests.
#[derive(Clone, Debug)]
pub struct MemAccessQueue {
    entries: Vec<PendingAccess>,
    capacity: usize,
}

impl MemAccessQueue {
    /// Creates an empty queue holding at most `capacity` requests.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Enqueues a request; returns `false` when the queue is full.
    pub fn push(&mut self, access: PendingAccess) -> bool {
        if self.entries.len() >= self.capacity {
            return false;
        }
        self.entries.push(access);
        true
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued requests, oldest first.
    pub fn entries(&self) -> &[PendingAccess] {
        &self.entries
    }

    /// Completion cycle of the oldest request.
    pub fn oldest_done_at(&self) -> Option<u64> {
        self.entries.first().map(|e| e.done_at)
    }

    /// Removes the oldest request.
    pub fn pop_oldest(&mut self) -> Option<PendingAccess> {
        (!self.entries.is_empty()).then(|| self.entries.remove(0))
    }

    /// Drops every request completed by cycle `now`.
    pub fn retire(&mut self, now: u64) {
        self.entries.retain(|e| e.done_at > now);
    }

    /// Drops every queued request.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

/// Memory controller: request queues plus the active DRAM model.
pub struct MemController {
    /// CPU-issued requests (line fills on cache misses).
    pub frontend: MemAccessQueue,
    /// DRAM-issued requests (write-backs of dirty victims).
    pub backend: MemAccessQueue,
    model: DramModel,
    dram: Box<dyn DramTiming>,
    config: MemoryConfig,
    now: u64,
}

impl std::fmt::Debug for MemController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemController")
            .field("model", &self.model)
            .field("frontend", &self.frontend.len())
            .field("backend", &self.backend.len())
            .finish_non_exhaustive()
    }
}

impl MemController {
    /// Builds the controller for the configured DRAM model.
    ///
    /// The `External` model starts with an empty session; it is rebuilt by
    /// [`MemController::reinit_dram`] at simulation start.
    pub fn new(config: &MemoryConfig) -> Self {
        let dram: Box<dyn DramTiming> = match config.dram_model {
            DramModel::Base => Box::new(FixedLatencyDram::new(config.base_latency)),
            DramModel::External => Box::new(RowBufferDram::new(
                config.t_cas,
                config.t_ras,
                config.t_pre,
                DramSession::default(),
            )),
        };
        Self {
            frontend: MemAccessQueue::new(ACCESS_QUEUE_DEPTH),
            backend: MemAccessQueue::new(ACCESS_QUEUE_DEPTH),
            model: config.dram_model,
            dram,
            config: config.clone(),
            now: 0,
        }
    }

    /// Active DRAM model.
    pub fn dram_model(&self) -> DramModel {
        self.model
    }

    /// Issues a request to DRAM and returns its latency, including any wait
    /// for a slot in a full queue.
    ///
    /// Reads are queued on the frontend, write-backs on the backend.
    pub fn access(&mut self, addr: u64, kind: AccessKind, stage: StageId) -> u64 {
        let now = self.now;
        let queue = match kind {
            AccessKind::Read => &mut self.frontend,
            AccessKind::Write => &mut self.backend,
        };
        queue.retire(now);
        let mut wait = 0;
        if queue.len() >= queue.capacity {
            wait = queue.oldest_done_at().map_or(0, |done| done.saturating_sub(now));
            let _ = queue.pop_oldest();
            tracing::trace!(addr = format_args!("{addr:#x}"), ?kind, wait, "dram queue full");
        }
        let latency = wait + self.dram.access_latency(addr);
        let _ = queue.push(PendingAccess {
            addr,
            kind,
            stage,
            done_at: now + latency,
        });
        latency
    }

    /// Advances the controller by one cycle and retires completed requests.
    pub fn tick(&mut self) {
        self.now += 1;
        self.frontend.retire(self.now);
        self.backend.retire(self.now);
    }

    /// Cycles elapsed since the controller was built.
    pub fn cycle(&self) -> u64 {
        self.now
    }

    /// Discards the CPU-issued requests.
    pub fn reset_frontend_queue(&mut self) {
        self.frontend.reset();
    }

    /// Discards every pending request.
    pub fn reset(&mut self) {
        self.frontend.reset();
        self.backend.reset();
    }

    /// Tears down and rebuilds the `External` model for `session`.
    ///
    /// The `Base` model carries no session state and is left untouched.
    pub fn reinit_dram(&mut self, session: &DramSession) {
        if self.model != DramModel::External {
            return;
        }
        self.reset();
        self.dram = Box::new(RowBufferDram::new(
            self.config.t_cas,
            self.config.t_ras,
            self.config.t_pre,
            session.clone(),
        ));
        tracing::debug!(core = %session.core_name, ram_mib = session.ram_size_mib, "dram model rebuilt");
    }

    /// Prints the active model's statistics.
    pub fn print_dram_stats(&self) {
        self.dram.print_stats();
    }
}
