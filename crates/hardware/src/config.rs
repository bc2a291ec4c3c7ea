//! Configuration system for the timing core.
//!
//! This module defines all configuration structures and enums used to parameterize
//! a simulation session. It provides:
//! 1. **Defaults:** Baseline constants for the predictor, caches, and DRAM model.
//! 2. **Structures:** Hierarchical config for general, BPU, cache, memory, and pipeline.
//! 3. **Enums:** Core type, eviction policy, and DRAM model selection.
//!
//! Configuration is supplied as JSON (`Config::from_json_str` / `Config::from_json_file`)
//! or built with `Config::default()`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::constants::STATS_SHM_NAME;
use crate::common::error::{SimError, SimResult};

/// Default configuration constants for the timing core.
mod defaults {
    /// Default Branch Target Buffer size (entries).
    pub const BTB_SIZE: usize = 32;

    /// Default Branch Target Buffer associativity.
    pub const BTB_WAYS: usize = 2;

    /// Default Return Address Stack size (0 disables the RAS).
    pub const RAS_SIZE: usize = 4;

    /// Default cache size in bytes (32 KiB).
    pub const CACHE_SIZE: usize = 32 * 1024;

    /// Default L2 cache size in bytes (256 KiB).
    pub const L2_SIZE: usize = 256 * 1024;

    /// Default cache line size in bytes.
    pub const CACHE_LINE: usize = 64;

    /// Default cache associativity.
    pub const CACHE_WAYS: usize = 4;

    /// Default L1 access latency in cycles.
    pub const L1_LATENCY: u64 = 1;

    /// Default L2 access latency in cycles.
    pub const L2_LATENCY: u64 = 8;

    /// Fixed latency of the base DRAM model in cycles.
    pub const BASE_DRAM_LATENCY: u64 = 60;

    /// Guest RAM size in MiB.
    pub const GUEST_RAM_SIZE: u64 = 1024;

    /// CAS latency of the external DRAM model in cycles.
    pub const T_CAS: u64 = 14;

    /// RAS latency of the external DRAM model in cycles.
    pub const T_RAS: u64 = 14;

    /// Precharge latency of the external DRAM model in cycles.
    pub const T_PRE: u64 = 14;

    /// Latency of each non-pipelined FP ALU op class (add, mul, div, sqrt, misc).
    pub const FPU_ALU_LATENCY: [u64; 5] = [2, 2, 12, 12, 1];

    /// Core name used for DRAM result files.
    pub const CORE_NAME: &str = "rvcycle";

    /// File receiving the final statistics report.
    pub const SIM_STATS_PATH: &str = "rvcycle-stats.json";

    /// File receiving the commit trace.
    pub const SIM_TRACE_FILE: &str = "rvcycle-trace.txt";
}

/// Type of the core scheduler driving the stage executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CoreType {
    /// In-order pipelined core.
    #[default]
    InOrder,
    /// Out-of-order core.
    OutOfOrder,
}

/// Replacement policy used by set-associative timing structures (BTB, caches).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EvictionPolicy {
    /// Least Recently Used.
    #[default]
    #[serde(alias = "LRU")]
    Lru,
    /// Pseudo-random victim selection.
    Random,
}

/// DRAM timing model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DramModel {
    /// Fixed-latency model; no session state.
    #[default]
    Base,
    /// Row-buffer timing simulator rebuilt at every simulation start.
    External,
}

/// Root configuration structure containing all session settings.
///
/// # Examples
///
/// ```
/// use rvcycle_core::config::{Config, DramModel};
///
/// let json = r#"{
///     "bpu": { "enabled": true, "btb_size": 64, "ras_size": 8 },
///     "cache": { "enable_l1_caches": true },
///     "memory": { "dram_model": "External" }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert!(config.bpu.enabled);
/// assert_eq!(config.bpu.btb_size, 64);
/// assert_eq!(config.memory.dram_model, DramModel::External);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Branch prediction unit settings
    #[serde(default)]
    pub bpu: BpuConfig,
    /// Cache hierarchy settings
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
    /// DRAM and memory controller settings
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Functional-unit latencies
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Parses a configuration from a JSON document.
    ///
    /// Every section and field is optional; missing values take their defaults.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SimError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Begin in simulation mode instead of functional emulation
    #[serde(default)]
    pub start_in_sim: bool,

    /// Core scheduler type
    #[serde(default)]
    pub core_type: CoreType,

    /// Core name passed to the external DRAM model
    #[serde(default = "GeneralConfig::default_core_name")]
    pub core_name: String,

    /// Path of the final statistics report
    #[serde(default = "GeneralConfig::default_stats_path")]
    pub sim_stats_path: PathBuf,

    /// Write a commit trace during simulation
    #[serde(default)]
    pub do_sim_trace: bool,

    /// Path of the commit trace
    #[serde(default = "GeneralConfig::default_trace_file")]
    pub sim_trace_file: PathBuf,

    /// Generate disassembly strings for each instruction
    #[serde(default)]
    pub create_ins_str: bool,

    /// Publish statistics snapshots for the external viewer
    #[serde(default)]
    pub enable_stats_display: bool,

    /// Name of the shared-memory object used for snapshots
    #[serde(default = "GeneralConfig::default_shm_name")]
    pub stats_shm_name: String,
}

impl GeneralConfig {
    fn default_core_name() -> String {
        defaults::CORE_NAME.to_string()
    }

    fn default_stats_path() -> PathBuf {
        PathBuf::from(defaults::SIM_STATS_PATH)
    }

    fn default_trace_file() -> PathBuf {
        PathBuf::from(defaults::SIM_TRACE_FILE)
    }

    fn default_shm_name() -> String {
        STATS_SHM_NAME.to_string()
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_in_sim: false,
            core_type: CoreType::default(),
            core_name: Self::default_core_name(),
            sim_stats_path: Self::default_stats_path(),
            do_sim_trace: false,
            sim_trace_file: Self::default_trace_file(),
            create_ins_str: false,
            enable_stats_display: false,
            stats_shm_name: Self::default_shm_name(),
        }
    }
}

/// Branch prediction unit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BpuConfig {
    /// Enable branch prediction (selects the predicting stage handlers)
    #[serde(default)]
    pub enabled: bool,

    /// Branch Target Buffer size (entries)
    #[serde(default = "BpuConfig::default_btb_size")]
    pub btb_size: usize,

    /// Branch Target Buffer associativity
    #[serde(default = "BpuConfig::default_btb_ways")]
    pub btb_ways: usize,

    /// BTB victim selection
    #[serde(default)]
    pub btb_eviction: EvictionPolicy,

    /// Return Address Stack size; 0 disables return prediction
    #[serde(default = "BpuConfig::default_ras_size")]
    pub ras_size: usize,

    /// Flush predictor state at every simulation start
    #[serde(default)]
    pub flush_on_sim_start: bool,
}

impl BpuConfig {
    fn default_btb_size() -> usize {
        defaults::BTB_SIZE
    }

    fn default_btb_ways() -> usize {
        defaults::BTB_WAYS
    }

    fn default_ras_size() -> usize {
        defaults::RAS_SIZE
    }
}

impl Default for BpuConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            btb_size: defaults::BTB_SIZE,
            btb_ways: defaults::BTB_WAYS,
            btb_eviction: EvictionPolicy::default(),
            ras_size: defaults::RAS_SIZE,
            flush_on_sim_start: false,
        }
    }
}

/// Cache hierarchy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheHierarchyConfig {
    /// Model the L1 instruction and data caches
    #[serde(default)]
    pub enable_l1_caches: bool,

    /// Model a unified L2 behind the L1 caches
    #[serde(default)]
    pub enable_l2_cache: bool,

    /// Invalidate cache contents at every simulation start
    #[serde(default)]
    pub flush_on_sim_start: bool,

    /// L1 instruction cache
    #[serde(default = "CacheConfig::default_l1")]
    pub l1_i: CacheConfig,

    /// L1 data cache
    #[serde(default = "CacheConfig::default_l1")]
    pub l1_d: CacheConfig,

    /// Unified L2 cache
    #[serde(default = "CacheConfig::default_l2")]
    pub l2: CacheConfig,
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            enable_l1_caches: false,
            enable_l2_cache: false,
            flush_on_sim_start: false,
            l1_i: CacheConfig::default_l1(),
            l1_d: CacheConfig::default_l1(),
            l2: CacheConfig::default_l2(),
        }
    }
}

/// Individual cache level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Total cache size in bytes
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,

    /// Cache line size in bytes
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,

    /// Associativity (number of ways)
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Read hit latency in cycles
    #[serde(default = "CacheConfig::default_latency")]
    pub read_latency: u64,

    /// Write hit latency in cycles
    #[serde(default = "CacheConfig::default_latency")]
    pub write_latency: u64,

    /// Victim selection
    #[serde(default)]
    pub eviction: EvictionPolicy,
}

impl CacheConfig {
    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    fn default_line() -> usize {
        defaults::CACHE_LINE
    }

    fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }

    fn default_latency() -> u64 {
        defaults::L1_LATENCY
    }

    /// Returns the default L1 configuration.
    fn default_l1() -> Self {
        Self {
            size_bytes: defaults::CACHE_SIZE,
            line_bytes: defaults::CACHE_LINE,
            ways: defaults::CACHE_WAYS,
            read_latency: defaults::L1_LATENCY,
            write_latency: defaults::L1_LATENCY,
            eviction: EvictionPolicy::Lru,
        }
    }

    /// Returns the default L2 configuration.
    fn default_l2() -> Self {
        Self {
            size_bytes: defaults::L2_SIZE,
            line_bytes: defaults::CACHE_LINE,
            ways: defaults::CACHE_WAYS * 2,
            read_latency: defaults::L2_LATENCY,
            write_latency: defaults::L2_LATENCY,
            eviction: EvictionPolicy::Lru,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::default_l1()
    }
}

/// DRAM and memory controller configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// DRAM timing model
    #[serde(default)]
    pub dram_model: DramModel,

    /// Fixed latency of the base model in cycles
    #[serde(default = "MemoryConfig::default_base_latency")]
    pub base_latency: u64,

    /// Guest RAM size in MiB
    #[serde(default = "MemoryConfig::default_ram_size")]
    pub guest_ram_size: u64,

    /// Device timing configuration file for the external model
    #[serde(default)]
    pub dram_ini_file: PathBuf,

    /// System timing configuration file for the external model
    #[serde(default)]
    pub dram_system_ini_file: PathBuf,

    /// Directory receiving the external model's results
    #[serde(default)]
    pub dram_stats_dir: PathBuf,

    /// CAS latency (column access strobe)
    #[serde(default = "MemoryConfig::default_t_cas")]
    pub t_cas: u64,

    /// RAS latency (row access strobe)
    #[serde(default = "MemoryConfig::default_t_ras")]
    pub t_ras: u64,

    /// Precharge latency
    #[serde(default = "MemoryConfig::default_t_pre")]
    pub t_pre: u64,
}

impl MemoryConfig {
    fn default_base_latency() -> u64 {
        defaults::BASE_DRAM_LATENCY
    }

    fn default_ram_size() -> u64 {
        defaults::GUEST_RAM_SIZE
    }

    fn default_t_cas() -> u64 {
        defaults::T_CAS
    }

    fn default_t_ras() -> u64 {
        defaults::T_RAS
    }

    fn default_t_pre() -> u64 {
        defaults::T_PRE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dram_model: DramModel::default(),
            base_latency: defaults::BASE_DRAM_LATENCY,
            guest_ram_size: defaults::GUEST_RAM_SIZE,
            dram_ini_file: PathBuf::new(),
            dram_system_ini_file: PathBuf::new(),
            dram_stats_dir: PathBuf::new(),
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
        }
    }
}

/// Functional-unit latency configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Latency of each non-pipelined FP ALU op class, indexed by `FpuAluOp`
    #[serde(default = "PipelineConfig::default_fpu_alu_latency")]
    pub fpu_alu_latency: [u64; 5],
}

impl PipelineConfig {
    fn default_fpu_alu_latency() -> [u64; 5] {
        defaults::FPU_ALU_LATENCY
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fpu_alu_latency: defaults::FPU_ALU_LATENCY,
        }
    }
}
