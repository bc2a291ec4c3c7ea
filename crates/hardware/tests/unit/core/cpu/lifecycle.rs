//! Simulation Lifecycle Tests.
//!
//! Verifies `start`/`stop` idempotence, the per-run resets driven by the
//! configuration, the final report, the trace file, and `reset`.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvcycle_core::config::{Config, DramModel};
use rvcycle_core::core::arch::PrivilegeMode;
use rvcycle_core::core::units::cache::CacheStats;
use rvcycle_core::soc::memory::DramSession;
use tempfile::TempDir;

use crate::common::builder::instruction::InsnBuilder;
use crate::common::harness::{CpuBuilder, predicting_config, retire_one, with_output_dir};
use crate::common::mocks::decoder::ScriptedDecoder;
use crate::common::mocks::memory::MockHierarchy;

const M: PrivilegeMode = PrivilegeMode::Machine;

fn stats(read: u64, read_miss: u64, write: u64, write_miss: u64) -> CacheStats {
    CacheStats {
        read,
        read_miss,
        write,
        write_miss,
    }
}

fn read_report(dir: &TempDir) -> serde_json::Value {
    let text = std::fs::read_to_string(dir.path().join("stats.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Mode transitions
// ══════════════════════════════════════════════════════════

#[test]
fn start_and_stop_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cpu, log) = CpuBuilder::new(with_output_dir(Config::default(), dir.path())).build();
    assert!(!cpu.is_simulating());

    cpu.stop(0x1000).unwrap();
    assert!(!dir.path().join("stats.json").exists(), "stop while idle writes nothing");

    cpu.start(0x1000).unwrap();
    cpu.advance_clock();
    cpu.start(0x1000).unwrap();
    assert!(cpu.is_simulating());
    assert_eq!(cpu.clock(), 1, "second start does not reset the clock");

    cpu.stop(0x1000).unwrap();
    assert!(!cpu.is_simulating());
    assert!(cpu.last_elapsed_ms().is_some());
    cpu.stop(0x1000).unwrap();
    assert_eq!(log.borrow().dram_stat_prints, 0);
}

#[test]
fn start_in_sim_begins_running() {
    let mut config = Config::default();
    config.general.start_in_sim = true;
    let (cpu, _) = CpuBuilder::new(config).build();
    assert!(cpu.is_simulating());
}

#[test]
fn start_resets_clock_and_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cpu, _) = CpuBuilder::new(with_output_dir(Config::default(), dir.path())).build();

    cpu.start(0).unwrap();
    let _ = retire_one(&mut cpu);
    cpu.advance_clock();
    assert_eq!(cpu.stats()[M].ins_simulated, 1);
    cpu.stop(0).unwrap();

    cpu.start(0).unwrap();
    assert_eq!(cpu.clock(), 0);
    assert_eq!(cpu.stats().total().ins_simulated, 0);
}

// ══════════════════════════════════════════════════════════
// 2. Per-run resets
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::kept(false)]
#[case::flushed(true)]
fn bpu_flushed_only_when_configured(#[case] flush: bool) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = with_output_dir(predicting_config(32, 2, 4), dir.path());
    config.bpu.flush_on_sim_start = flush;
    let decoder = ScriptedDecoder::new().with(InsnBuilder::new(0x1000).cond_branch(0x2000, true).build());
    let (mut cpu, _) = CpuBuilder::new(config).decoder(decoder).build();

    cpu.hart.pc = 0x1000;
    let _ = retire_one(&mut cpu);
    assert!(cpu.bpu().unwrap().btb().lookup(0x1000).is_some());

    cpu.start(0x1000).unwrap();
    assert_eq!(cpu.bpu().unwrap().btb().lookup(0x1000).is_none(), flush);
}

#[test]
fn caches_reset_only_when_modelled() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cpu, log) = CpuBuilder::new(with_output_dir(Config::default(), dir.path())).build();
    cpu.start(0).unwrap();
    let log = log.borrow();
    assert_eq!((log.l1_stat_resets, log.l2_stat_resets), (0, 0));
    assert_eq!((log.l1_flushes, log.l2_flushes), (0, 0));
}

#[test]
fn l1_reset_without_flush() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = with_output_dir(Config::default(), dir.path());
    config.cache.enable_l1_caches = true;
    let (mut cpu, log) = CpuBuilder::new(config).build();
    cpu.start(0).unwrap();
    let log = log.borrow();
    assert_eq!((log.l1_stat_resets, log.l2_stat_resets), (1, 0));
    assert_eq!((log.l1_flushes, log.l2_flushes), (0, 0));
}

#[test]
fn full_hierarchy_reset_and_flush() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = with_output_dir(Config::default(), dir.path());
    config.cache.enable_l1_caches = true;
    config.cache.enable_l2_cache = true;
    config.cache.flush_on_sim_start = true;
    let (mut cpu, log) = CpuBuilder::new(config).build();
    cpu.start(0).unwrap();
    let log = log.borrow();
    assert_eq!((log.l1_stat_resets, log.l2_stat_resets), (1, 1));
    assert_eq!((log.l1_flushes, log.l2_flushes), (1, 1));
}

#[test]
fn external_dram_rebuilt_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = with_output_dir(Config::default(), dir.path());
    config.memory.dram_model = DramModel::External;
    config.memory.dram_ini_file = "ddr4.ini".into();
    config.general.core_name = "hart0".to_string();
    let expected = DramSession::from_config(&config);

    let (mut cpu, log) = CpuBuilder::new(config)
        .mem(MockHierarchy::default().with_dram(DramModel::External))
        .build();
    cpu.start(0).unwrap();
    cpu.stop(0).unwrap();

    let log = log.borrow();
    assert_eq!(log.dram_reinits, vec![expected]);
    assert_eq!(log.dram_reinits[0].core_name, "hart0");
    assert_eq!(log.dram_stat_prints, 1);
}

#[test]
fn base_dram_not_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cpu, log) = CpuBuilder::new(with_output_dir(Config::default(), dir.path())).build();
    cpu.start(0).unwrap();
    cpu.stop(0).unwrap();
    assert!(log.borrow().dram_reinits.is_empty());
    assert_eq!(log.borrow().dram_stat_prints, 0);
}

// ══════════════════════════════════════════════════════════
// 3. Report
// ══════════════════════════════════════════════════════════

#[test]
fn stop_writes_report_per_privilege_level() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cpu, _) = CpuBuilder::new(with_output_dir(Config::default(), dir.path())).build();
    cpu.start(0).unwrap();
    let _ = retire_one(&mut cpu);
    cpu.stop(0).unwrap();

    let report = read_report(&dir);
    let levels = report.as_array().unwrap();
    let modes: Vec<&str> = levels.iter().map(|l| l["mode"].as_str().unwrap()).collect();
    assert_eq!(modes, ["user", "supervisor", "hypervisor", "machine"]);
    assert_eq!(levels[3]["ins_simulated"], 1);
    assert_eq!(levels[3]["ins_fetch"], 1);
    assert_eq!(levels[0]["ins_simulated"], 0);
}

#[test]
fn l2_counters_copied_only_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = with_output_dir(Config::default(), dir.path());
    config.cache.enable_l1_caches = true;
    let mem = MockHierarchy::default().with_cache_stats(stats(10, 2, 0, 0), stats(7, 1, 5, 3), stats(9, 9, 9, 9));
    let (mut cpu, _) = CpuBuilder::new(config).mem(mem).build();
    cpu.start(0).unwrap();
    cpu.stop(0).unwrap();

    let s = &cpu.stats()[M];
    assert_eq!((s.icache_read, s.icache_read_miss), (10, 2));
    assert_eq!((s.dcache_read, s.dcache_read_miss), (7, 1));
    assert_eq!((s.dcache_write, s.dcache_write_miss), (5, 3));
    assert_eq!(s.l2_cache_read, 0);
    assert_eq!(s.l2_cache_write_miss, 0);
}

#[test]
fn cache_counters_skipped_without_l1() {
    let dir = tempfile::tempdir().unwrap();
    let mem = MockHierarchy::default().with_cache_stats(stats(10, 2, 0, 0), stats(7, 1, 5, 3), stats(9, 9, 9, 9));
    let (mut cpu, _) = CpuBuilder::new(with_output_dir(Config::default(), dir.path()))
        .mem(mem)
        .build();
    cpu.start(0).unwrap();
    cpu.stop(0).unwrap();
    assert_eq!(cpu.stats()[M].icache_read, 0);
}

// ══════════════════════════════════════════════════════════
// 4. Trace
// ══════════════════════════════════════════════════════════

#[test]
fn trace_covers_one_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = with_output_dir(Config::default(), dir.path());
    config.general.do_sim_trace = true;
    let decoder = ScriptedDecoder::new().with(InsnBuilder::new(0x1000).text("addi a0,a0,1").build());
    let (mut cpu, _) = CpuBuilder::new(config).decoder(decoder).build();

    cpu.hart.pc = 0x1000;
    cpu.start(0x1000).unwrap();
    assert!(cpu.trace().is_active());
    assert!(cpu.config().general.create_ins_str);

    let _ = retire_one(&mut cpu);
    cpu.stop(0x1004).unwrap();
    assert!(!cpu.trace().is_active());

    let trace = std::fs::read_to_string(dir.path().join("trace.txt")).unwrap();
    assert_eq!(trace, "pc=1000 addi a0,a0,1\n");
}

#[rstest]
#[case::traced(true, "addi a0,a0,1")]
#[case::untraced(false, "")]
fn decoder_text_follows_trace_setting(#[case] trace: bool, #[case] text: &str) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = with_output_dir(Config::default(), dir.path());
    config.general.do_sim_trace = trace;
    let decoder = ScriptedDecoder::new().with(InsnBuilder::new(0x1000).text("addi a0,a0,1").build());
    let (mut cpu, _) = CpuBuilder::new(config).decoder(decoder).build();

    cpu.hart.pc = 0x1000;
    cpu.start(0x1000).unwrap();
    let retired = retire_one(&mut cpu);
    assert_eq!(retired.latch.insn.str, text);
    cpu.stop(0x1004).unwrap();
}

#[test]
fn no_trace_unless_configured() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cpu, _) = CpuBuilder::new(with_output_dir(Config::default(), dir.path())).build();
    cpu.start(0).unwrap();
    assert!(!cpu.trace().is_active());
    assert!(!cpu.config().general.create_ins_str);
    cpu.stop(0).unwrap();
    assert!(!dir.path().join("trace.txt").exists());
}

// ══════════════════════════════════════════════════════════
// 5. Reset
// ══════════════════════════════════════════════════════════

#[test]
fn reset_clears_latches_and_controller_queues() {
    let (mut cpu, log) = CpuBuilder::new(Config::default()).build();
    let _ = cpu.allocate_latch().unwrap();
    let _ = cpu.allocate_latch().unwrap();

    cpu.reset();

    assert!(cpu.latch_pool().is_empty());
    assert_eq!(cpu.allocate_latch().unwrap().index(), 0);
    assert_eq!(log.borrow().controller_resets, 1);
}
