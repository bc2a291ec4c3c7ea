//! Statistics Snapshot Publication Tests.
//!
//! Verifies that snapshots are published exactly on the clock interval, carry
//! the cache counters, and are skipped without a publisher. Clock advances
//! also step the memory system.

use rvcycle_core::common::STATS_PUBLISH_INTERVAL;
use rvcycle_core::config::Config;
use rvcycle_core::core::arch::PrivilegeMode;
use rvcycle_core::core::units::cache::CacheStats;

use crate::common::harness::CpuBuilder;
use crate::common::mocks::memory::MockHierarchy;
use crate::common::mocks::publisher::RecordingPublisher;

fn advance(cpu: &mut rvcycle_core::SimCpu, cycles: u64) {
    for _ in 0..cycles {
        cpu.advance_clock();
    }
}

#[test]
fn publishes_on_interval_boundaries() {
    let publisher = RecordingPublisher::new();
    let snapshots = publisher.snapshots();
    let (mut cpu, _) = CpuBuilder::new(Config::default()).publisher(publisher).build();

    advance(&mut cpu, STATS_PUBLISH_INTERVAL - 1);
    assert!(snapshots.borrow().is_empty());

    advance(&mut cpu, 1);
    assert_eq!(snapshots.borrow().len(), 1);

    advance(&mut cpu, STATS_PUBLISH_INTERVAL);
    assert_eq!(cpu.clock(), 2 * STATS_PUBLISH_INTERVAL);
    assert_eq!(snapshots.borrow().len(), 2);
}

#[test]
fn clock_advance_ticks_memory_system() {
    let (mut cpu, log) = CpuBuilder::new(Config::default()).build();
    advance(&mut cpu, 25);
    assert_eq!(log.borrow().ticks, 25);
}

#[test]
fn clock_zero_is_due() {
    let publisher = RecordingPublisher::new();
    let snapshots = publisher.snapshots();
    let (mut cpu, _) = CpuBuilder::new(Config::default()).publisher(publisher).build();

    assert!(cpu.publish_if_due());
    assert_eq!(snapshots.borrow().len(), 1);
}

#[test]
fn nothing_published_without_publisher() {
    let (mut cpu, _) = CpuBuilder::new(Config::default()).build();
    assert!(!cpu.publish_if_due());
    advance(&mut cpu, STATS_PUBLISH_INTERVAL);
    assert!(!cpu.publish_if_due());
}

#[test]
fn snapshot_carries_cache_counters() {
    let mut config = Config::default();
    config.cache.enable_l1_caches = true;
    let icache = CacheStats {
        read: 40,
        read_miss: 4,
        ..CacheStats::default()
    };
    let mem = MockHierarchy::default().with_cache_stats(icache, CacheStats::default(), CacheStats::default());
    let publisher = RecordingPublisher::new();
    let snapshots = publisher.snapshots();
    let (mut cpu, _) = CpuBuilder::new(config).mem(mem).publisher(publisher).build();

    assert!(cpu.publish_if_due());
    let snapshots = snapshots.borrow();
    let m = &snapshots[0][PrivilegeMode::Machine];
    assert_eq!((m.icache_read, m.icache_read_miss), (40, 4));
}
