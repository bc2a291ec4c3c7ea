//! Shared-Memory Publisher Tests.
//!
//! Creates real POSIX shared-memory objects under unique names and reads the
//! published snapshot back.

use rvcycle_core::common::NUM_PRIV_LEVELS;
use rvcycle_core::core::arch::PrivilegeMode;
use rvcycle_core::sim::publisher::SNAPSHOT_BYTES;
use rvcycle_core::sim::{ShmPublisher, SnapshotPublisher};
use rvcycle_core::stats::{SimStats, StatsTable};

fn unique_name(tag: &str) -> String {
    format!("/rvcycle-test-{tag}-{}", std::process::id())
}

#[test]
fn region_holds_one_record_per_level() {
    assert_eq!(SNAPSHOT_BYTES, NUM_PRIV_LEVELS * std::mem::size_of::<SimStats>());
}

#[cfg(target_os = "linux")]
#[test]
fn new_region_is_zeroed() {
    let publisher = ShmPublisher::create(&unique_name("zero")).unwrap();
    assert_eq!(publisher.read_back(), [SimStats::default(); NUM_PRIV_LEVELS]);
    publisher.remove();
}

#[cfg(target_os = "linux")]
#[test]
fn published_snapshot_is_visible() {
    let name = unique_name("publish");
    let mut publisher = ShmPublisher::create(&name).unwrap();
    assert_eq!(publisher.name(), name);

    let mut stats = StatsTable::default();
    stats[PrivilegeMode::User].ins_simulated = 11;
    stats[PrivilegeMode::Machine].btb_hits = 3;
    publisher.publish(&stats);

    let back = publisher.read_back();
    assert_eq!(&back, stats.levels());

    stats[PrivilegeMode::User].ins_simulated = 12;
    publisher.publish(&stats);
    assert_eq!(publisher.read_back()[PrivilegeMode::User.index()].ins_simulated, 12);
    publisher.remove();
}

#[test]
fn invalid_name_is_reported() {
    let err = ShmPublisher::create("bad\0name").unwrap_err();
    assert!(err.to_string().contains("create"));
}
