//! DiskMonitor volume filtering, space and speed handling.
use hostmon_core::fake::{FakeCounters, FakeVolumes};
use hostmon_core::source::{CounterPath, DriveType, VolumeSpace};
use hostmon_core::{DiskMonitor, Monitor, MonitorError};

const GB: u64 = 1_000_000_000;

fn space(total: u64, free: u64) -> VolumeSpace {
    VolumeSpace { total, free }
}

fn host() -> (FakeVolumes, FakeCounters) {
    let volumes = FakeVolumes::new();
    volumes.add_volume("C:", "NTFS", DriveType::Fixed, space(500 * GB, 200 * GB));
    volumes.add_volume("D:", "CDFS", DriveType::Optical, space(GB, 0));
    volumes.add_volume("E:", "FAT32", DriveType::Removable, space(64 * GB, 60 * GB));
    volumes.add_volume("Z:", "SMB", DriveType::Network, space(GB, GB));
    (volumes, FakeCounters::new(1))
}

#[test]
fn only_fixed_and_removable_volumes_are_monitored() {
    let (volumes, counters) = host();
    let mut disk = DiskMonitor::with_sources(volumes, counters);
    disk.initialize().unwrap();

    let drives: Vec<&str> = disk.disks().iter().map(|d| d.drive.as_str()).collect();
    assert_eq!(drives, vec!["C:", "E:"]);
    assert_eq!(disk.drive_count(), 2);
    assert!(disk.drive_info("Z:").is_none());
    assert!(disk.drive_info("D:").is_none());

    let c = disk.drive_info("C:").unwrap();
    assert_eq!(c.volume_name, "Volume C:");
    assert_eq!(c.file_system, "NTFS");
    assert_eq!(c.used_space(), 300 * GB);
    assert_eq!(c.usage_percent(), 60.0);
}

#[test]
fn failed_space_query_only_affects_that_volume() {
    let (volumes, counters) = host();
    let mut disk = DiskMonitor::with_sources(volumes.clone(), counters);
    disk.initialize().unwrap();

    volumes.fail_space("C:", true);
    volumes.set_space("C:", space(500 * GB, 100 * GB));
    volumes.set_space("E:", space(64 * GB, 32 * GB));
    disk.update();

    let c = disk.drive_info("C:").unwrap();
    assert!(c.space_is_stale());
    assert_eq!(c.free_space(), 200 * GB);
    let e = disk.drive_info("E:").unwrap();
    assert!(!e.space_is_stale());
    assert_eq!(e.free_space(), 32 * GB);
    assert_eq!(e.usage_percent(), 50.0);
}

#[test]
fn speeds_come_from_counters() {
    let (volumes, counters) = host();
    let mut disk = DiskMonitor::with_sources(volumes, counters.clone());
    disk.initialize().unwrap();

    counters.set_value(CounterPath::DiskReadBytes("C:".into()), 4096.0);
    counters.set_value(CounterPath::DiskWriteBytes("C:".into()), 1024.0);
    counters.set_value(CounterPath::DiskWriteBytes("E:".into()), f64::NAN);
    disk.update();

    let c = disk.drive_info("C:").unwrap();
    assert_eq!(c.read_speed(), 4096.0);
    assert_eq!(c.write_speed(), 1024.0);
    assert_eq!(disk.drive_info("E:").unwrap().write_speed(), 0.0);
}

#[test]
fn missing_speed_counter_reports_zero() {
    let (volumes, counters) = host();
    counters.reject(CounterPath::DiskReadBytes("E:".into()));
    counters.set_value(CounterPath::DiskReadBytes("E:".into()), 999.0);
    let mut disk = DiskMonitor::with_sources(volumes, counters);
    disk.initialize().unwrap();
    disk.update();

    let e = disk.drive_info("E:").unwrap();
    assert_eq!(e.read_speed(), 0.0);
    assert!(!e.speed_is_stale());
}

#[test]
fn no_monitored_volumes_fails_initialize() {
    let volumes = FakeVolumes::new();
    volumes.add_volume("Z:", "NFS", DriveType::Network, space(GB, GB));
    let counters = FakeCounters::new(1);
    let mut disk = DiskMonitor::with_sources(volumes, counters.clone());
    assert!(matches!(disk.initialize(), Err(MonitorError::NoVolumes)));
    assert!(!disk.is_initialized());
    assert!(counters.events().is_empty());
}

#[test]
fn enumeration_failure_fails_initialize() {
    let (volumes, counters) = host();
    volumes.fail_enumeration(true);
    let mut disk = DiskMonitor::with_sources(volumes, counters);
    assert!(matches!(
        disk.initialize(),
        Err(MonitorError::VolumeEnumeration(_))
    ));
}

#[test]
fn drop_releases_disk_counters() {
    let (volumes, counters) = host();
    {
        let mut disk = DiskMonitor::with_sources(volumes, counters.clone());
        disk.initialize().unwrap();
    }
    let events = counters.events();
    assert_eq!(events.iter().filter(|e| e.starts_with("add")).count(), 4);
    assert_eq!(events.iter().filter(|e| e.starts_with("remove")).count(), 4);
    assert_eq!(events.last().map(String::as_str), Some("close"));
}
