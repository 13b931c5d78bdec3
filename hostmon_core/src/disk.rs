//! Volume space and per-volume read/write throughput.

use tracing::{debug, info, warn};

use crate::error::MonitorError;
use crate::format::usage_percent;
use crate::monitor::{CounterSet, Monitor};
use crate::reading::Reading;
use crate::source::host::{SysinfoCounters, SysinfoVolumes};
use crate::source::{
    CounterBackend, CounterHandle, CounterPath, CounterQuery, DriveType, Volume, VolumeSource,
    VolumeSpace,
};

const NETWORK_FS: &[&str] = &[
    "nfs", "nfs4", "cifs", "sshfs", "fuse.sshfs", "9p", "afs", "ncpfs",
    "davfs", "glusterfs", "ceph", "fuse.rclone",
];
const OPTICAL_FS: &[&str] = &["iso9660", "udf", "cdfs"];
const RAM_FS: &[&str] = &["tmpfs", "ramfs", "devtmpfs"];

/// Drive type implied by a file system name.
pub fn classify_file_system(file_system: &str, removable: bool) -> DriveType {
    let fs = file_system.to_ascii_lowercase();
    let fs = fs.as_str();
    if NETWORK_FS.contains(&fs) || fs.starts_with("smb") {
        DriveType::Network
    } else if OPTICAL_FS.contains(&fs) {
        DriveType::Optical
    } else if RAM_FS.contains(&fs) {
        DriveType::Ram
    } else if removable {
        DriveType::Removable
    } else {
        DriveType::Fixed
    }
}

/// One monitored volume. Identity is fixed at initialize; space and speed
/// are refreshed every tick.
#[derive(Debug, Clone)]
pub struct DiskInfo {
    pub drive: String,
    pub volume_name: String,
    pub file_system: String,
    pub drive_type: DriveType,
    space: Reading<VolumeSpace>,
    read_speed: Reading<f64>,
    write_speed: Reading<f64>,
}

impl DiskInfo {
    fn from_volume(v: Volume) -> Self {
        Self {
            drive: v.drive,
            volume_name: v.volume_name,
            file_system: v.file_system,
            drive_type: v.drive_type,
            space: Reading::default(),
            read_speed: Reading::default(),
            write_speed: Reading::default(),
        }
    }

    pub fn total_space(&self) -> u64 {
        self.space.get().total
    }

    pub fn free_space(&self) -> u64 {
        self.space.get().free
    }

    pub fn used_space(&self) -> u64 {
        self.total_space().saturating_sub(self.free_space())
    }

    /// 0..=100; 0 while the total is unknown.
    pub fn usage_percent(&self) -> f64 {
        usage_percent(self.used_space(), self.total_space())
    }

    /// Bytes read per second.
    pub fn read_speed(&self) -> f64 {
        self.read_speed.value()
    }

    /// Bytes written per second.
    pub fn write_speed(&self) -> f64 {
        self.write_speed.value()
    }

    pub fn space_is_stale(&self) -> bool {
        self.space.is_stale()
    }

    pub fn speed_is_stale(&self) -> bool {
        self.read_speed.is_stale() || self.write_speed.is_stale()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SpeedCounters {
    read: Option<CounterHandle>,
    write: Option<CounterHandle>,
}

fn try_add<Q: CounterQuery>(set: &mut CounterSet<Q>, path: CounterPath) -> Option<CounterHandle> {
    match set.add(&path) {
        Ok(h) => Some(h),
        Err(e) => {
            warn!(%path, error = %e, "disk speed counter unavailable; reporting zero");
            None
        }
    }
}

fn read_rate<Q: CounterQuery>(set: &CounterSet<Q>, handle: Option<CounterHandle>, out: &mut Reading<f64>) {
    let Some(h) = handle else { return };
    match set.value(h) {
        Ok(v) if v.is_finite() => out.set(v.max(0.0)),
        Ok(_) => out.set(0.0),
        Err(_) => out.mark_stale(),
    }
}

pub struct DiskMonitor<V: VolumeSource = SysinfoVolumes, B: CounterBackend = SysinfoCounters> {
    volumes: V,
    backend: B,
    counters: Option<CounterSet<B::Query>>,
    // parallel to `disks`
    speed: Vec<SpeedCounters>,
    disks: Vec<DiskInfo>,
    initialized: bool,
}

impl DiskMonitor<SysinfoVolumes, SysinfoCounters> {
    pub fn new() -> Self {
        Self::with_sources(SysinfoVolumes::new(), SysinfoCounters::new())
    }
}

impl Default for DiskMonitor<SysinfoVolumes, SysinfoCounters> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VolumeSource, B: CounterBackend> DiskMonitor<V, B> {
    pub fn with_sources(volumes: V, backend: B) -> Self {
        Self {
            volumes,
            backend,
            counters: None,
            speed: Vec::new(),
            disks: Vec::new(),
            initialized: false,
        }
    }

    pub fn disks(&self) -> &[DiskInfo] {
        &self.disks
    }

    /// Exact match on the drive identity; `None` when no such volume was
    /// enumerated.
    pub fn drive_info(&self, drive: &str) -> Option<&DiskInfo> {
        self.disks.iter().find(|d| d.drive == drive)
    }

    pub fn drive_count(&self) -> usize {
        self.disks.len()
    }

    fn collect_space(&mut self) {
        for disk in self.disks.iter_mut() {
            match self.volumes.space(&disk.drive) {
                Ok(space) => disk.space.set(space),
                Err(e) => {
                    debug!(drive = %disk.drive, error = %e, "space query failed; keeping previous values");
                    disk.space.mark_stale();
                }
            }
        }
    }

    fn collect_speed(&mut self) {
        let Some(set) = self.counters.as_mut() else {
            return;
        };
        if let Err(e) = set.collect() {
            warn!(error = %e, "disk counter collection failed; keeping previous rates");
            for (disk, sc) in self.disks.iter_mut().zip(&self.speed) {
                if sc.read.is_some() {
                    disk.read_speed.mark_stale();
                }
                if sc.write.is_some() {
                    disk.write_speed.mark_stale();
                }
            }
            return;
        }
        for (disk, sc) in self.disks.iter_mut().zip(&self.speed) {
            read_rate(set, sc.read, &mut disk.read_speed);
            read_rate(set, sc.write, &mut disk.write_speed);
        }
    }
}

impl<V: VolumeSource, B: CounterBackend> Monitor for DiskMonitor<V, B> {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn initialize(&mut self) -> Result<(), MonitorError> {
        if self.initialized {
            return Ok(());
        }
        let disks: Vec<DiskInfo> = self
            .volumes
            .volumes()
            .map_err(MonitorError::VolumeEnumeration)?
            .into_iter()
            .filter(|v| v.drive_type.is_monitored())
            .map(DiskInfo::from_volume)
            .collect();
        if disks.is_empty() {
            return Err(MonitorError::NoVolumes);
        }

        let mut set = CounterSet::open(&mut self.backend).map_err(MonitorError::QueryOpen)?;
        self.speed = disks
            .iter()
            .map(|d| SpeedCounters {
                read: try_add(&mut set, CounterPath::DiskReadBytes(d.drive.clone())),
                write: try_add(&mut set, CounterPath::DiskWriteBytes(d.drive.clone())),
            })
            .collect();
        self.disks = disks;
        self.collect_space();

        if let Err(e) = set.collect() {
            warn!(error = %e, "priming disk counters failed");
        }
        info!(
            drives = self.disks.len(),
            counters = set.len(),
            "disk monitor initialized"
        );
        self.counters = Some(set);
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self) {
        if !self.initialized {
            return;
        }
        self.collect_space();
        self.collect_speed();
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_network_and_optical() {
        assert_eq!(classify_file_system("nfs4", false), DriveType::Network);
        assert_eq!(classify_file_system("CIFS", false), DriveType::Network);
        assert_eq!(classify_file_system("smb3", false), DriveType::Network);
        assert_eq!(classify_file_system("iso9660", true), DriveType::Optical);
        assert_eq!(classify_file_system("CDFS", false), DriveType::Optical);
        assert_eq!(classify_file_system("tmpfs", false), DriveType::Ram);
    }

    #[test]
    fn classifies_local_disks() {
        assert_eq!(classify_file_system("ext4", false), DriveType::Fixed);
        assert_eq!(classify_file_system("NTFS", false), DriveType::Fixed);
        assert_eq!(classify_file_system("vfat", true), DriveType::Removable);
        assert!(DriveType::Removable.is_monitored());
        assert!(!DriveType::Network.is_monitored());
    }

    #[test]
    fn drive_type_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&DriveType::Removable).unwrap(), "\"removable\"");
        assert_eq!(serde_json::to_string(&DriveType::Ram).unwrap(), "\"ram\"");
    }
}
