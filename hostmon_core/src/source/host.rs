//! Host facilities backed by `sysinfo`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use sysinfo::{
    CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System, IS_SUPPORTED_SYSTEM,
};
use tracing::debug;

use super::{
    CounterBackend, CounterHandle, CounterPath, CounterQuery, InterfaceRow, InterfaceSource,
    MemorySource, MemoryStatus, Volume, VolumeSource, VolumeSpace,
};
use crate::disk::classify_file_system;
use crate::error::{Result, SourceError};

/// Identity used for a volume: "C:" on Windows, the mount point elsewhere.
pub(crate) fn drive_id(mount_point: &Path) -> String {
    let s = mount_point.to_string_lossy();
    if cfg!(windows) {
        s.trim_end_matches(&['\\', '/'][..]).to_string()
    } else {
        s.into_owned()
    }
}

fn is_loopback_name(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name.to_ascii_lowercase().contains("loopback")
}

// ---------- Counters ----------

/// Opens counter queries against the running host.
#[derive(Debug, Default)]
pub struct SysinfoCounters;

impl SysinfoCounters {
    pub fn new() -> Self {
        Self
    }
}

impl CounterBackend for SysinfoCounters {
    type Query = SysinfoQuery;

    fn open_query(&mut self) -> Result<SysinfoQuery> {
        if !IS_SUPPORTED_SYSTEM {
            return Err(SourceError::unavailable("counter query"));
        }
        Ok(SysinfoQuery::default())
    }

    fn processor_count(&mut self) -> usize {
        let mut sys = System::new();
        sys.refresh_cpu_list(CpuRefreshKind::nothing());
        match sys.cpus().len() {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }
}

#[derive(Debug)]
struct Registered {
    path: CounterPath,
    // collections completed when the counter was added
    added_at: u64,
}

/// One open query. CPU counters read `System` usage, disk counters turn the
/// per-refresh byte deltas of `Disks` into bytes/sec.
#[derive(Default)]
pub struct SysinfoQuery {
    sys: Option<System>,
    disks: Option<Disks>,
    counters: Vec<Option<Registered>>,
    // drive -> (read B/s, write B/s)
    disk_rates: HashMap<String, (f64, f64)>,
    collections: u64,
    last_collect: Option<Instant>,
    closed: bool,
}

impl SysinfoQuery {
    fn system(&mut self) -> &mut System {
        self.sys.get_or_insert_with(|| {
            System::new_with_specifics(
                RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
            )
        })
    }

    fn disks(&mut self) -> &mut Disks {
        self.disks.get_or_insert_with(Disks::new_with_refreshed_list)
    }

    fn has_drive(&mut self, drive: &str) -> bool {
        self.disks()
            .list()
            .iter()
            .any(|d| drive_id(d.mount_point()) == drive)
    }

    fn register(&mut self, path: &CounterPath) -> CounterHandle {
        self.counters.push(Some(Registered {
            path: path.clone(),
            added_at: self.collections,
        }));
        CounterHandle(self.counters.len() - 1)
    }
}

impl CounterQuery for SysinfoQuery {
    fn add_counter(&mut self, path: &CounterPath) -> Result<CounterHandle> {
        if self.closed {
            return Err(SourceError::NoSuchQuery);
        }
        let known = match path {
            CounterPath::ProcessorTime(None) => {
                self.system();
                true
            }
            CounterPath::ProcessorTime(Some(i)) => *i < self.system().cpus().len(),
            CounterPath::DiskReadBytes(d) | CounterPath::DiskWriteBytes(d) => self.has_drive(d),
        };
        if !known {
            return Err(SourceError::NoSuchCounter(path.to_string()));
        }
        Ok(self.register(path))
    }

    fn collect(&mut self) -> Result<()> {
        if self.closed {
            return Err(SourceError::NoSuchQuery);
        }
        let now = Instant::now();
        if let Some(sys) = self.sys.as_mut() {
            sys.refresh_cpu_usage();
        }
        if let Some(disks) = self.disks.as_mut() {
            // keep vanished disks so their counters read stale instead of failing
            disks.refresh(false);
            let dt = self
                .last_collect
                .map(|t| now.duration_since(t).as_secs_f64())
                .unwrap_or(0.0);
            if dt > 0.0 {
                for d in disks.list() {
                    let usage = d.usage();
                    self.disk_rates.insert(
                        drive_id(d.mount_point()),
                        (usage.read_bytes as f64 / dt, usage.written_bytes as f64 / dt),
                    );
                }
            }
        }
        self.collections += 1;
        self.last_collect = Some(now);
        Ok(())
    }

    fn formatted_value(&self, handle: CounterHandle) -> Result<f64> {
        let reg = self
            .counters
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| SourceError::NoSuchCounter(format!("handle {}", handle.0)))?;
        // one collection for the baseline, one for the delta
        if self.collections < reg.added_at + 2 {
            return Err(SourceError::NoData(reg.path.to_string()));
        }
        let missing = || SourceError::NoSuchCounter(reg.path.to_string());
        match &reg.path {
            CounterPath::ProcessorTime(None) => self
                .sys
                .as_ref()
                .map(|s| s.global_cpu_usage() as f64)
                .ok_or_else(missing),
            CounterPath::ProcessorTime(Some(i)) => self
                .sys
                .as_ref()
                .and_then(|s| s.cpus().get(*i))
                .map(|c| c.cpu_usage() as f64)
                .ok_or_else(missing),
            CounterPath::DiskReadBytes(d) => {
                self.disk_rates.get(d).map(|r| r.0).ok_or_else(missing)
            }
            CounterPath::DiskWriteBytes(d) => {
                self.disk_rates.get(d).map(|r| r.1).ok_or_else(missing)
            }
        }
    }

    fn remove_counter(&mut self, handle: CounterHandle) {
        if let Some(slot) = self.counters.get_mut(handle.0) {
            *slot = None;
        }
    }

    fn close(&mut self) {
        self.counters.clear();
        self.disk_rates.clear();
        self.sys = None;
        self.disks = None;
        self.closed = true;
    }
}

// ---------- Volumes ----------

pub struct SysinfoVolumes {
    disks: Disks,
}

impl SysinfoVolumes {
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoVolumes {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeSource for SysinfoVolumes {
    fn volumes(&mut self) -> Result<Vec<Volume>> {
        if !IS_SUPPORTED_SYSTEM {
            return Err(SourceError::unavailable("volume enumeration"));
        }
        self.disks.refresh(true);
        Ok(self
            .disks
            .list()
            .iter()
            .map(|d| {
                let file_system = d.file_system().to_string_lossy().into_owned();
                Volume {
                    drive: drive_id(d.mount_point()),
                    volume_name: d.name().to_string_lossy().into_owned(),
                    drive_type: classify_file_system(&file_system, d.is_removable()),
                    file_system,
                }
            })
            .collect())
    }

    fn space(&mut self, drive: &str) -> Result<VolumeSpace> {
        let disk = self
            .disks
            .list_mut()
            .iter_mut()
            .find(|d| drive_id(d.mount_point()) == drive)
            .ok_or_else(|| SourceError::NoSuchVolume(drive.to_string()))?;
        if !disk.refresh() {
            return Err(SourceError::status("volume space", -1));
        }
        Ok(VolumeSpace {
            total: disk.total_space(),
            free: disk.available_space(),
        })
    }
}

// ---------- Memory ----------

pub struct SysinfoMemory {
    sys: System,
}

impl SysinfoMemory {
    pub fn new() -> Self {
        Self {
            sys: System::new_with_specifics(
                RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
            ),
        }
    }
}

impl Default for SysinfoMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource for SysinfoMemory {
    fn memory_status(&mut self) -> Result<MemoryStatus> {
        if !IS_SUPPORTED_SYSTEM {
            return Err(SourceError::unavailable("memory status"));
        }
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(SourceError::status("memory status", 0));
        }
        let available = self.sys.available_memory();
        // virtual = physical + swap, the closest portable match to a commit limit
        Ok(MemoryStatus {
            total_physical: total,
            available_physical: available,
            total_virtual: total.saturating_add(self.sys.total_swap()),
            available_virtual: available.saturating_add(self.sys.free_swap()),
        })
    }
}

// ---------- Network ----------

pub struct SysinfoInterfaces {
    networks: Networks,
}

impl SysinfoInterfaces {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoInterfaces {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceSource for SysinfoInterfaces {
    fn interfaces(&mut self) -> Result<Vec<InterfaceRow>> {
        if !IS_SUPPORTED_SYSTEM {
            return Err(SourceError::unavailable("interface table"));
        }
        self.networks.refresh(true);
        let mut rows: Vec<InterfaceRow> = self
            .networks
            .iter()
            .map(|(name, data)| {
                let addrs = data.ip_networks();
                let loopback = is_loopback_name(name)
                    || (!addrs.is_empty() && addrs.iter().all(|n| n.addr.is_loopback()));
                InterfaceRow {
                    name: name.clone(),
                    description: name.clone(),
                    bytes_received: data.total_received(),
                    bytes_sent: data.total_transmitted(),
                    loopback,
                    operational: !addrs.is_empty(),
                }
            })
            .collect();
        // HashMap order is arbitrary; keep the table stable between ticks
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = rows.len(), "read interface table");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_names() {
        assert!(is_loopback_name("lo"));
        assert!(is_loopback_name("lo0"));
        assert!(is_loopback_name("Loopback Pseudo-Interface 1"));
        assert!(!is_loopback_name("eth0"));
        assert!(!is_loopback_name("wlan0"));
    }

    #[test]
    fn drive_id_keeps_mount_point_on_unix() {
        if !cfg!(windows) {
            assert_eq!(drive_id(Path::new("/")), "/");
            assert_eq!(drive_id(Path::new("/mnt/data")), "/mnt/data");
        } else {
            assert_eq!(drive_id(Path::new("C:\\")), "C:");
        }
    }

    #[test]
    fn closed_query_rejects_calls() {
        let mut q = SysinfoQuery::default();
        q.close();
        assert_eq!(q.collect(), Err(SourceError::NoSuchQuery));
        assert!(q.add_counter(&CounterPath::ProcessorTime(None)).is_err());
    }

    #[test]
    fn total_counter_needs_priming() {
        let mut backend = SysinfoCounters::new();
        let Ok(mut q) = backend.open_query() else {
            return;
        };
        let h = q.add_counter(&CounterPath::ProcessorTime(None)).unwrap();
        assert!(matches!(q.formatted_value(h), Err(SourceError::NoData(_))));
        q.collect().unwrap();
        assert!(matches!(q.formatted_value(h), Err(SourceError::NoData(_))));
        q.collect().unwrap();
        assert!(q.formatted_value(h).is_ok());
    }
}
