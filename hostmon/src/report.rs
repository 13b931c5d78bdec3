//! One tick's worth of readings, rendered as a text line or JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hostmon_core::format::{format_bytes, format_percent, format_speed};
use hostmon_core::source::{CounterBackend, DriveType, InterfaceSource, MemorySource, VolumeSource};
use hostmon_core::{Clock, CpuMonitor, DiskMonitor, NetworkMonitor, RamMonitor};

#[derive(Debug, Clone, Serialize)]
pub struct CpuReport {
    pub total: f64,
    pub cores: Vec<f64>,
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub total_physical: u64,
    pub available_physical: u64,
    pub used_physical: u64,
    pub total_virtual: u64,
    pub used_virtual: u64,
    pub usage_percent: f64,
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskReport {
    pub drive: String,
    pub volume_name: String,
    pub file_system: String,
    pub drive_type: DriveType,
    pub total: u64,
    pub free: u64,
    pub usage_percent: f64,
    pub read_speed: f64,
    pub write_speed: f64,
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceReport {
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub download_speed: f64,
    pub upload_speed: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub download_speed: f64,
    pub upload_speed: f64,
    pub bytes_downloaded: u64,
    pub bytes_uploaded: u64,
    pub interfaces: Vec<InterfaceReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disks: Option<Vec<DiskReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkReport>,
}

impl CpuReport {
    pub fn from_monitor<B: CounterBackend>(m: &CpuMonitor<B>) -> Self {
        let stale = m.total_reading().is_stale();
        Self {
            total: m.total_usage(),
            cores: m.core_usages(),
            stale,
        }
    }
}

impl MemoryReport {
    pub fn from_monitor<S: MemorySource>(m: &RamMonitor<S>) -> Self {
        Self {
            total_physical: m.total_physical_memory(),
            available_physical: m.available_physical_memory(),
            used_physical: m.used_physical_memory(),
            total_virtual: m.total_virtual_memory(),
            used_virtual: m.used_virtual_memory(),
            usage_percent: m.memory_usage_percent(),
            stale: m.is_stale(),
        }
    }
}

impl DiskReport {
    pub fn from_monitor<V: VolumeSource, B: CounterBackend>(m: &DiskMonitor<V, B>) -> Vec<Self> {
        m.disks()
            .iter()
            .map(|d| Self {
                drive: d.drive.clone(),
                volume_name: d.volume_name.clone(),
                file_system: d.file_system.clone(),
                drive_type: d.drive_type,
                total: d.total_space(),
                free: d.free_space(),
                usage_percent: d.usage_percent(),
                read_speed: d.read_speed(),
                write_speed: d.write_speed(),
                stale: d.space_is_stale() || d.speed_is_stale(),
            })
            .collect()
    }
}

impl NetworkReport {
    pub fn from_monitor<S: InterfaceSource, C: Clock>(m: &NetworkMonitor<S, C>) -> Self {
        Self {
            download_speed: m.total_download_speed(),
            upload_speed: m.total_upload_speed(),
            bytes_downloaded: m.total_bytes_downloaded(),
            bytes_uploaded: m.total_bytes_uploaded(),
            interfaces: m
                .interfaces()
                .iter()
                .map(|i| InterfaceReport {
                    name: i.name.clone(),
                    description: i.description.clone(),
                    is_active: i.is_active,
                    bytes_received: i.bytes_received,
                    bytes_sent: i.bytes_sent,
                    download_speed: i.download_speed(),
                    upload_speed: i.upload_speed(),
                })
                .collect(),
        }
    }
}

fn stale_mark(stale: bool) -> &'static str {
    if stale {
        "*"
    } else {
        ""
    }
}

impl Report {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu: None,
            memory: None,
            disks: None,
            network: None,
        }
    }

    /// Single line, segments separated by ` | `. Stale values carry a `*`.
    pub fn render_text(&self, byte_precision: usize, percent_precision: usize) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(c) = &self.cpu {
            parts.push(format!(
                "cpu {}{}",
                format_percent(c.total, percent_precision),
                stale_mark(c.stale)
            ));
        }
        if let Some(m) = &self.memory {
            parts.push(format!(
                "mem {} / {} ({}){}",
                format_bytes(m.used_physical, byte_precision),
                format_bytes(m.total_physical, byte_precision),
                format_percent(m.usage_percent, percent_precision),
                stale_mark(m.stale)
            ));
        }
        for d in self.disks.iter().flatten() {
            parts.push(format!(
                "disk {} {}{} r {} w {}",
                d.drive,
                format_percent(d.usage_percent, percent_precision),
                stale_mark(d.stale),
                format_speed(d.read_speed, byte_precision),
                format_speed(d.write_speed, byte_precision)
            ));
        }
        if let Some(n) = &self.network {
            parts.push(format!(
                "net down {} up {}",
                format_speed(n.download_speed, byte_precision),
                format_speed(n.upload_speed, byte_precision)
            ));
        }
        parts.join(" | ")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
