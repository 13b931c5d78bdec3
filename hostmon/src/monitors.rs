//! The four host monitors, composed and polled together.

use chrono::Utc;
use tracing::{info, warn};

use hostmon_core::{CpuMonitor, DiskMonitor, Monitor, NetworkMonitor, RamMonitor};

use crate::config::MonitorToggles;
use crate::report::{CpuReport, DiskReport, MemoryReport, NetworkReport, Report};

#[derive(Default)]
pub struct Monitors {
    cpu: Option<CpuMonitor>,
    ram: Option<RamMonitor>,
    disk: Option<DiskMonitor>,
    network: Option<NetworkMonitor>,
}

/// Initialize `m` if enabled; a failure is logged and the monitor left out.
fn start_one<M: Monitor>(enabled: bool, mut m: M) -> Option<M> {
    if !enabled {
        return None;
    }
    match m.initialize() {
        Ok(()) => Some(m),
        Err(e) => {
            warn!(monitor = m.name(), error = %e, "monitor unavailable; leaving it out");
            None
        }
    }
}

impl Monitors {
    pub fn start(toggles: &MonitorToggles) -> Self {
        let monitors = Self {
            cpu: start_one(toggles.cpu, CpuMonitor::new()),
            ram: start_one(toggles.ram, RamMonitor::new()),
            disk: start_one(toggles.disk, DiskMonitor::new()),
            network: start_one(toggles.network, NetworkMonitor::new()),
        };
        info!(active = ?monitors.active(), "monitors started");
        monitors
    }

    pub fn active(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if let Some(m) = &self.cpu {
            names.push(m.name());
        }
        if let Some(m) = &self.ram {
            names.push(m.name());
        }
        if let Some(m) = &self.disk {
            names.push(m.name());
        }
        if let Some(m) = &self.network {
            names.push(m.name());
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.active().is_empty()
    }

    pub fn update(&mut self) {
        if let Some(m) = self.cpu.as_mut() {
            m.update();
        }
        if let Some(m) = self.ram.as_mut() {
            m.update();
        }
        if let Some(m) = self.disk.as_mut() {
            m.update();
        }
        if let Some(m) = self.network.as_mut() {
            m.update();
        }
    }

    pub fn report(&self) -> Report {
        let mut report = Report::new(Utc::now());
        report.cpu = self.cpu.as_ref().map(CpuReport::from_monitor);
        report.memory = self.ram.as_ref().map(MemoryReport::from_monitor);
        report.disks = self.disk.as_ref().map(DiskReport::from_monitor);
        report.network = self.network.as_ref().map(NetworkReport::from_monitor);
        report
    }
}
