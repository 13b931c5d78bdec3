//! Physical and virtual memory totals.

use tracing::{info, warn};

use crate::error::MonitorError;
use crate::format::usage_percent;
use crate::monitor::Monitor;
use crate::reading::Reading;
use crate::source::host::SysinfoMemory;
use crate::source::{MemorySource, MemoryStatus};

/// Keeps the last successful memory snapshot. Used amounts are derived on
/// read, so they always agree with the totals they came from.
pub struct RamMonitor<S: MemorySource = SysinfoMemory> {
    source: S,
    snapshot: Reading<MemoryStatus>,
    initialized: bool,
}

impl RamMonitor<SysinfoMemory> {
    pub fn new() -> Self {
        Self::with_source(SysinfoMemory::new())
    }
}

impl Default for RamMonitor<SysinfoMemory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MemorySource> RamMonitor<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            snapshot: Reading::default(),
            initialized: false,
        }
    }

    pub fn snapshot(&self) -> MemoryStatus {
        self.snapshot.value()
    }

    /// True when the last `update` could not refresh the snapshot.
    pub fn is_stale(&self) -> bool {
        self.snapshot.is_stale()
    }

    pub fn total_physical_memory(&self) -> u64 {
        self.snapshot.get().total_physical
    }

    pub fn available_physical_memory(&self) -> u64 {
        self.snapshot.get().available_physical
    }

    pub fn used_physical_memory(&self) -> u64 {
        let s = self.snapshot.get();
        s.total_physical.saturating_sub(s.available_physical)
    }

    pub fn total_virtual_memory(&self) -> u64 {
        self.snapshot.get().total_virtual
    }

    pub fn available_virtual_memory(&self) -> u64 {
        self.snapshot.get().available_virtual
    }

    pub fn used_virtual_memory(&self) -> u64 {
        let s = self.snapshot.get();
        s.total_virtual.saturating_sub(s.available_virtual)
    }

    /// Physical memory in use, 0..=100.
    pub fn memory_usage_percent(&self) -> f64 {
        usage_percent(self.used_physical_memory(), self.total_physical_memory())
    }
}

impl<S: MemorySource> Monitor for RamMonitor<S> {
    fn name(&self) -> &'static str {
        "ram"
    }

    fn initialize(&mut self) -> Result<(), MonitorError> {
        if self.initialized {
            return Ok(());
        }
        let status = self
            .source
            .memory_status()
            .map_err(MonitorError::MemoryStatus)?;
        info!(total = status.total_physical, "ram monitor initialized");
        self.snapshot.set(status);
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self) {
        if !self.initialized {
            return;
        }
        match self.source.memory_status() {
            Ok(status) => self.snapshot.set(status),
            Err(e) => {
                warn!(error = %e, "memory status failed; keeping previous snapshot");
                self.snapshot.mark_stale();
            }
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
