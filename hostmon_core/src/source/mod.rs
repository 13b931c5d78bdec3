//! Host facilities the monitors consume.
//!
//! Every call is synchronous and fallible. The `host` module implements
//! them against the running host; `fake` implements them with scriptable
//! state for tests.

pub mod fake;
pub mod host;

use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// Which performance counter to register in a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CounterPath {
    /// Percent processor time; `None` is the aggregate across all cores.
    ProcessorTime(Option<usize>),
    DiskReadBytes(String),
    DiskWriteBytes(String),
}

impl fmt::Display for CounterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterPath::ProcessorTime(None) => write!(f, r"\Processor(_Total)\% Processor Time"),
            CounterPath::ProcessorTime(Some(i)) => write!(f, r"\Processor({i})\% Processor Time"),
            CounterPath::DiskReadBytes(d) => write!(f, r"\LogicalDisk({d})\Disk Read Bytes/sec"),
            CounterPath::DiskWriteBytes(d) => write!(f, r"\LogicalDisk({d})\Disk Write Bytes/sec"),
        }
    }
}

/// Opaque id of a counter registered in one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterHandle(pub(crate) usize);

impl CounterHandle {
    pub fn id(&self) -> usize {
        self.0
    }
}

pub trait CounterBackend {
    type Query: CounterQuery;

    fn open_query(&mut self) -> Result<Self::Query>;

    /// Number of logical processors on the host.
    fn processor_count(&mut self) -> usize;
}

/// An open query context. Values are only meaningful once the query has been
/// collected at least once after the counter was added (priming).
pub trait CounterQuery {
    fn add_counter(&mut self, path: &CounterPath) -> Result<CounterHandle>;
    fn collect(&mut self) -> Result<()>;
    fn formatted_value(&self, handle: CounterHandle) -> Result<f64>;
    fn remove_counter(&mut self, handle: CounterHandle);
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveType {
    Fixed,
    Removable,
    Network,
    Optical,
    Ram,
    Unknown,
}

impl DriveType {
    /// Only local disks are monitored.
    pub fn is_monitored(self) -> bool {
        matches!(self, DriveType::Fixed | DriveType::Removable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Drive letter ("C:") on Windows, mount point elsewhere.
    pub drive: String,
    pub volume_name: String,
    pub file_system: String,
    pub drive_type: DriveType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeSpace {
    pub total: u64,
    pub free: u64,
}

pub trait VolumeSource {
    fn volumes(&mut self) -> Result<Vec<Volume>>;
    fn space(&mut self, drive: &str) -> Result<VolumeSpace>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryStatus {
    pub total_physical: u64,
    pub available_physical: u64,
    pub total_virtual: u64,
    pub available_virtual: u64,
}

pub trait MemorySource {
    fn memory_status(&mut self) -> Result<MemoryStatus>;
}

/// One row of the interface table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRow {
    pub name: String,
    pub description: String,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub loopback: bool,
    pub operational: bool,
}

pub trait InterfaceSource {
    fn interfaces(&mut self) -> Result<Vec<InterfaceRow>>;
}
