//! hostmon_core: CPU, memory, disk and network monitors polled once per tick.
//!
//! Each monitor owns its host facility, is initialized once and then updated
//! by an external driver. Nothing here spawns threads or blocks on I/O beyond
//! a single bounded host call.

pub mod clock;
pub mod cpu;
pub mod disk;
pub mod error;
pub mod format;
pub mod memory;
pub mod monitor;
pub mod network;
pub mod reading;
pub mod source;

pub use clock::{Clock, MonotonicClock};
pub use cpu::CpuMonitor;
pub use disk::{DiskInfo, DiskMonitor};
pub use error::{MonitorError, SourceError};
pub use memory::RamMonitor;
pub use monitor::Monitor;
pub use network::{NetworkInterfaceInfo, NetworkMonitor};
pub use reading::Reading;
pub use source::fake;
