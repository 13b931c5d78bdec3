//! Error types for host facility calls and monitor initialization.

use thiserror::Error;

/// Failure of a single host facility call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{facility} is not available on this host")]
    Unavailable { facility: &'static str },

    #[error("{facility} call failed with status {code}")]
    Status { facility: &'static str, code: i32 },

    #[error("no such counter: {0}")]
    NoSuchCounter(String),

    #[error("counter {0} has no data yet")]
    NoData(String),

    #[error("no such volume: {0}")]
    NoSuchVolume(String),

    #[error("query has been closed")]
    NoSuchQuery,
}

impl SourceError {
    pub fn unavailable(facility: &'static str) -> Self {
        Self::Unavailable { facility }
    }

    pub fn status(facility: &'static str, code: i32) -> Self {
        Self::Status { facility, code }
    }
}

/// Why a monitor could not be initialized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("failed to open counter query: {0}")]
    QueryOpen(#[source] SourceError),

    #[error("failed to register counter {path}: {source}")]
    CounterRegistration {
        path: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to read memory status: {0}")]
    MemoryStatus(#[source] SourceError),

    #[error("failed to enumerate volumes: {0}")]
    VolumeEnumeration(#[source] SourceError),

    #[error("no fixed or removable volumes found")]
    NoVolumes,

    #[error("failed to read network interface table: {0}")]
    InterfaceTable(#[source] SourceError),
}

pub type Result<T> = std::result::Result<T, SourceError>;
