//! Interface byte counters and the throughput derived from them.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::error::MonitorError;
use crate::monitor::Monitor;
use crate::reading::Reading;
use crate::source::host::SysinfoInterfaces;
use crate::source::{InterfaceRow, InterfaceSource};

/// Bytes/sec between two cumulative samples. A counter that went backwards
/// (reset or wrap) yields 0, as does a non-positive interval.
pub fn counter_rate(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 || !elapsed_secs.is_finite() {
        return 0.0;
    }
    current.saturating_sub(previous) as f64 / elapsed_secs
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkInterfaceInfo {
    pub name: String,
    pub description: String,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub is_active: bool,
    download_speed: Reading<f64>,
    upload_speed: Reading<f64>,
}

impl NetworkInterfaceInfo {
    fn from_row(row: InterfaceRow) -> Self {
        Self {
            name: row.name,
            description: row.description,
            bytes_received: row.bytes_received,
            bytes_sent: row.bytes_sent,
            is_active: row.operational,
            download_speed: Reading::default(),
            upload_speed: Reading::default(),
        }
    }

    /// Bytes received per second over the last tick.
    pub fn download_speed(&self) -> f64 {
        self.download_speed.value()
    }

    /// Bytes sent per second over the last tick.
    pub fn upload_speed(&self) -> f64 {
        self.upload_speed.value()
    }

    pub fn rates_are_stale(&self) -> bool {
        self.download_speed.is_stale() || self.upload_speed.is_stale()
    }
}

#[derive(Debug, Clone, Copy)]
struct PreviousSample {
    bytes_received: u64,
    bytes_sent: u64,
}

/// Stable identity per interface: the name, suffixed when a table repeats it.
fn identity_keys(interfaces: &[NetworkInterfaceInfo]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    interfaces
        .iter()
        .map(|i| {
            let n = seen.entry(i.name.as_str()).or_insert(0);
            *n += 1;
            if *n == 1 {
                i.name.clone()
            } else {
                format!("{}#{}", i.name, n)
            }
        })
        .collect()
}

pub struct NetworkMonitor<S: InterfaceSource = SysinfoInterfaces, C: Clock = MonotonicClock> {
    source: S,
    clock: C,
    interfaces: Vec<NetworkInterfaceInfo>,
    // keyed by identity, not table position
    previous: HashMap<String, PreviousSample>,
    last_update: Duration,
    initialized: bool,
}

impl NetworkMonitor<SysinfoInterfaces, MonotonicClock> {
    pub fn new() -> Self {
        Self::with_source(SysinfoInterfaces::new(), MonotonicClock::new())
    }
}

impl Default for NetworkMonitor<SysinfoInterfaces, MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: InterfaceSource, C: Clock> NetworkMonitor<S, C> {
    pub fn with_source(source: S, clock: C) -> Self {
        Self {
            source,
            clock,
            interfaces: Vec::new(),
            previous: HashMap::new(),
            last_update: Duration::ZERO,
            initialized: false,
        }
    }

    pub fn interfaces(&self) -> &[NetworkInterfaceInfo] {
        &self.interfaces
    }

    /// Sum of download rates over active interfaces.
    pub fn total_download_speed(&self) -> f64 {
        self.interfaces
            .iter()
            .filter(|i| i.is_active)
            .map(NetworkInterfaceInfo::download_speed)
            .sum()
    }

    /// Sum of upload rates over active interfaces.
    pub fn total_upload_speed(&self) -> f64 {
        self.interfaces
            .iter()
            .filter(|i| i.is_active)
            .map(NetworkInterfaceInfo::upload_speed)
            .sum()
    }

    /// Cumulative bytes received across every interface, active or not.
    pub fn total_bytes_downloaded(&self) -> u64 {
        self.interfaces
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.bytes_received))
    }

    pub fn total_bytes_uploaded(&self) -> u64 {
        self.interfaces
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.bytes_sent))
    }

    fn read_table(&mut self) -> crate::error::Result<Vec<NetworkInterfaceInfo>> {
        Ok(self
            .source
            .interfaces()?
            .into_iter()
            .filter(|r| !r.loopback)
            .map(NetworkInterfaceInfo::from_row)
            .collect())
    }

    fn reset_baseline(&mut self, current: Vec<NetworkInterfaceInfo>, keys: &[String], now: Duration) {
        self.previous = keys
            .iter()
            .cloned()
            .zip(current.iter().map(|i| PreviousSample {
                bytes_received: i.bytes_received,
                bytes_sent: i.bytes_sent,
            }))
            .collect();
        self.last_update = now;
        self.interfaces = current;
    }

    fn same_members(&self, keys: &[String]) -> bool {
        keys.len() == self.previous.len() && keys.iter().all(|k| self.previous.contains_key(k))
    }
}

impl<S: InterfaceSource, C: Clock> Monitor for NetworkMonitor<S, C> {
    fn name(&self) -> &'static str {
        "network"
    }

    fn initialize(&mut self) -> Result<(), MonitorError> {
        if self.initialized {
            return Ok(());
        }
        let current = self.read_table().map_err(MonitorError::InterfaceTable)?;
        let keys = identity_keys(&current);
        let now = self.clock.now();
        info!(interfaces = current.len(), "network monitor initialized");
        self.reset_baseline(current, &keys, now);
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self) {
        if !self.initialized {
            return;
        }
        let mut current = match self.read_table() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "interface table unavailable; keeping previous values");
                for i in &mut self.interfaces {
                    i.download_speed.mark_stale();
                    i.upload_speed.mark_stale();
                }
                return;
            }
        };
        let keys = identity_keys(&current);
        let now = self.clock.now();

        if !self.same_members(&keys) {
            debug!(
                before = self.previous.len(),
                after = keys.len(),
                "interface set changed; resetting baseline"
            );
            self.reset_baseline(current, &keys, now);
            return;
        }

        let elapsed = now.checked_sub(self.last_update).unwrap_or_default().as_secs_f64();
        if elapsed <= 0.0 {
            debug!("no time elapsed since last tick; keeping previous rates");
            let old_keys = identity_keys(&self.interfaces);
            let old: HashMap<&str, &NetworkInterfaceInfo> = old_keys
                .iter()
                .map(String::as_str)
                .zip(self.interfaces.iter())
                .collect();
            for (iface, key) in current.iter_mut().zip(&keys) {
                if let Some(prev) = old.get(key.as_str()) {
                    iface.download_speed = prev.download_speed;
                    iface.upload_speed = prev.upload_speed;
                }
            }
            self.interfaces = current;
            return;
        }

        for (iface, key) in current.iter_mut().zip(&keys) {
            let Some(prev) = self.previous.get_mut(key) else {
                continue;
            };
            iface
                .download_speed
                .set(counter_rate(iface.bytes_received, prev.bytes_received, elapsed));
            iface
                .upload_speed
                .set(counter_rate(iface.bytes_sent, prev.bytes_sent, elapsed));
            prev.bytes_received = iface.bytes_received;
            prev.bytes_sent = iface.bytes_sent;
        }
        self.last_update = now;
        self.interfaces = current;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
