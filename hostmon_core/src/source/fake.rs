//! Scriptable host facilities for tests.
//!
//! Each fake is a cheap handle onto shared state: keep a clone, hand the other
//! to a monitor, then change what the "host" reports between ticks.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use super::{
    CounterBackend, CounterHandle, CounterPath, CounterQuery, DriveType, InterfaceRow,
    InterfaceSource, MemorySource, MemoryStatus, Volume, VolumeSource, VolumeSpace,
};
use crate::clock::Clock;
use crate::error::{Result, SourceError};

// ---------- Counters ----------

#[derive(Default)]
struct CounterState {
    processors: usize,
    fail_open: bool,
    fail_collect: bool,
    rejected: HashSet<CounterPath>,
    unreadable: HashSet<CounterPath>,
    values: HashMap<CounterPath, f64>,
    collections: u64,
    events: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeCounters {
    state: Rc<RefCell<CounterState>>,
}

impl FakeCounters {
    pub fn new(processors: usize) -> Self {
        let fake = Self::default();
        fake.state.borrow_mut().processors = processors;
        fake
    }

    pub fn fail_open(&self, fail: bool) {
        self.state.borrow_mut().fail_open = fail;
    }

    pub fn fail_collect(&self, fail: bool) {
        self.state.borrow_mut().fail_collect = fail;
    }

    /// `add_counter` fails for this path.
    pub fn reject(&self, path: CounterPath) {
        self.state.borrow_mut().rejected.insert(path);
    }

    /// `formatted_value` fails for this path while set.
    pub fn set_unreadable(&self, path: CounterPath, unreadable: bool) {
        let mut st = self.state.borrow_mut();
        if unreadable {
            st.unreadable.insert(path);
        } else {
            st.unreadable.remove(&path);
        }
    }

    pub fn set_value(&self, path: CounterPath, value: f64) {
        self.state.borrow_mut().values.insert(path, value);
    }

    pub fn collections(&self) -> u64 {
        self.state.borrow().collections
    }

    /// Open/add/remove/close calls in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.state.borrow().events.clone()
    }
}

impl CounterBackend for FakeCounters {
    type Query = FakeQuery;

    fn open_query(&mut self) -> Result<FakeQuery> {
        let mut st = self.state.borrow_mut();
        if st.fail_open {
            return Err(SourceError::status("counter query", 5));
        }
        st.events.push("open".into());
        Ok(FakeQuery {
            state: Rc::clone(&self.state),
            handles: Vec::new(),
            closed: false,
        })
    }

    fn processor_count(&mut self) -> usize {
        self.state.borrow().processors
    }
}

pub struct FakeQuery {
    state: Rc<RefCell<CounterState>>,
    handles: Vec<Option<CounterPath>>,
    closed: bool,
}

impl CounterQuery for FakeQuery {
    fn add_counter(&mut self, path: &CounterPath) -> Result<CounterHandle> {
        if self.closed {
            return Err(SourceError::NoSuchQuery);
        }
        let mut st = self.state.borrow_mut();
        if st.rejected.contains(path) {
            return Err(SourceError::NoSuchCounter(path.to_string()));
        }
        st.events.push(format!("add {path}"));
        self.handles.push(Some(path.clone()));
        Ok(CounterHandle(self.handles.len() - 1))
    }

    fn collect(&mut self) -> Result<()> {
        if self.closed {
            return Err(SourceError::NoSuchQuery);
        }
        let mut st = self.state.borrow_mut();
        if st.fail_collect {
            return Err(SourceError::status("collect", 6));
        }
        st.collections += 1;
        Ok(())
    }

    fn formatted_value(&self, handle: CounterHandle) -> Result<f64> {
        let path = self
            .handles
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| SourceError::NoSuchCounter(format!("handle {}", handle.0)))?;
        let st = self.state.borrow();
        if st.collections == 0 || st.unreadable.contains(path) {
            return Err(SourceError::NoData(path.to_string()));
        }
        Ok(st.values.get(path).copied().unwrap_or(0.0))
    }

    fn remove_counter(&mut self, handle: CounterHandle) {
        if let Some(path) = self.handles.get_mut(handle.0).and_then(Option::take) {
            self.state.borrow_mut().events.push(format!("remove {path}"));
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.borrow_mut().events.push("close".into());
        }
    }
}

// ---------- Volumes ----------

#[derive(Default)]
struct VolumeState {
    volumes: Vec<Volume>,
    space: HashMap<String, VolumeSpace>,
    failing: HashSet<String>,
    fail_enumeration: bool,
}

#[derive(Clone, Default)]
pub struct FakeVolumes {
    state: Rc<RefCell<VolumeState>>,
}

impl FakeVolumes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_volume(&self, drive: &str, file_system: &str, drive_type: DriveType, space: VolumeSpace) {
        let mut st = self.state.borrow_mut();
        st.volumes.push(Volume {
            drive: drive.to_string(),
            volume_name: format!("Volume {drive}"),
            file_system: file_system.to_string(),
            drive_type,
        });
        st.space.insert(drive.to_string(), space);
    }

    pub fn set_space(&self, drive: &str, space: VolumeSpace) {
        self.state.borrow_mut().space.insert(drive.to_string(), space);
    }

    pub fn fail_space(&self, drive: &str, fail: bool) {
        let mut st = self.state.borrow_mut();
        if fail {
            st.failing.insert(drive.to_string());
        } else {
            st.failing.remove(drive);
        }
    }

    pub fn fail_enumeration(&self, fail: bool) {
        self.state.borrow_mut().fail_enumeration = fail;
    }
}

impl VolumeSource for FakeVolumes {
    fn volumes(&mut self) -> Result<Vec<Volume>> {
        let st = self.state.borrow();
        if st.fail_enumeration {
            return Err(SourceError::status("volume enumeration", 21));
        }
        Ok(st.volumes.clone())
    }

    fn space(&mut self, drive: &str) -> Result<VolumeSpace> {
        let st = self.state.borrow();
        if st.failing.contains(drive) {
            return Err(SourceError::status("volume space", 21));
        }
        st.space
            .get(drive)
            .copied()
            .ok_or_else(|| SourceError::NoSuchVolume(drive.to_string()))
    }
}

// ---------- Memory ----------

#[derive(Clone, Default)]
pub struct FakeMemory {
    status: Rc<RefCell<Option<MemoryStatus>>>,
    calls: Rc<Cell<u64>>,
}

impl FakeMemory {
    pub fn new(status: MemoryStatus) -> Self {
        let fake = Self::default();
        fake.set(status);
        fake
    }

    pub fn set(&self, status: MemoryStatus) {
        *self.status.borrow_mut() = Some(status);
    }

    /// Make every following call fail until `set` is called again.
    pub fn fail(&self) {
        *self.status.borrow_mut() = None;
    }

    pub fn calls(&self) -> u64 {
        self.calls.get()
    }
}

impl MemorySource for FakeMemory {
    fn memory_status(&mut self) -> Result<MemoryStatus> {
        self.calls.set(self.calls.get() + 1);
        let status = *self.status.borrow();
        status.ok_or_else(|| SourceError::status("memory status", 8))
    }
}

// ---------- Network ----------

/// Shorthand for an operational, non-loopback row.
pub fn iface(name: &str, bytes_received: u64, bytes_sent: u64) -> InterfaceRow {
    InterfaceRow {
        name: name.to_string(),
        description: format!("{name} adapter"),
        bytes_received,
        bytes_sent,
        loopback: false,
        operational: true,
    }
}

#[derive(Default)]
struct InterfaceState {
    rows: Vec<InterfaceRow>,
    fail: bool,
}

#[derive(Clone, Default)]
pub struct FakeInterfaces {
    state: Rc<RefCell<InterfaceState>>,
}

impl FakeInterfaces {
    pub fn new(rows: Vec<InterfaceRow>) -> Self {
        let fake = Self::default();
        fake.set_rows(rows);
        fake
    }

    pub fn set_rows(&self, rows: Vec<InterfaceRow>) {
        self.state.borrow_mut().rows = rows;
    }

    pub fn push(&self, row: InterfaceRow) {
        self.state.borrow_mut().rows.push(row);
    }

    /// Set the cumulative counters of an existing row.
    pub fn set_counters(&self, name: &str, bytes_received: u64, bytes_sent: u64) {
        let mut st = self.state.borrow_mut();
        if let Some(row) = st.rows.iter_mut().find(|r| r.name == name) {
            row.bytes_received = bytes_received;
            row.bytes_sent = bytes_sent;
        }
    }

    pub fn fail(&self, fail: bool) {
        self.state.borrow_mut().fail = fail;
    }
}

impl InterfaceSource for FakeInterfaces {
    fn interfaces(&mut self) -> Result<Vec<InterfaceRow>> {
        let st = self.state.borrow();
        if st.fail {
            return Err(SourceError::status("interface table", 50));
        }
        Ok(st.rows.clone())
    }
}

// ---------- Clock ----------

#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
