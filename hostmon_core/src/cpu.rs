//! Aggregate and per-core processor usage.

use tracing::{debug, info, warn};

use crate::error::MonitorError;
use crate::format::clamp_percent;
use crate::monitor::{CounterSet, Monitor};
use crate::reading::Reading;
use crate::source::host::SysinfoCounters;
use crate::source::{CounterBackend, CounterHandle, CounterPath};

pub struct CpuMonitor<B: CounterBackend = SysinfoCounters> {
    backend: B,
    counters: Option<CounterSet<B::Query>>,
    total_handle: Option<CounterHandle>,
    // None where the core's counter failed to register
    core_handles: Vec<Option<CounterHandle>>,
    total_usage: Reading<f64>,
    core_usages: Vec<Reading<f64>>,
    core_count: usize,
    initialized: bool,
}

impl CpuMonitor<SysinfoCounters> {
    pub fn new() -> Self {
        Self::with_backend(SysinfoCounters::new())
    }
}

impl Default for CpuMonitor<SysinfoCounters> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: CounterBackend> CpuMonitor<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            counters: None,
            total_handle: None,
            core_handles: Vec::new(),
            total_usage: Reading::default(),
            core_usages: Vec::new(),
            core_count: 0,
            initialized: false,
        }
    }

    /// Usage across all cores, 0..=100.
    pub fn total_usage(&self) -> f64 {
        self.total_usage.value()
    }

    pub fn total_reading(&self) -> Reading<f64> {
        self.total_usage
    }

    /// Usage of one core, 0..=100; 0 for an index past the last core.
    pub fn core_usage(&self, index: usize) -> f64 {
        self.core_usages.get(index).map_or(0.0, Reading::value)
    }

    pub fn core_reading(&self, index: usize) -> Option<Reading<f64>> {
        self.core_usages.get(index).copied()
    }

    pub fn core_usages(&self) -> Vec<f64> {
        self.core_usages.iter().map(Reading::value).collect()
    }

    pub fn core_count(&self) -> usize {
        self.core_count
    }

    fn mark_all_stale(&mut self) {
        self.total_usage.mark_stale();
        for r in &mut self.core_usages {
            r.mark_stale();
        }
    }
}

impl<B: CounterBackend> Monitor for CpuMonitor<B> {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn initialize(&mut self) -> Result<(), MonitorError> {
        if self.initialized {
            return Ok(());
        }
        let core_count = self.backend.processor_count();

        let mut set = CounterSet::open(&mut self.backend).map_err(MonitorError::QueryOpen)?;
        let total_path = CounterPath::ProcessorTime(None);
        // an early return drops `set`, which closes the query
        let total_handle = set
            .add(&total_path)
            .map_err(|source| MonitorError::CounterRegistration {
                path: total_path.to_string(),
                source,
            })?;

        let core_handles: Vec<Option<CounterHandle>> = (0..core_count)
            .map(|i| match set.add(&CounterPath::ProcessorTime(Some(i))) {
                Ok(h) => Some(h),
                Err(e) => {
                    warn!(core = i, error = %e, "per-core counter unavailable");
                    None
                }
            })
            .collect();

        if let Err(e) = set.collect() {
            warn!(error = %e, "priming cpu sample failed");
        }

        info!(
            cores = core_count,
            registered = core_handles.iter().flatten().count(),
            "cpu monitor initialized"
        );
        self.core_count = core_count;
        self.core_usages = vec![Reading::default(); core_count];
        self.core_handles = core_handles;
        self.total_handle = Some(total_handle);
        self.counters = Some(set);
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self) {
        if !self.initialized {
            return;
        }
        let collected = match self.counters.as_mut() {
            Some(set) => set.collect(),
            None => return,
        };
        if let Err(e) = collected {
            warn!(error = %e, "cpu collection failed; keeping previous values");
            self.mark_all_stale();
            return;
        }
        let Some(set) = self.counters.as_ref() else {
            return;
        };

        if let Some(h) = self.total_handle {
            match set.value(h) {
                Ok(v) => self.total_usage.set(clamp_percent(v)),
                Err(e) => {
                    debug!(error = %e, "total cpu counter unreadable");
                    self.total_usage.mark_stale();
                }
            }
        }
        for (reading, handle) in self.core_usages.iter_mut().zip(&self.core_handles) {
            let Some(h) = handle else { continue };
            match set.value(*h) {
                Ok(v) => reading.set(clamp_percent(v)),
                Err(_) => reading.mark_stale(),
            }
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fake::FakeCounters;

    fn monitor(cores: usize) -> (FakeCounters, CpuMonitor<FakeCounters>) {
        let fake = FakeCounters::new(cores);
        (fake.clone(), CpuMonitor::with_backend(fake))
    }

    #[test]
    fn update_before_initialize_is_noop() {
        let (fake, mut cpu) = monitor(2);
        cpu.update();
        assert_eq!(fake.collections(), 0);
        assert!(!cpu.is_initialized());
    }

    #[test]
    fn out_of_range_core_reads_zero() {
        let (fake, mut cpu) = monitor(2);
        fake.set_value(CounterPath::ProcessorTime(Some(1)), 40.0);
        cpu.initialize().unwrap();
        cpu.update();
        assert_eq!(cpu.core_usage(1), 40.0);
        assert_eq!(cpu.core_usage(2), 0.0);
        assert_eq!(cpu.core_usage(usize::MAX), 0.0);
        assert!(cpu.core_reading(2).is_none());
    }

    #[test]
    fn second_initialize_is_noop() {
        let (fake, mut cpu) = monitor(1);
        cpu.initialize().unwrap();
        cpu.initialize().unwrap();
        let opens = fake.events().iter().filter(|e| *e == "open").count();
        assert_eq!(opens, 1);
    }
}
