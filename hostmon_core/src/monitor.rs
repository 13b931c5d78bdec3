//! The polling contract shared by all monitors, and scoped ownership of
//! counter queries.

use crate::error::{MonitorError, Result};
use crate::source::{CounterBackend, CounterHandle, CounterPath, CounterQuery};

/// A component polled once per tick by a driver.
///
/// `initialize` acquires host resources and takes the baseline sample; it is a
/// no-op once it has succeeded. `update` re-samples and never fails: problems
/// are logged and show up as stale or default values.
pub trait Monitor {
    fn name(&self) -> &'static str;
    fn initialize(&mut self) -> std::result::Result<(), MonitorError>;
    fn update(&mut self);
    fn is_initialized(&self) -> bool;
}

/// An open query plus every counter registered in it. Dropping the set
/// removes the counters, then closes the query.
pub struct CounterSet<Q: CounterQuery> {
    query: Q,
    handles: Vec<CounterHandle>,
}

impl<Q: CounterQuery> CounterSet<Q> {
    pub fn open<B>(backend: &mut B) -> Result<Self>
    where
        B: CounterBackend<Query = Q>,
    {
        Ok(Self {
            query: backend.open_query()?,
            handles: Vec::new(),
        })
    }

    pub fn add(&mut self, path: &CounterPath) -> Result<CounterHandle> {
        let handle = self.query.add_counter(path)?;
        self.handles.push(handle);
        Ok(handle)
    }

    pub fn collect(&mut self) -> Result<()> {
        self.query.collect()
    }

    pub fn value(&self, handle: CounterHandle) -> Result<f64> {
        self.query.formatted_value(handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<Q: CounterQuery> Drop for CounterSet<Q> {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            self.query.remove_counter(handle);
        }
        self.query.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fake::FakeCounters;

    #[test]
    fn drop_removes_counters_before_closing() {
        let mut backend = FakeCounters::new(1);
        {
            let mut set = CounterSet::open(&mut backend).unwrap();
            set.add(&CounterPath::ProcessorTime(None)).unwrap();
            set.add(&CounterPath::ProcessorTime(Some(0))).unwrap();
            assert_eq!(set.len(), 2);
        }
        let events = backend.events();
        assert_eq!(events.first().map(String::as_str), Some("open"));
        assert_eq!(events.last().map(String::as_str), Some("close"));
        let removes: Vec<_> = events.iter().filter(|e| e.starts_with("remove")).collect();
        assert_eq!(removes.len(), 2);
        let close_at = events.iter().position(|e| e == "close").unwrap();
        let last_remove = events.iter().rposition(|e| e.starts_with("remove")).unwrap();
        assert!(last_remove < close_at);
    }

    #[test]
    fn failed_registration_keeps_set_usable() {
        let mut backend = FakeCounters::new(1);
        backend.reject(CounterPath::ProcessorTime(Some(0)));
        let mut set = CounterSet::open(&mut backend).unwrap();
        assert!(set.add(&CounterPath::ProcessorTime(Some(0))).is_err());
        assert!(set.is_empty());
        assert!(set.collect().is_ok());
    }
}
