//! A metric value paired with a staleness flag.

use serde::Serialize;

/// Latest value of a metric and whether the last tick refreshed it.
///
/// A failed read keeps the previous value and flips the flag, so callers can
/// tell "unchanged because nothing changed" from "unchanged because the read
/// failed".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Reading<T> {
    value: T,
    stale: bool,
}

impl<T> Reading<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            stale: false,
        }
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.stale = false;
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T: Copy> Reading<T> {
    pub fn value(&self) -> T {
        self.value
    }
}
