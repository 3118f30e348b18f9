//! Bounded rolling history used to steady chart axes between refreshes
//!
//! Every refresh rebuilds each chart from scratch, so an axis fitted to the
//! current data jumps around whenever a spike enters or leaves the window.
//! [`RollingMax`] remembers the maxima of the last few refreshes and the chart
//! layer sizes its y-axis to the largest of them.

use std::collections::VecDeque;

/// Number of refreshes remembered by default
pub const DEFAULT_ROLLING_CAPACITY: usize = 10;

/// Fixed-capacity ring buffer of observed maxima
#[derive(Debug, Clone)]
pub struct RollingMax {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Default for RollingMax {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLING_CAPACITY)
    }
}

impl RollingMax {
    /// Create an empty buffer holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `value` and return the maximum over the retained entries
    ///
    /// Non-finite values are ignored so a single bad sample cannot pin the
    /// axis; the current maximum is returned unchanged in that case.
    pub fn push_and_max(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            if self.values.len() >= self.capacity {
                self.values.pop_front();
            }
            self.values.push_back(value);
        }
        self.max().unwrap_or(0.0)
    }

    /// Largest retained value, `None` when empty
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
