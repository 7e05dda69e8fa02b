//! Bounded FIFO of recent throughput samples.
//!
//! Producers push the latest rate, the renderer takes a copy of the whole
//! history once per frame. Both sides go through the same mutex, held only
//! for the push/evict or for the copy itself, so the renderer never blocks a
//! producer for longer than a 15-element copy and never sees a half-applied
//! push.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Number of samples visible on screen.
pub const DEFAULT_HISTORY_CAPACITY: usize = 15;

#[derive(Debug)]
pub struct ChartSampleBuffer {
    samples: Mutex<VecDeque<f64>>,
    capacity: usize,
}

impl Default for ChartSampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ChartSampleBuffer {
    /// Creates an empty buffer holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
        }
    }

    /// Fixed history size. The renderer spaces points by this, not by `len`.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a sample, evicting from the front on overflow.
    pub fn push(&self, value: f64) {
        let mut samples = self.samples.lock();
        samples.push_back(value);
        while samples.len() > self.capacity {
            samples.pop_front();
        }
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    /// Independent copy of the current history, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        let samples = self.samples.lock();
        samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}
