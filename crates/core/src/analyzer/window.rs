//! Bounded window of instantaneous throughput samples used for jitter.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub(crate) struct SlidingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SlidingWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest one when full.
    pub(crate) fn push(&mut self, sample: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub(crate) fn last(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.len()
    }

    pub(crate) fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Population standard deviation of the window around its own mean.
    ///
    /// Returns 0 with fewer than two samples.
    pub(crate) fn jitter(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq_diff: f64 = self
            .samples
            .iter()
            .map(|sample| {
                let diff = sample - mean;
                diff * diff
            })
            .sum();
        (sum_sq_diff / self.samples.len() as f64).sqrt()
    }

    #[cfg(test)]
    pub(crate) fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut window = SlidingWindow::new(3);
        for sample in [1.0, 2.0, 3.0, 4.0] {
            window.push(sample);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(window.last(), Some(4.0));
    }

    #[test]
    fn test_jitter_needs_two_samples() {
        let mut window = SlidingWindow::new(10);
        assert_eq!(window.jitter(), 0.0);
        window.push(42.0);
        assert_eq!(window.jitter(), 0.0);
    }

    #[test]
    fn test_jitter_is_population_std_dev() {
        let mut window = SlidingWindow::new(10);
        for sample in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            window.push(sample);
        }
        // Classic example: population std-dev is exactly 2, sample std-dev is not.
        assert!((window.jitter() - 2.0).abs() < 1e-12);
        assert!((window.mean() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_has_no_jitter() {
        let mut window = SlidingWindow::new(100);
        for _ in 0..100 {
            window.push(78.125);
        }
        assert_eq!(window.jitter(), 0.0);
    }
}
