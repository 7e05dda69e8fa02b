//! Traffic analyzer configuration and constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of instantaneous samples kept for jitter computation.
pub(crate) const DEFAULT_WINDOW_SIZE: usize = 100;

/// Minimum time between two rate computations.
///
/// Events arriving closer together than this are folded into the pending
/// byte counter instead of producing a new (noisy, oversampled) rate sample.
pub(crate) const MIN_CALC_INTERVAL: Duration = Duration::from_millis(100);

/// Ticks ignored before the minimum throughput starts tracking.
pub(crate) const DEFAULT_WARMUP_TICKS: u32 = 5;

/// Binary kilo: throughput figures are reported in kbit/s with 1 kbit = 1024 bit.
pub(crate) const KILO: f64 = 1024.0;

pub(crate) const BITS_PER_BYTE: f64 = 8.0;

/// Configuration for [`TrafficAnalyzer`](super::TrafficAnalyzer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Capacity of the jitter sliding window.
    pub window_size: usize,
    /// Debounce floor between rate computations, in milliseconds.
    pub debounce_ms: u64,
    /// Number of computed ticks ignored before `min_kbps` is tracked.
    pub warmup_ticks: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            debounce_ms: MIN_CALC_INTERVAL.as_millis() as u64,
            warmup_ticks: DEFAULT_WARMUP_TICKS,
        }
    }
}

impl AnalyzerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
