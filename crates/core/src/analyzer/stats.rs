//! Per-tick throughput statistics.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// A single byte-count observation. Consumed immediately by the analyzer.
#[derive(Debug, Clone, Copy)]
pub struct ThroughputEvent {
    pub byte_count: u64,
    pub arrival: Instant,
}

/// Throughput statistics returned for every processed event.
///
/// All rates are in kbit/s using a binary kilo (1024).
///
/// # Sentinel Values
///
/// - `min_kbps`: 0 until the warm-up ticks have passed
/// - every field is 0 for the first event of a session, as no rate can be
///   derived from a single observation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    /// Rate over the last debounced interval.
    pub instant_kbps: f64,
    /// Highest instantaneous rate of the session.
    pub max_kbps: f64,
    /// Lowest instantaneous rate after warm-up (0 if not yet tracked).
    pub min_kbps: f64,
    /// Session-wide average rate.
    pub avg_kbps: f64,
    /// Population standard deviation of the recent instantaneous rates.
    pub jitter: f64,
    /// Bytes seen since the session started.
    pub total_bytes: u64,
}
