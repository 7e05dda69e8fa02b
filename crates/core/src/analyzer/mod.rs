//! Windowed, time-debounced throughput statistics.
//!
//! The analyzer turns an irregular stream of byte counts into a stable
//! per-tick [`StatisticsSnapshot`]:
//!
//! - **Debounce**: events closer than the debounce floor (100 ms) to the last
//!   computed tick only accumulate bytes. The returned snapshot repeats the
//!   last instantaneous rate and jitter while `total_bytes` and `avg_kbps`
//!   keep advancing.
//! - **Extremes**: `max_kbps` grows on every tick, `min_kbps` only shrinks and
//!   is tracked once the warm-up ticks have passed.
//! - **Jitter**: population standard deviation over the last 100 ticks.
//!
//! An analyzer is single-writer (`&mut self`). Share it behind a lock when
//! several producers feed the same session.

mod config;
mod state;
mod stats;
mod window;


use std::time::Duration;

pub use config::AnalyzerConfig;
pub use stats::{StatisticsSnapshot, ThroughputEvent};

use crate::util::{InstantTimeSrc, TimeSource};
use config::{BITS_PER_BYTE, KILO};
use state::Session;

/// Converts a byte count observed over `elapsed` to kbit/s (kilo = 1024).
///
/// Returns 0 for a zero interval.
pub(crate) fn kbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 * BITS_PER_BYTE / KILO) / secs
    } else {
        0.0
    }
}

/// Throughput statistics engine for one event stream.
pub struct TrafficAnalyzer<T: TimeSource = InstantTimeSrc> {
    config: AnalyzerConfig,
    time_source: T,
    session: Session,
}

impl TrafficAnalyzer<InstantTimeSrc> {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_time_source(config, InstantTimeSrc::new())
    }
}

impl Default for TrafficAnalyzer<InstantTimeSrc> {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl<T: TimeSource> TrafficAnalyzer<T> {
    pub fn with_time_source(config: AnalyzerConfig, time_source: T) -> Self {
        let session = Session::new(config.window_size);
        Self {
            config,
            time_source,
            session,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Bytes seen since the session started.
    pub fn total_bytes(&self) -> u64 {
        self.session.total_bytes
    }

    /// Number of computed (non-debounced) ticks in this session.
    pub fn sample_count(&self) -> u32 {
        self.session.sample_count
    }

    /// Records `byte_length` bytes arriving now.
    pub fn process(&mut self, byte_length: u64) -> StatisticsSnapshot {
        let event = ThroughputEvent {
            byte_count: byte_length,
            arrival: self.time_source.now(),
        };
        self.process_event(event)
    }

    /// Records an event with an explicit arrival time.
    ///
    /// Arrival times earlier than the last computed tick are treated as a
    /// zero interval and therefore debounced.
    pub fn process_event(&mut self, event: ThroughputEvent) -> StatisticsSnapshot {
        let now = event.arrival;
        let session = &mut self.session;

        let Some(mut clock) = session.clock else {
            session.start(now, event.byte_count);
            tracing::debug!(bytes = event.byte_count, "Traffic session started");
            return StatisticsSnapshot::default();
        };
        session.accumulate(event.byte_count);

        let elapsed = now.saturating_duration_since(clock.last_packet_time);
        let session_elapsed = now.saturating_duration_since(clock.session_start);
        let avg_kbps = kbps(session.total_bytes, session_elapsed);

        if elapsed < self.config.debounce() {
            return StatisticsSnapshot {
                instant_kbps: session.window.last().unwrap_or(0.0),
                max_kbps: session.extremes.max,
                min_kbps: session.extremes.min_or_zero(),
                avg_kbps,
                jitter: session.last_jitter,
                total_bytes: session.total_bytes,
            };
        }

        let instant_kbps = kbps(session.pending_bytes, elapsed);

        session.extremes.observe_max(instant_kbps);
        session.sample_count = session.sample_count.saturating_add(1);
        if session.sample_count > self.config.warmup_ticks {
            session.extremes.observe_min(instant_kbps);
        }

        session.window.push(instant_kbps);
        let jitter = session.window.jitter();
        session.last_jitter = jitter;

        session.pending_bytes = 0;
        clock.last_packet_time = now;
        session.clock = Some(clock);

        tracing::trace!(
            instant_kbps,
            avg_kbps,
            jitter,
            total_bytes = session.total_bytes,
            tick = session.sample_count,
            "Throughput tick"
        );

        StatisticsSnapshot {
            instant_kbps,
            max_kbps: session.extremes.max,
            min_kbps: session.extremes.min_or_zero(),
            avg_kbps,
            jitter,
            total_bytes: session.total_bytes,
        }
    }

    /// Clears the whole session: window, totals, extremes, counters and
    /// timestamps. The next event starts a fresh session.
    pub fn reset(&mut self) {
        self.session = Session::new(self.config.window_size);
        tracing::info!("Traffic analyzer state reset");
    }
}
