//! Per-session analyzer state.
//!
//! Everything that a reset must clear lives in [`Session`], so a reset is a
//! single assignment and can never leave some fields from the old session
//! next to fields from the new one.

use std::time::Instant;

use super::window::SlidingWindow;

/// Timestamps anchoring the current session. Absent until the first event.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionClock {
    pub(crate) session_start: Instant,
    pub(crate) last_packet_time: Instant,
}

/// Throughput extremes over the whole session.
///
/// `max` only grows and `min` only shrinks; `min` stays unset until the
/// warm-up ticks have passed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct GlobalExtremes {
    pub(crate) max: f64,
    pub(crate) min: Option<f64>,
}

impl GlobalExtremes {
    pub(crate) fn observe_max(&mut self, kbps: f64) {
        if kbps > self.max {
            self.max = kbps;
        }
    }

    pub(crate) fn observe_min(&mut self, kbps: f64) {
        match self.min {
            Some(current) if current <= kbps => {}
            _ => self.min = Some(kbps),
        }
    }

    /// Minimum for reporting: 0 while uninitialized.
    pub(crate) fn min_or_zero(&self) -> f64 {
        self.min.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) clock: Option<SessionClock>,
    /// Bytes seen since the session started.
    pub(crate) total_bytes: u64,
    /// Bytes accumulated since the last computed tick.
    pub(crate) pending_bytes: u64,
    /// Number of computed ticks.
    pub(crate) sample_count: u32,
    pub(crate) extremes: GlobalExtremes,
    pub(crate) window: SlidingWindow,
    pub(crate) last_jitter: f64,
}

impl Session {
    pub(crate) fn new(window_size: usize) -> Self {
        Self {
            clock: None,
            total_bytes: 0,
            pending_bytes: 0,
            sample_count: 0,
            extremes: GlobalExtremes::default(),
            window: SlidingWindow::new(window_size),
            last_jitter: 0.0,
        }
    }

    /// Opens the session with its first event.
    ///
    /// The first event's bytes count towards the total but not towards the
    /// first interval: they arrived at the session start, not during it.
    pub(crate) fn start(&mut self, now: Instant, byte_count: u64) {
        self.clock = Some(SessionClock {
            session_start: now,
            last_packet_time: now,
        });
        self.total_bytes = self.total_bytes.saturating_add(byte_count);
    }

    pub(crate) fn accumulate(&mut self, byte_count: u64) {
        self.total_bytes = self.total_bytes.saturating_add(byte_count);
        self.pending_bytes = self.pending_bytes.saturating_add(byte_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes_tighten_monotonically() {
        let mut extremes = GlobalExtremes::default();
        assert_eq!(extremes.min_or_zero(), 0.0);

        extremes.observe_max(10.0);
        extremes.observe_max(5.0);
        assert_eq!(extremes.max, 10.0);

        extremes.observe_min(7.0);
        extremes.observe_min(9.0);
        assert_eq!(extremes.min, Some(7.0));
        extremes.observe_min(3.0);
        assert_eq!(extremes.min_or_zero(), 3.0);
    }

    #[test]
    fn test_accumulate_saturates() {
        let mut session = Session::new(4);
        session.accumulate(u64::MAX - 1);
        session.accumulate(10);
        assert_eq!(session.total_bytes, u64::MAX);
        assert_eq!(session.pending_bytes, u64::MAX);
    }
}
