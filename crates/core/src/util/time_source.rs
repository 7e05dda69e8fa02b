use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic clock consumed by the traffic analyzer.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// A simple time source that returns the current time using `Instant::now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantTimeSrc(());

impl InstantTimeSrc {
    pub fn new() -> Self {
        InstantTimeSrc(())
    }
}

impl TimeSource for InstantTimeSrc {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A manually driven clock.
///
/// Clones share the same underlying instant, so a test can hand one clone to
/// the analyzer and keep another to advance time between events.
#[derive(Clone, Debug)]
pub struct SharedMockTimeSource {
    current_instant: Arc<Mutex<Instant>>,
}

impl Default for SharedMockTimeSource {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl SharedMockTimeSource {
    pub fn new(start_instant: Instant) -> Self {
        SharedMockTimeSource {
            current_instant: Arc::new(Mutex::new(start_instant)),
        }
    }

    pub fn advance_time(&self, duration: Duration) {
        *self.current_instant.lock() += duration;
    }
}

impl TimeSource for SharedMockTimeSource {
    fn now(&self) -> Instant {
        *self.current_instant.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_source_is_monotonic() {
        let time_source = InstantTimeSrc::new();
        let first = time_source.now();
        let second = time_source.now();
        assert!(second >= first);
    }

    #[test]
    fn test_mock_clones_share_time() {
        let start = Instant::now();
        let driver = SharedMockTimeSource::new(start);
        let observer = driver.clone();

        driver.advance_time(Duration::from_millis(250));

        assert_eq!(observer.now() - start, Duration::from_millis(250));
        assert_eq!(driver.now(), observer.now());
    }
}
