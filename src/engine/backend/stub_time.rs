use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::TimeSource;

/// Deterministic time source for desktop runs and tests.
///
/// Each call to `now()` advances by a fixed 10ms so telemetry timestamps stay
/// monotonic and reproducible.
pub struct StubTimeSource {
    start: Instant,
    offset_ms: AtomicU64,
}

impl StubTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }
}

impl Default for StubTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StubTimeSource {
    fn now(&self) -> Instant {
        let ms = self.offset_ms.fetch_add(10, Ordering::SeqCst);
        self.start + Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_time_advances_by_ten_ms() {
        let source = StubTimeSource::new();
        let first = source.now();
        let second = source.now();
        assert_eq!(second.duration_since(first), Duration::from_millis(10));
    }
}
