use std::time::{Duration, Instant};

/// Monotonic clock abstraction for cycle pacing.
///
/// Waiting is left to the caller so it can stay cancellable; the clock only
/// measures how long a tick took.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Time elapsed since `epoch`, saturating at zero.
    fn elapsed_since(&self, epoch: Instant) -> Duration {
        self.now().saturating_duration_since(epoch)
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Deterministic test clock whose time can be advanced manually.
    ///
    /// now() = origin + offset
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
            self.origin + off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::TestClock;
    use super::*;

    #[test]
    fn test_clock_advances_without_blocking() {
        let clock = TestClock::new();
        let epoch = clock.now();
        let wall = Instant::now();
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.elapsed_since(epoch), Duration::from_secs(5));
        assert!(wall.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn clones_share_one_timeline() {
        let clock = TestClock::new();
        let other = clock.clone();
        let epoch = clock.now();
        other.advance(Duration::from_millis(40));
        assert_eq!(clock.elapsed_since(epoch), Duration::from_millis(40));
    }

    #[test]
    fn elapsed_saturates_for_future_epoch() {
        let clock = MonotonicClock::new();
        let future = clock.now() + Duration::from_secs(60);
        assert_eq!(clock.elapsed_since(future), Duration::ZERO);
    }
}
