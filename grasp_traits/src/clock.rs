use std::time::{Duration, Instant};

/// Source of "now" for everything that compares against sample stamps.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Time since `since`, zero if `since` lies in the future.
    fn elapsed_since(&self, since: Instant) -> Duration {
        self.now().saturating_duration_since(since)
    }
}

/// Wall-clock time from `Instant::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
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

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Manually stepped clock. Clones share one timeline, so the copy handed
    /// to a controller moves when the test advances its own.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        base: Instant,
        nanos: Arc<AtomicU64>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                base: Instant::now(),
                nanos: Arc::new(AtomicU64::new(0)),
            }
        }

        pub fn advance(&self, d: Duration) {
            let step = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
            self.nanos.fetch_add(step, Ordering::SeqCst);
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.base + Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
        }
    }

}
