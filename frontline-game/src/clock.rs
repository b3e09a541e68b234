//! Time sources for grace windows and transient change events.
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::numbers::millis_u64;

/// Monotonic time since an arbitrary per-clock origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall-clock time backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock shared between a test and the engine it drives.
#[derive(Clone, Default)]
pub struct ManualClock {
    elapsed_ms: Arc<AtomicU64>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed_ms
            .fetch_add(millis_u64(by.as_millis()), Ordering::SeqCst);
    }

    pub fn set(&self, at: Duration) {
        self.elapsed_ms
            .store(millis_u64(at.as_millis()), Ordering::SeqCst);
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("elapsed", &self.now())
            .finish()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let engine_view = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(engine_view.now(), Duration::from_millis(250));
        clock.set(Duration::from_secs(2));
        assert_eq!(engine_view.now(), Duration::from_secs(2));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
