//! Single-owner handle for the escalation schedule.
//!
//! The engine never owns a raw timer. It owns a [`TickScheduler`] whose
//! live [`TickHandle`] authorises scheduled steps; whatever pumps the
//! engine (the tokio driver, a test loop, a UI frame callback) only calls
//! `tick`, and a tick without a live handle is inert.

use serde::{Deserialize, Serialize};

/// Generation token identifying one run of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickHandle(u64);

impl TickHandle {
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct TickScheduler {
    active: Option<TickHandle>,
    generations: u64,
    fired: u64,
}

impl TickScheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: None,
            generations: 0,
            fired: 0,
        }
    }

    /// Start a fresh schedule, cancelling any prior handle first.
    pub fn start(&mut self) -> TickHandle {
        self.stop();
        self.generations = self.generations.saturating_add(1);
        let handle = TickHandle(self.generations);
        self.active = Some(handle);
        log::trace!("scheduler started (generation {})", handle.0);
        handle
    }

    /// Cancel the live handle. Stopping twice is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.active.take() {
            log::trace!("scheduler stopped (generation {})", handle.0);
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub const fn handle(&self) -> Option<TickHandle> {
        self.active
    }

    /// True when `handle` is the live generation; stale handles are inert.
    #[must_use]
    pub fn is_current(&self, handle: TickHandle) -> bool {
        self.active == Some(handle)
    }

    pub(crate) fn record_fire(&mut self) {
        self.fired = self.fired.saturating_add(1);
    }

    /// Scheduled steps that actually applied escalation.
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_replaces_previous_handle() {
        let mut scheduler = TickScheduler::new();
        let first = scheduler.start();
        let second = scheduler.start();
        assert_ne!(first, second);
        assert!(!scheduler.is_current(first));
        assert!(scheduler.is_current(second));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut scheduler = TickScheduler::new();
        scheduler.stop();
        let handle = scheduler.start();
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());
        assert!(!scheduler.is_current(handle));
        assert_eq!(scheduler.handle(), None);
    }
}
