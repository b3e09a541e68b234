//! Tokio driver that pumps [`GameEngine::tick`] at the configured cadence.
//!
//! The task only calls `tick` under the engine mutex, so a scheduled step
//! can never interleave with an action. The driver follows the engine's
//! [`TickHandle`]: a new generation (deploy, restart, resume) realigns the
//! interval so its first step lands one full cadence after the start, and a
//! stopped scheduler leaves the task idle until the next generation. The
//! task outlives terminal phases; only `stop`, drop or a poisoned mutex
//! end it.

use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::engine::GameEngine;
use crate::scheduler::TickHandle;

/// Owned handle to a running ticker. Aborts the task on `stop` or drop.
#[derive(Debug)]
pub struct TickerTask {
    handle: Option<JoinHandle<()>>,
}

impl TickerTask {
    /// Stop pumping. Calling twice is harmless.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TickerTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the ticker on the current tokio runtime.
///
/// Missed ticks are skipped rather than replayed.
#[must_use]
pub fn spawn_ticker(engine: Arc<Mutex<GameEngine>>) -> TickerTask {
    let cadence = match engine.lock() {
        Ok(guard) => guard.config().threat.tick_cadence(),
        Err(poisoned) => poisoned.into_inner().config().threat.tick_cadence(),
    };
    let handle = tokio::spawn(async move {
        let mut ticks = interval(cadence);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut live: Option<TickHandle> = None;
        loop {
            ticks.tick().await;
            let Ok(mut guard) = engine.lock() else {
                log::error!("engine mutex poisoned; ticker exiting");
                break;
            };
            let (active, current) = {
                let scheduler = guard.scheduler();
                let current = live.is_some_and(|known| scheduler.is_current(known));
                (scheduler.handle(), current)
            };
            match active {
                Some(_) if current => {
                    guard.tick();
                }
                Some(fresh) => {
                    log::debug!("ticker following schedule generation {}", fresh.generation());
                    live = Some(fresh);
                    ticks.reset();
                }
                None => live = None,
            }
        }
    });
    TickerTask {
        handle: Some(handle),
    }
}
