//! Threat meter: clamped level, transient change events, and escalation.
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ThreatConfig;
use crate::constants::{THREAT_MAX, THREAT_MIN};

/// Most recent adjustment, shown briefly by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatChange {
    pub amount: f64,
    pub reason: String,
    #[serde(skip)]
    pub at: Duration,
}

/// Result of one scheduled escalation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Escalation {
    /// Grace window still open; nothing applied.
    Held,
    Raised { amount: f64, level: f64 },
    /// Level is at or above the ceiling.
    Overflow,
}

#[derive(Debug, Clone)]
pub struct ThreatEngine {
    cfg: ThreatConfig,
    level: f64,
    last_change: Option<ThreatChange>,
    grace_until: Option<Duration>,
}

impl ThreatEngine {
    #[must_use]
    pub const fn new(cfg: ThreatConfig) -> Self {
        Self {
            cfg,
            level: THREAT_MIN,
            last_change: None,
            grace_until: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ThreatConfig {
        &self.cfg
    }

    #[must_use]
    pub const fn level(&self) -> f64 {
        self.level
    }

    /// Back to zero with no pending change or grace window.
    pub fn reset(&mut self) {
        self.level = THREAT_MIN;
        self.last_change = None;
        self.grace_until = None;
    }

    /// Overwrite the level, clamped. Does not emit a change event.
    pub fn set_level(&mut self, level: f64) {
        self.level = clamp_threat(level);
    }

    /// Apply a signed delta and record it as the latest change.
    ///
    /// Returns the level after clamping.
    pub fn adjust(&mut self, delta: f64, reason: impl Into<String>, now: Duration) -> f64 {
        self.level = clamp_threat(self.level + delta);
        self.last_change = Some(ThreatChange {
            amount: delta,
            reason: reason.into(),
            at: now,
        });
        self.level
    }

    /// Latest change, if still within its display lifetime.
    #[must_use]
    pub fn last_change(&self, now: Duration) -> Option<&ThreatChange> {
        self.last_change
            .as_ref()
            .filter(|change| now.saturating_sub(change.at) < self.cfg.change_lifetime())
    }

    /// Drop the latest change once its lifetime has passed.
    pub fn expire_change(&mut self, now: Duration) -> bool {
        if self.last_change.is_some() && self.last_change(now).is_none() {
            self.last_change = None;
            return true;
        }
        false
    }

    #[must_use]
    pub fn is_overflowing(&self) -> bool {
        self.level >= THREAT_MAX
    }

    #[must_use]
    pub fn panic_multiplier(&self) -> f64 {
        if self.level > self.cfg.critical_threshold {
            self.cfg.critical_multiplier
        } else if self.level > self.cfg.elevated_threshold {
            self.cfg.elevated_multiplier
        } else {
            1.0
        }
    }

    /// Increase one scheduled step would apply at the current level.
    #[must_use]
    pub fn escalation_step(&self, difficulty: f64) -> f64 {
        self.cfg.base_rate * difficulty * self.panic_multiplier()
    }

    /// Suspend escalation until `now + comms_grace`.
    pub fn begin_grace(&mut self, now: Duration) -> Duration {
        let until = now + self.cfg.comms_grace();
        self.grace_until = Some(until);
        until
    }

    #[must_use]
    pub fn in_grace(&self, now: Duration) -> bool {
        self.grace_until.is_some_and(|until| now < until)
    }

    #[must_use]
    pub const fn grace_until(&self) -> Option<Duration> {
        self.grace_until
    }

    /// One scheduled step: overflow first, then grace, then escalation.
    pub fn tick(&mut self, difficulty: f64, now: Duration) -> Escalation {
        if self.is_overflowing() {
            return Escalation::Overflow;
        }
        if self.in_grace(now) {
            return Escalation::Held;
        }
        let amount = self.escalation_step(difficulty);
        self.level = clamp_threat(self.level + amount);
        if self.is_overflowing() {
            Escalation::Overflow
        } else {
            Escalation::Raised {
                amount,
                level: self.level,
            }
        }
    }
}

#[must_use]
pub fn clamp_threat(level: f64) -> f64 {
    if level.is_nan() {
        return THREAT_MIN;
    }
    level.clamp(THREAT_MIN, THREAT_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ThreatEngine {
        ThreatEngine::new(ThreatConfig::default())
    }

    #[test]
    fn adjustments_clamp_into_range() {
        let mut threat = engine();
        assert!((threat.adjust(-10.0, "relief", Duration::ZERO)).abs() < f64::EPSILON);
        assert!((threat.adjust(150.0, "spike", Duration::ZERO) - 100.0).abs() < f64::EPSILON);
        threat.set_level(f64::NAN);
        assert!(threat.level().abs() < f64::EPSILON);
    }

    #[test]
    fn change_event_expires_after_lifetime() {
        let mut threat = engine();
        threat.adjust(25.0, "Emergency", Duration::from_millis(100));
        assert_eq!(
            threat.last_change(Duration::from_millis(1_000)).map(|c| c.reason.as_str()),
            Some("Emergency")
        );
        assert!(!threat.expire_change(Duration::from_millis(1_599)));
        assert!(threat.last_change(Duration::from_millis(1_600)).is_none());
        assert!(threat.expire_change(Duration::from_millis(1_600)));
    }

    #[test]
    fn panic_bands_scale_escalation() {
        let mut threat = engine();
        assert!((threat.escalation_step(1.0) - 0.04).abs() < 1e-12);
        threat.set_level(50.0);
        assert!((threat.panic_multiplier() - 1.0).abs() < f64::EPSILON);
        threat.set_level(60.0);
        assert!((threat.escalation_step(2.0) - 0.04 * 2.0 * 1.2).abs() < 1e-12);
        threat.set_level(81.0);
        assert!((threat.panic_multiplier() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn grace_window_holds_escalation() {
        let mut threat = engine();
        threat.set_level(40.0);
        threat.begin_grace(Duration::from_secs(1));
        assert_eq!(threat.tick(1.0, Duration::from_millis(5_999)), Escalation::Held);
        assert!((threat.level() - 40.0).abs() < f64::EPSILON);
        assert!(matches!(
            threat.tick(1.0, Duration::from_secs(6)),
            Escalation::Raised { .. }
        ));
    }

    #[test]
    fn overflow_is_reported_before_escalating() {
        let mut threat = engine();
        threat.set_level(100.0);
        assert_eq!(threat.tick(1.0, Duration::ZERO), Escalation::Overflow);
        threat.set_level(99.99);
        assert_eq!(threat.tick(2.2, Duration::ZERO), Escalation::Overflow);
        assert!((threat.level() - 100.0).abs() < f64::EPSILON);
    }
}
