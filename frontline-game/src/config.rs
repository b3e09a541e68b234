//! Engine tuning configuration.
//!
//! Every field defaults to the balance values in [`crate::constants`], so a
//! partial JSON override only needs to name what it changes.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants;

/// Errors raised when tuning values violate engine invariants.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("engine config JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("panic bands out of order: elevated {elevated:.1} >= critical {critical:.1}")]
    PanicBands { elevated: f64, critical: f64 },
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

fn check_min(field: &'static str, value: u64, min: u64) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::MinViolation { field, min, value })
    }
}

/// Continuous escalation and threat-event timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatConfig {
    #[serde(default = "ThreatConfig::default_tick_cadence_ms")]
    pub tick_cadence_ms: u64,
    #[serde(default = "ThreatConfig::default_base_rate")]
    pub base_rate: f64,
    #[serde(default = "ThreatConfig::default_elevated_threshold")]
    pub elevated_threshold: f64,
    #[serde(default = "ThreatConfig::default_critical_threshold")]
    pub critical_threshold: f64,
    #[serde(default = "ThreatConfig::default_elevated_multiplier")]
    pub elevated_multiplier: f64,
    #[serde(default = "ThreatConfig::default_critical_multiplier")]
    pub critical_multiplier: f64,
    #[serde(default = "ThreatConfig::default_comms_grace_ms")]
    pub comms_grace_ms: u64,
    #[serde(default = "ThreatConfig::default_change_lifetime_ms")]
    pub change_lifetime_ms: u64,
}

impl ThreatConfig {
    const fn default_tick_cadence_ms() -> u64 {
        constants::TICK_CADENCE_MS
    }

    const fn default_base_rate() -> f64 {
        constants::BASE_THREAT_RATE
    }

    const fn default_elevated_threshold() -> f64 {
        constants::PANIC_ELEVATED_THRESHOLD
    }

    const fn default_critical_threshold() -> f64 {
        constants::PANIC_CRITICAL_THRESHOLD
    }

    const fn default_elevated_multiplier() -> f64 {
        constants::PANIC_ELEVATED_MULTIPLIER
    }

    const fn default_critical_multiplier() -> f64 {
        constants::PANIC_CRITICAL_MULTIPLIER
    }

    const fn default_comms_grace_ms() -> u64 {
        constants::COMMS_GRACE_MS
    }

    const fn default_change_lifetime_ms() -> u64 {
        constants::THREAT_CHANGE_LIFETIME_MS
    }

    #[must_use]
    pub const fn tick_cadence(&self) -> Duration {
        Duration::from_millis(self.tick_cadence_ms)
    }

    #[must_use]
    pub const fn comms_grace(&self) -> Duration {
        Duration::from_millis(self.comms_grace_ms)
    }

    #[must_use]
    pub const fn change_lifetime(&self) -> Duration {
        Duration::from_millis(self.change_lifetime_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_min("threat.tick_cadence_ms", self.tick_cadence_ms, 1)?;
        check_range("threat.base_rate", self.base_rate, 0.0, 10.0)?;
        check_range(
            "threat.elevated_threshold",
            self.elevated_threshold,
            constants::THREAT_MIN,
            constants::THREAT_MAX,
        )?;
        check_range(
            "threat.critical_threshold",
            self.critical_threshold,
            constants::THREAT_MIN,
            constants::THREAT_MAX,
        )?;
        if self.elevated_threshold >= self.critical_threshold {
            return Err(ConfigError::PanicBands {
                elevated: self.elevated_threshold,
                critical: self.critical_threshold,
            });
        }
        check_range("threat.elevated_multiplier", self.elevated_multiplier, 1.0, 5.0)?;
        check_range("threat.critical_multiplier", self.critical_multiplier, 1.0, 5.0)?;
        Ok(())
    }
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            tick_cadence_ms: Self::default_tick_cadence_ms(),
            base_rate: Self::default_base_rate(),
            elevated_threshold: Self::default_elevated_threshold(),
            critical_threshold: Self::default_critical_threshold(),
            elevated_multiplier: Self::default_elevated_multiplier(),
            critical_multiplier: Self::default_critical_multiplier(),
            comms_grace_ms: Self::default_comms_grace_ms(),
            change_lifetime_ms: Self::default_change_lifetime_ms(),
        }
    }
}

/// Rewards and penalties applied by player actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub starting_supplies: u32,
    pub kill_supplies: u32,
    pub supply_drop_bonus: u32,
    pub route_cut_supplies: u32,
    pub recycle_cost: u32,
    pub emergency_supplies: u32,
    pub kill_infantry_relief: f64,
    pub kill_armored_relief: f64,
    pub comms_tower_relief: f64,
    pub sabotage_relief: f64,
    pub ghost_clear_relief: f64,
    pub route_cut_relief: f64,
    pub fail_penalty: f64,
    pub fail_penalty_forgiving: f64,
    pub forgiving_below_difficulty: f64,
    pub recycle_penalty_floor: i64,
    pub recycle_penalty_scale: f64,
    pub emergency_penalty: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_supplies: constants::STARTING_SUPPLIES,
            kill_supplies: constants::KILL_SUPPLY_REWARD,
            supply_drop_bonus: constants::SUPPLY_DROP_REWARD,
            route_cut_supplies: constants::ROUTE_CUT_SUPPLY_REWARD,
            recycle_cost: constants::RECYCLE_COST,
            emergency_supplies: constants::EMERGENCY_SUPPLIES,
            kill_infantry_relief: constants::KILL_INFANTRY_RELIEF,
            kill_armored_relief: constants::KILL_ARMORED_RELIEF,
            comms_tower_relief: constants::COMMS_TOWER_RELIEF,
            sabotage_relief: constants::SABOTAGE_RELIEF,
            ghost_clear_relief: constants::GHOST_CLEAR_RELIEF,
            route_cut_relief: constants::ROUTE_CUT_RELIEF,
            fail_penalty: constants::FAIL_PENALTY,
            fail_penalty_forgiving: constants::FAIL_PENALTY_FORGIVING,
            forgiving_below_difficulty: constants::FORGIVING_DIFFICULTY,
            recycle_penalty_floor: constants::RECYCLE_PENALTY_FLOOR,
            recycle_penalty_scale: constants::RECYCLE_PENALTY_SCALE,
            emergency_penalty: constants::EMERGENCY_PENALTY,
        }
    }
}

impl EconomyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let span = constants::THREAT_MAX;
        for (field, value) in [
            ("economy.kill_infantry_relief", self.kill_infantry_relief),
            ("economy.kill_armored_relief", self.kill_armored_relief),
            ("economy.comms_tower_relief", self.comms_tower_relief),
            ("economy.sabotage_relief", self.sabotage_relief),
            ("economy.ghost_clear_relief", self.ghost_clear_relief),
            ("economy.route_cut_relief", self.route_cut_relief),
            ("economy.fail_penalty", self.fail_penalty),
            ("economy.fail_penalty_forgiving", self.fail_penalty_forgiving),
            ("economy.recycle_penalty_scale", self.recycle_penalty_scale),
            ("economy.emergency_penalty", self.emergency_penalty),
        ] {
            check_range(field, value, 0.0, span)?;
        }
        check_min("economy.recycle_cost", u64::from(self.recycle_cost), 1)?;
        Ok(())
    }
}

/// Call broadcaster tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub ghost_chance: f64,
    /// Ghost signals only appear strictly above this difficulty.
    pub ghost_min_difficulty: f64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            ghost_chance: constants::GHOST_CHANCE,
            ghost_min_difficulty: constants::GHOST_DIFFICULTY,
        }
    }
}

/// Smart-hand weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    pub hand_size: usize,
    pub tutorial_tier_difficulty: f64,
    pub desperate_threat: f64,
    pub match_chance_tutorial: f64,
    pub match_chance_desperate: f64,
    pub match_chance_baseline: f64,
    pub first_slot_match_chance: f64,
    pub live_target_chance: f64,
    pub correct_weapon_chance: f64,
    pub airstrike_chance: f64,
    pub intel_chance: f64,
    /// INTEL cards only appear strictly above this difficulty.
    pub intel_min_difficulty: f64,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            hand_size: constants::HAND_SIZE,
            tutorial_tier_difficulty: constants::TUTORIAL_TIER_DIFFICULTY,
            desperate_threat: constants::DESPERATE_THREAT,
            match_chance_tutorial: constants::MATCH_CHANCE_TUTORIAL,
            match_chance_desperate: constants::MATCH_CHANCE_DESPERATE,
            match_chance_baseline: constants::MATCH_CHANCE_BASELINE,
            first_slot_match_chance: constants::FIRST_SLOT_MATCH_CHANCE,
            live_target_chance: constants::LIVE_TARGET_CHANCE,
            correct_weapon_chance: constants::CORRECT_WEAPON_CHANCE,
            airstrike_chance: constants::AIRSTRIKE_CHANCE,
            intel_chance: constants::INTEL_CHANCE,
            intel_min_difficulty: constants::INTEL_DIFFICULTY,
        }
    }
}

impl HandConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_min("hand.hand_size", self.hand_size as u64, 1)?;
        for (field, value) in [
            ("hand.match_chance_tutorial", self.match_chance_tutorial),
            ("hand.match_chance_desperate", self.match_chance_desperate),
            ("hand.match_chance_baseline", self.match_chance_baseline),
            ("hand.first_slot_match_chance", self.first_slot_match_chance),
            ("hand.live_target_chance", self.live_target_chance),
            ("hand.correct_weapon_chance", self.correct_weapon_chance),
            ("hand.airstrike_chance", self.airstrike_chance),
            ("hand.intel_chance", self.intel_chance),
        ] {
            check_range(field, value, 0.0, 1.0)?;
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub threat: ThreatConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub hand: HandConfig,
    #[serde(default = "EngineConfig::default_tutorial_steps")]
    pub tutorial_steps: u8,
    #[serde(default = "EngineConfig::default_log_capacity")]
    pub log_capacity: usize,
}

impl EngineConfig {
    const fn default_tutorial_steps() -> u8 {
        constants::TUTORIAL_STEPS
    }

    const fn default_log_capacity() -> usize {
        constants::LOG_CAPACITY
    }

    /// Default balance configuration.
    #[must_use]
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) configuration and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.threat.validate()?;
        self.economy.validate()?;
        check_range("broadcast.ghost_chance", self.broadcast.ghost_chance, 0.0, 1.0)?;
        self.hand.validate()?;
        check_min("tutorial_steps", u64::from(self.tutorial_steps), 1)?;
        check_min("log_capacity", self.log_capacity as u64, 1)?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threat: ThreatConfig::default(),
            economy: EconomyConfig::default(),
            broadcast: BroadcastConfig::default(),
            hand: HandConfig::default(),
            tutorial_steps: Self::default_tutorial_steps(),
            log_capacity: Self::default_log_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default_config().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "threat": { "base_rate": 0.1 }, "hand": { "hand_size": 7 } }"#)
            .unwrap();
        assert!((cfg.threat.base_rate - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.threat.tick_cadence_ms, constants::TICK_CADENCE_MS);
        assert_eq!(cfg.hand.hand_size, 7);
        assert!((cfg.hand.intel_chance - constants::INTEL_CHANCE).abs() < f64::EPSILON);
        assert_eq!(cfg.log_capacity, constants::LOG_CAPACITY);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = EngineConfig::from_json(r#"{ "hand": { "airstrike_chance": 1.5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RangeViolation {
                field: "hand.airstrike_chance",
                ..
            }
        ));

        let err = EngineConfig::from_json(
            r#"{ "threat": { "elevated_threshold": 90.0, "critical_threshold": 80.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::PanicBands { .. }));

        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn durations_follow_millis() {
        let cfg = ThreatConfig::default();
        assert_eq!(cfg.tick_cadence(), Duration::from_millis(50));
        assert_eq!(cfg.comms_grace(), Duration::from_secs(5));
    }
}
