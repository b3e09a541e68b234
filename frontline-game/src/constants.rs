//! Centralized balance and tuning constants for Frontline game logic.
//!
//! These values are the defaults behind [`crate::config::EngineConfig`].
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, or through an explicit
//! configuration override.

// Grid ---------------------------------------------------------------------
pub const VALUE_POOL_MIN: u8 = 1;
pub const VALUE_POOL_MAX: u8 = 99;
pub const MAX_GRID_CELLS: usize = VALUE_POOL_MAX as usize;
pub const SUPPLY_DROPS_MIN: usize = 1;
pub const SUPPLY_DROPS_MAX: usize = 2;
pub const COMMS_TOWER_DIFFICULTY: f64 = 1.2;

// Scheduler ----------------------------------------------------------------
pub const TICK_CADENCE_MS: u64 = 50;
pub const BASE_THREAT_RATE: f64 = 0.04;
pub const PANIC_ELEVATED_THRESHOLD: f64 = 50.0;
pub const PANIC_CRITICAL_THRESHOLD: f64 = 80.0;
pub const PANIC_ELEVATED_MULTIPLIER: f64 = 1.2;
pub const PANIC_CRITICAL_MULTIPLIER: f64 = 1.5;
pub const COMMS_GRACE_MS: u64 = 5_000;
pub const THREAT_CHANGE_LIFETIME_MS: u64 = 1_500;

// Threat bounds ------------------------------------------------------------
pub const THREAT_MIN: f64 = 0.0;
pub const THREAT_MAX: f64 = 100.0;

// Threat economy -----------------------------------------------------------
pub const KILL_INFANTRY_RELIEF: f64 = 8.0;
pub const KILL_ARMORED_RELIEF: f64 = 12.0;
pub const COMMS_TOWER_RELIEF: f64 = 25.0;
pub const SABOTAGE_RELIEF: f64 = 15.0;
pub const GHOST_CLEAR_RELIEF: f64 = 2.0;
pub const ROUTE_CUT_RELIEF: f64 = 20.0;
pub const FAIL_PENALTY: f64 = 15.0;
pub const FAIL_PENALTY_FORGIVING: f64 = 5.0;
pub const FORGIVING_DIFFICULTY: f64 = 1.0;
pub const RECYCLE_PENALTY_FLOOR: i64 = 3;
pub const RECYCLE_PENALTY_SCALE: f64 = 5.0;
pub const EMERGENCY_PENALTY: f64 = 25.0;

// Logistics ----------------------------------------------------------------
pub const STARTING_SUPPLIES: u32 = 5;
pub const KILL_SUPPLY_REWARD: u32 = 1;
pub const SUPPLY_DROP_REWARD: u32 = 3;
pub const ROUTE_CUT_SUPPLY_REWARD: u32 = 2;
pub const RECYCLE_COST: u32 = 1;
pub const EMERGENCY_SUPPLIES: u32 = 3;

// Broadcaster --------------------------------------------------------------
pub const GHOST_CHANCE: f64 = 0.15;
pub const GHOST_DIFFICULTY: f64 = 1.0;

// Hand composition ---------------------------------------------------------
pub const HAND_SIZE: usize = 5;
pub const TUTORIAL_TIER_DIFFICULTY: f64 = 0.6;
pub const DESPERATE_THREAT: f64 = 80.0;
pub const MATCH_CHANCE_TUTORIAL: f64 = 0.6;
pub const MATCH_CHANCE_DESPERATE: f64 = 0.5;
pub const MATCH_CHANCE_BASELINE: f64 = 0.2;
pub const FIRST_SLOT_MATCH_CHANCE: f64 = 0.3;
pub const LIVE_TARGET_CHANCE: f64 = 0.7;
pub const CORRECT_WEAPON_CHANCE: f64 = 0.9;
pub const AIRSTRIKE_CHANCE: f64 = 0.05;
pub const INTEL_CHANCE: f64 = 0.1;
pub const INTEL_DIFFICULTY: f64 = 0.8;

// Flow ---------------------------------------------------------------------
pub const TUTORIAL_STEPS: u8 = 4;
pub const LOG_CAPACITY: usize = 8;
