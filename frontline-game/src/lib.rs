//! Frontline Game Engine
//!
//! Platform-agnostic rules engine for the Frontline bingo-combat game: a
//! broadcaster calls numbered targets, the player answers with hand cards
//! against a grid of enemy positions, and a rising threat meter keeps the
//! clock running. No rendering or audio lives here.

pub mod broadcast;
pub mod catalog;
pub mod clock;
pub mod combat;
pub mod config;
pub mod constants;
pub mod engine;
pub mod grid;
pub mod hand;
pub mod journal;
pub mod mapgen;
pub mod numbers;
#[cfg(feature = "async")]
pub mod realtime;
pub mod rng;
pub mod routes;
pub mod scheduler;
pub mod threat;

// Re-export commonly used types
pub use broadcast::{Broadcast, next_call};
pub use catalog::{Battle, BattleCatalog, CatalogError, Faction, campaigns};
pub use clock::{Clock, ManualClock, SystemClock};
pub use combat::{CardKind, CombatOutcome, EnemyKind, Weapon, failure_reason, resolve};
pub use config::{BroadcastConfig, ConfigError, EconomyConfig, EngineConfig, HandConfig, ThreatConfig};
pub use engine::{
    ActionOutcome, EngineError, EngineEvent, GameEngine, GamePhase, MissionResult, Rejection,
    SubscriptionId,
};
pub use grid::{Grid, GridCell, Special, coordinate_id};
pub use hand::{Card, HandComposer, HandContext};
pub use journal::{LogBuffer, LogEntry, LogKind};
pub use mapgen::{Battlefield, build_routes, generate_map};
#[cfg(feature = "async")]
pub use realtime::{TickerTask, spawn_ticker};
pub use rng::{CountingRng, RngBundle};
pub use routes::{Route, RouteCoords, RouteReport, check_routes};
pub use scheduler::{TickHandle, TickScheduler};
pub use threat::{Escalation, ThreatChange, ThreatEngine};
