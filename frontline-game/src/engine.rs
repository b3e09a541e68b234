//! Top-level game state machine.
//!
//! [`GameEngine`] owns every piece of mutable battle state and sequences the
//! map generator, broadcaster, resolver, hand composer, threat meter and
//! route tracker. Every action runs to completion before returning; the only
//! asynchronous input is [`GameEngine::tick`], which re-checks the phase and
//! the scheduler handle on every call.

use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::broadcast::{Broadcast, next_call};
use crate::catalog::{Battle, BattleCatalog, CatalogError, Faction, campaigns};
use crate::clock::{Clock, SystemClock};
use crate::combat::{CombatOutcome, EnemyKind, Weapon, failure_reason, resolve};
use crate::config::{ConfigError, EngineConfig};
use crate::grid::{Grid, GridCell, Special};
use crate::hand::{Card, HandComposer, HandContext};
use crate::journal::{LogBuffer, LogEntry, LogKind};
use crate::mapgen::generate_map;
use crate::numbers::{ceil_to_i64, i64_to_threat};
use crate::rng::RngBundle;
use crate::routes::{Route, check_routes, cut_count};
use crate::scheduler::TickScheduler;
use crate::threat::{Escalation, ThreatChange, ThreatEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    #[default]
    Menu,
    Briefing,
    Tutorial,
    Playing,
    Paused,
    Victory,
    Defeat,
    WarWon,
    Diagnostics,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "MENU",
            Self::Briefing => "BRIEFING",
            Self::Tutorial => "TUTORIAL",
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
            Self::Victory => "VICTORY",
            Self::Defeat => "DEFEAT",
            Self::WarWon => "WAR_WON",
            Self::Diagnostics => "DIAGNOSTICS",
        }
    }

    /// Phases that accept card plays, recycles and resupplies.
    #[must_use]
    pub const fn accepts_actions(self) -> bool {
        matches!(self, Self::Playing | Self::Diagnostics)
    }

    /// Mission over; waiting on the player to move on.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat | Self::WarWon)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an action left the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    InactivePhase,
    InvalidTransition,
    UnknownCard,
    NoActiveCall,
    Mismatch,
    AlreadyDaubed,
    InsufficientSupplies,
    StillStocked,
}

impl Rejection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InactivePhase => "inactive phase",
            Self::InvalidTransition => "invalid transition",
            Self::UnknownCard => "unknown card",
            Self::NoActiveCall => "no active call",
            Self::Mismatch => "card does not match call",
            Self::AlreadyDaubed => "target already destroyed",
            Self::InsufficientSupplies => "insufficient supplies",
            Self::StillStocked => "supplies still available",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a player action. Rejections never mutate state beyond an
/// optional log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum ActionOutcome {
    Applied,
    Rejected(Rejection),
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    #[must_use]
    pub const fn rejection(self) -> Option<Rejection> {
        match self {
            Self::Applied => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionResult {
    Victory,
    Defeat,
}

/// Notifications pushed to subscribers as state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    CallBroadcast { value: u8, ghost: bool },
    /// Spoken prompt for the active call; only emitted in live play.
    CallAnnouncement { prompt: String },
    ThreatChanged { level: f64, change: ThreatChange },
    LogAppended(LogEntry),
    RouteCut { route: String },
    HandChanged { size: usize },
    MissionEnded { result: MissionResult, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&EngineEvent) + Send>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub struct GameEngine {
    cfg: EngineConfig,
    catalog: BattleCatalog,
    rngs: RngBundle,
    clock: Box<dyn Clock>,
    composer: HandComposer,
    threat: ThreatEngine,
    scheduler: TickScheduler,
    phase: GamePhase,
    faction: Faction,
    battle_index: usize,
    battle: Battle,
    tutorial_step: u8,
    grid: Grid,
    hand: Vec<Card>,
    routes: Vec<Route>,
    logs: LogBuffer,
    supplies: u32,
    current_call: Option<u8>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEngine")
            .field("phase", &self.phase)
            .field("faction", &self.faction)
            .field("battle", &self.battle.id)
            .field("threat", &self.threat.level())
            .field("supplies", &self.supplies)
            .field("call", &self.current_call)
            .field("hand", &self.hand.len())
            .field("routes_cut", &self.routes_cut_count())
            .field("scheduler", &self.scheduler)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Assemble an engine from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation or the catalog
    /// has no opening battle.
    pub fn new(
        cfg: EngineConfig,
        catalog: BattleCatalog,
        rngs: RngBundle,
        clock: Box<dyn Clock>,
    ) -> Result<Self, EngineError> {
        cfg.validate()?;
        let battle = catalog
            .battle(Faction::Allies, 0)
            .cloned()
            .ok_or(CatalogError::EmptyCampaign {
                faction: Faction::Allies,
            })?;
        Ok(Self {
            composer: HandComposer::new(cfg.hand.clone()),
            threat: ThreatEngine::new(cfg.threat.clone()),
            logs: LogBuffer::new(cfg.log_capacity),
            supplies: cfg.economy.starting_supplies,
            cfg,
            catalog,
            rngs,
            clock,
            scheduler: TickScheduler::new(),
            phase: GamePhase::Menu,
            faction: Faction::Allies,
            battle_index: 0,
            battle,
            tutorial_step: 0,
            grid: Grid::default(),
            hand: Vec::new(),
            routes: Vec::new(),
            current_call: None,
            observers: Vec::new(),
            next_subscription: 0,
        })
    }

    /// Default configuration and bundled campaigns with a wall clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled campaigns are unusable.
    pub fn with_seed(seed: u64) -> Result<Self, EngineError> {
        Self::with_clock(seed, Box::new(SystemClock::new()))
    }

    /// Default configuration and bundled campaigns with an injected clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled campaigns are unusable.
    pub fn with_clock(seed: u64, clock: Box<dyn Clock>) -> Result<Self, EngineError> {
        Self::new(
            EngineConfig::default_config(),
            campaigns().clone(),
            RngBundle::from_user_seed(seed),
            clock,
        )
    }

    // Observers ------------------------------------------------------------

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent) + Send + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    fn emit(&mut self, event: &EngineEvent) {
        for (_, observer) in &mut self.observers {
            observer(event);
        }
    }

    // Accessors ------------------------------------------------------------

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    #[must_use]
    pub const fn battle_index(&self) -> usize {
        self.battle_index
    }

    #[must_use]
    pub const fn current_battle(&self) -> &Battle {
        &self.battle
    }

    #[must_use]
    pub fn current_campaign(&self) -> &[Battle] {
        self.catalog.campaign(self.faction)
    }

    #[must_use]
    pub const fn tutorial_step(&self) -> u8 {
        self.tutorial_step
    }

    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn routes_cut_count(&self) -> usize {
        cut_count(&self.routes)
    }

    #[must_use]
    pub const fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    #[must_use]
    pub const fn supplies(&self) -> u32 {
        self.supplies
    }

    #[must_use]
    pub const fn threat_level(&self) -> f64 {
        self.threat.level()
    }

    /// The latest threat adjustment while it is still fresh.
    #[must_use]
    pub fn last_threat_change(&self) -> Option<&ThreatChange> {
        self.threat.last_change(self.clock.now())
    }

    #[must_use]
    pub const fn current_call(&self) -> Option<u8> {
        self.current_call
    }

    #[must_use]
    pub const fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn in_grace_window(&self) -> bool {
        self.threat.in_grace(self.clock.now())
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rngs.total_draws()
    }

    // Lifecycle ------------------------------------------------------------

    /// MENU -> BRIEFING for the first battle of `faction`'s campaign.
    pub fn select_faction(&mut self, faction: Faction) -> ActionOutcome {
        if self.phase != GamePhase::Menu {
            return ActionOutcome::Rejected(Rejection::InvalidTransition);
        }
        let Some(first) = self.catalog.battle(faction, 0).cloned() else {
            return ActionOutcome::Rejected(Rejection::InvalidTransition);
        };
        self.faction = faction;
        self.battle_index = 0;
        self.battle = first;
        log::info!("faction selected: {faction}");
        self.set_phase(GamePhase::Briefing);
        ActionOutcome::Applied
    }

    /// Deploy into the briefed battle.
    pub fn start_battle(&mut self) -> ActionOutcome {
        if self.phase != GamePhase::Briefing {
            return ActionOutcome::Rejected(Rejection::InvalidTransition);
        }
        self.deploy();
        ActionOutcome::Applied
    }

    pub fn advance_tutorial(&mut self) -> ActionOutcome {
        if self.phase != GamePhase::Tutorial {
            return ActionOutcome::Rejected(Rejection::InvalidTransition);
        }
        if self.tutorial_step >= self.cfg.tutorial_steps {
            self.finish_tutorial();
        } else {
            self.tutorial_step += 1;
        }
        ActionOutcome::Applied
    }

    /// PLAYING <-> PAUSED. Paused time contributes no escalation.
    pub fn toggle_pause(&mut self) -> ActionOutcome {
        match self.phase {
            GamePhase::Playing => {
                self.scheduler.stop();
                self.set_phase(GamePhase::Paused);
            }
            GamePhase::Paused => {
                self.set_phase(GamePhase::Playing);
                self.scheduler.start();
            }
            _ => return ActionOutcome::Rejected(Rejection::InvalidTransition),
        }
        ActionOutcome::Applied
    }

    pub fn quit_to_menu(&mut self) -> ActionOutcome {
        self.scheduler.stop();
        self.tutorial_step = 0;
        self.set_phase(GamePhase::Menu);
        ActionOutcome::Applied
    }

    /// Redeploy the current battle from scratch.
    pub fn restart_level(&mut self) -> ActionOutcome {
        if matches!(self.phase, GamePhase::Menu | GamePhase::WarWon) {
            return ActionOutcome::Rejected(Rejection::InvalidTransition);
        }
        self.scheduler.stop();
        self.deploy();
        ActionOutcome::Applied
    }

    /// VICTORY -> next briefing, or WAR_WON when the campaign is exhausted.
    pub fn next_level(&mut self) -> ActionOutcome {
        if self.phase != GamePhase::Victory {
            return ActionOutcome::Rejected(Rejection::InvalidTransition);
        }
        self.scheduler.stop();
        let next = self.battle_index + 1;
        if let Some(battle) = self.catalog.battle(self.faction, next).cloned() {
            self.battle_index = next;
            self.battle = battle;
            self.set_phase(GamePhase::Briefing);
        } else {
            log::info!("{} campaign complete", self.faction);
            self.set_phase(GamePhase::WarWon);
        }
        ActionOutcome::Applied
    }

    fn deploy(&mut self) {
        let field = generate_map(&self.battle, self.rngs.map());
        self.grid = field.grid;
        self.routes = field.routes;
        self.current_call = None;
        self.logs.clear();
        self.threat.reset();
        self.supplies = self.cfg.economy.starting_supplies;
        self.deal_hand();

        log::info!(
            "deploying {} ({}, difficulty {:.1})",
            self.battle.name,
            self.battle.id,
            self.battle.difficulty_multiplier
        );
        let banner = format!("DEPLOYMENT: {}", self.battle.name.to_uppercase());
        self.push_log(banner, LogKind::Info);

        if self.battle_index == 0 {
            self.tutorial_step = 1;
            self.set_phase(GamePhase::Tutorial);
        } else {
            self.finish_tutorial();
        }
    }

    fn finish_tutorial(&mut self) {
        self.tutorial_step = 0;
        self.set_phase(GamePhase::Playing);
        self.push_log("Signal interceptor active.", LogKind::Info);
        self.broadcast_next_call();
        if self.phase == GamePhase::Playing {
            self.scheduler.start();
        }
    }

    // Scheduled step ---------------------------------------------------------

    /// One escalation step. Inert (`None`) unless the scheduler is running
    /// and the phase is PLAYING.
    pub fn tick(&mut self) -> Option<Escalation> {
        let now = self.clock.now();
        self.threat.expire_change(now);
        if !self.scheduler.is_running() || self.phase != GamePhase::Playing {
            return None;
        }
        let step = self.threat.tick(self.battle.difficulty_multiplier, now);
        match step {
            Escalation::Overflow => self.end_mission(MissionResult::Defeat, "POSITION OVERRUN."),
            Escalation::Raised { level, .. } => {
                self.scheduler.record_fire();
                log::trace!("threat escalated to {level:.2}");
            }
            Escalation::Held => log::trace!("escalation held by grace window"),
        }
        Some(step)
    }

    // Player actions -------------------------------------------------------

    pub fn play_card(&mut self, card_id: &str) -> ActionOutcome {
        if !self.phase.accepts_actions() {
            return ActionOutcome::Rejected(Rejection::InactivePhase);
        }
        let Some(slot) = self.hand.iter().position(|card| card.id == card_id) else {
            log::warn!("play_card: no card {card_id} in hand");
            return ActionOutcome::Rejected(Rejection::UnknownCard);
        };
        let Some(call) = self.current_call else {
            return ActionOutcome::Rejected(Rejection::NoActiveCall);
        };
        let card = self.hand[slot].clone();
        if card.value != call {
            self.push_log("MISMATCH! Check coordinates.", LogKind::Danger);
            return ActionOutcome::Rejected(Rejection::Mismatch);
        }

        let Some(idx) = self.grid.index_of_value(card.value) else {
            self.clear_ghost(slot, &card);
            return ActionOutcome::Applied;
        };
        if self.grid.cells()[idx].is_daubed {
            return ActionOutcome::Rejected(Rejection::AlreadyDaubed);
        }
        match Weapon::new(card.kind) {
            Some(weapon) => self.engage(idx, slot, weapon),
            None => self.use_intel(idx, slot),
        }
        ActionOutcome::Applied
    }

    pub fn recycle_hand(&mut self) -> ActionOutcome {
        if !self.phase.accepts_actions() {
            return ActionOutcome::Rejected(Rejection::InactivePhase);
        }
        let cost = self.cfg.economy.recycle_cost;
        if self.supplies < cost {
            self.push_log("Insufficient Supplies.", LogKind::Info);
            return ActionOutcome::Rejected(Rejection::InsufficientSupplies);
        }
        self.supplies -= cost;
        let economy = &self.cfg.economy;
        let scaled = ceil_to_i64(economy.recycle_penalty_scale * self.battle.difficulty_multiplier);
        let penalty = economy.recycle_penalty_floor.max(scaled);
        self.adjust_threat(i64_to_threat(penalty), "Comms chatter");
        self.push_log(format!("Comms chatter detected! +{penalty}% Threat."), LogKind::Danger);
        self.deal_hand();
        self.check_overflow();
        ActionOutcome::Applied
    }

    pub fn emergency_resupply(&mut self) -> ActionOutcome {
        if !self.phase.accepts_actions() {
            return ActionOutcome::Rejected(Rejection::InactivePhase);
        }
        if self.supplies > 0 {
            return ActionOutcome::Rejected(Rejection::StillStocked);
        }
        self.supplies = self.cfg.economy.emergency_supplies;
        self.adjust_threat(self.cfg.economy.emergency_penalty, "Emergency drop");
        self.push_log("EMERGENCY DROP INBOUND.", LogKind::Info);
        self.deal_hand();
        self.check_overflow();
        ActionOutcome::Applied
    }

    fn engage(&mut self, idx: usize, slot: usize, weapon: Weapon) {
        let cell = self.grid.cells()[idx].clone();
        match resolve(weapon, cell.enemy_type) {
            CombatOutcome::Kill => {
                log::debug!("{} destroyed {} at {}", weapon.kind(), cell.enemy_type, cell.id);
                self.daub(idx);
                self.supplies += self.cfg.economy.kill_supplies;
                let relief = kill_relief(&self.cfg, cell.enemy_type);
                self.adjust_threat(-relief, "Target neutralized");
                self.push_log(
                    format!("{} Neutralized. +{} Supply.", cell.enemy_type, self.cfg.economy.kill_supplies),
                    LogKind::Good,
                );
                match cell.special {
                    Some(Special::SupplyDrop) => {
                        self.supplies += self.cfg.economy.supply_drop_bonus;
                        self.push_log("Supply cache secured!", LogKind::Good);
                    }
                    Some(Special::CommsTower) => {
                        self.adjust_threat(-self.cfg.economy.comms_tower_relief, "Comms tower down");
                        let until = self.threat.begin_grace(self.clock.now());
                        log::debug!("comms grace window until {until:?}");
                        self.push_log("Comms tower destroyed! Enemy escalation halted.", LogKind::Good);
                    }
                    None => {}
                }
                if self.resolve_objectives() {
                    return;
                }
                self.replace_card(slot);
                self.broadcast_next_call();
            }
            CombatOutcome::Fail => {
                let economy = &self.cfg.economy;
                let penalty = if self.battle.difficulty_multiplier < economy.forgiving_below_difficulty {
                    economy.fail_penalty_forgiving
                } else {
                    economy.fail_penalty
                };
                let reason = failure_reason(weapon, cell.enemy_type);
                log::debug!("{} failed against {} at {}", weapon.kind(), cell.enemy_type, cell.id);
                self.adjust_threat(penalty, reason);
                self.push_log(format!("{reason}! +{penalty}% Threat."), LogKind::Danger);
                self.check_overflow();
            }
        }
    }

    fn use_intel(&mut self, idx: usize, slot: usize) {
        let cell = self.grid.cells()[idx].clone();
        if cell.enemy_type == EnemyKind::Structure && !cell.is_revealed {
            log::debug!("sabotage on {}", cell.id);
            self.daub(idx);
            self.adjust_threat(-self.cfg.economy.sabotage_relief, "Sabotage");
            self.push_log(format!("Sabotage! {} destroyed. Threat reduced.", cell.id), LogKind::Good);
            if self.resolve_objectives() {
                return;
            }
        } else {
            if let Some(target) = self.grid.get_mut(idx) {
                target.is_revealed = true;
            }
            self.push_log(format!("Intel: {} is {}.", cell.id, cell.enemy_type), LogKind::Info);
        }
        self.replace_card(slot);
        self.broadcast_next_call();
    }

    /// Counter-intel against a call with no grid position.
    fn clear_ghost(&mut self, slot: usize, card: &Card) {
        log::debug!("ghost signal {} cleared", card.value);
        self.push_log("Ghost Signal cleared.", LogKind::Info);
        self.adjust_threat(-self.cfg.economy.ghost_clear_relief, "Counter-intel");
        if !card.kind.is_weapon() {
            self.consolation_reveal();
        }
        self.replace_card(slot);
        self.broadcast_next_call();
    }

    fn consolation_reveal(&mut self) {
        let pick = self
            .grid
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_revealed && !cell.is_daubed)
            .map(|(idx, _)| idx)
            .choose(self.rngs.intel());
        let Some(idx) = pick else {
            return;
        };
        if let Some(cell) = self.grid.get_mut(idx) {
            cell.is_revealed = true;
            let text = format!("Intel: {} is {}.", cell.id, cell.enemy_type);
            self.push_log(text, LogKind::Info);
        }
    }

    fn daub(&mut self, idx: usize) {
        if let Some(cell) = self.grid.get_mut(idx) {
            cell.is_daubed = true;
        }
    }

    /// Pay route rewards and check the win condition. Returns true when the
    /// mission ended.
    fn resolve_objectives(&mut self) -> bool {
        let report = check_routes(&mut self.routes, &self.grid);
        for name in report.newly_cut.iter().cloned() {
            log::debug!("route cut: {name}");
            self.supplies += self.cfg.economy.route_cut_supplies;
            self.adjust_threat(-self.cfg.economy.route_cut_relief, "Route secured");
            self.push_log(format!("ROUTE SECURED: {name}"), LogKind::Good);
            self.emit(&EngineEvent::RouteCut { route: name });
        }
        if report.objective_met(self.battle.routes_to_cut) {
            self.end_mission(MissionResult::Victory, "Objective Completed.");
            return true;
        }
        false
    }

    fn broadcast_next_call(&mut self) {
        let call = next_call(
            &self.grid,
            self.battle.difficulty_multiplier,
            &self.cfg.broadcast,
            self.rngs.broadcast(),
        );
        let Some(value) = call.value() else {
            if self.phase == GamePhase::Diagnostics {
                log::debug!("grid exhausted in diagnostics; call unchanged");
            } else {
                self.end_mission(MissionResult::Victory, "Area cleared.");
            }
            return;
        };
        self.current_call = Some(value);
        log::debug!("call {value}{}", if call.is_ghost() { " (ghost)" } else { "" });
        self.emit(&EngineEvent::CallBroadcast {
            value,
            ghost: matches!(call, Broadcast::Ghost(_)),
        });
        if self.phase == GamePhase::Playing {
            self.emit(&EngineEvent::CallAnnouncement {
                prompt: format!("Target... {value}"),
            });
        }
    }

    fn deal_hand(&mut self) {
        let ctx = HandContext {
            grid: &self.grid,
            call: self.current_call,
            difficulty: self.battle.difficulty_multiplier,
            threat: self.threat.level(),
        };
        self.hand = self.composer.deal_hand(&ctx, self.rngs.hand());
        self.emit(&EngineEvent::HandChanged {
            size: self.hand.len(),
        });
    }

    /// Discard the card at `slot` and append one replacement.
    fn replace_card(&mut self, slot: usize) {
        if slot < self.hand.len() {
            self.hand.remove(slot);
        }
        let ctx = HandContext {
            grid: &self.grid,
            call: self.current_call,
            difficulty: self.battle.difficulty_multiplier,
            threat: self.threat.level(),
        };
        let card = self.composer.draw_replacement(&self.hand, &ctx, self.rngs.hand());
        self.hand.push(card);
        self.emit(&EngineEvent::HandChanged {
            size: self.hand.len(),
        });
    }

    fn adjust_threat(&mut self, delta: f64, reason: &str) {
        let level = self.threat.adjust(delta, reason, self.clock.now());
        if let Some(change) = self.threat.last_change(self.clock.now()).cloned() {
            self.emit(&EngineEvent::ThreatChanged { level, change });
        }
    }

    fn check_overflow(&mut self) {
        if self.phase.accepts_actions() && self.threat.is_overflowing() {
            self.end_mission(MissionResult::Defeat, "POSITION OVERRUN.");
        }
    }

    fn end_mission(&mut self, result: MissionResult, reason: &str) {
        self.scheduler.stop();
        let (phase, kind) = match result {
            MissionResult::Victory => (GamePhase::Victory, LogKind::Good),
            MissionResult::Defeat => (GamePhase::Defeat, LogKind::Danger),
        };
        log::info!("mission over ({}): {reason}", phase.as_str());
        self.set_phase(phase);
        self.push_log(format!("MISSION STATUS: {reason}"), kind);
        self.emit(&EngineEvent::MissionEnded {
            result,
            reason: reason.to_string(),
        });
    }

    fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        log::debug!("phase {from} -> {to}");
        self.emit(&EngineEvent::PhaseChanged { from, to });
    }

    fn push_log(&mut self, text: impl Into<String>, kind: LogKind) {
        let now = self.clock.now();
        if let Some(entry) = self.logs.push(text, kind, now).cloned() {
            self.emit(&EngineEvent::LogAppended(entry));
        }
    }

    // Diagnostics ----------------------------------------------------------

    /// Deterministic baseline for scenario construction: empty board and
    /// hand, zero threat, starting supplies, DIAGNOSTICS phase.
    pub fn reset_for_tests(&mut self) {
        self.scheduler.stop();
        self.faction = Faction::Allies;
        self.battle_index = 0;
        if let Some(first) = self.catalog.battle(Faction::Allies, 0).cloned() {
            self.battle = first;
        }
        self.tutorial_step = 0;
        self.grid = Grid::default();
        self.hand.clear();
        self.routes.clear();
        self.logs.clear();
        self.threat.reset();
        self.supplies = self.cfg.economy.starting_supplies;
        self.current_call = None;
        self.set_phase(GamePhase::Diagnostics);
    }

    pub fn debug_set_grid(&mut self, cells: Vec<GridCell>) {
        self.grid = Grid::new(cells);
    }

    pub fn debug_set_hand(&mut self, cards: Vec<Card>) {
        self.hand = cards;
    }

    pub fn debug_set_call(&mut self, value: u8) {
        self.current_call = Some(value);
    }

    pub fn debug_set_routes(&mut self, routes: Vec<Route>) {
        self.routes = routes;
    }

    /// Replace the active battle record, e.g. to lower `routes_to_cut`.
    pub fn debug_set_battle(&mut self, battle: Battle) {
        self.battle = battle;
    }

    pub fn debug_set_threat(&mut self, level: f64) {
        self.threat.set_level(level);
    }

    pub fn debug_set_supplies(&mut self, supplies: u32) {
        self.supplies = supplies;
    }

    /// Force a phase. Entering PLAYING starts the scheduler; any other phase
    /// stops it.
    pub fn debug_set_phase(&mut self, phase: GamePhase) {
        self.set_phase(phase);
        if phase == GamePhase::Playing {
            self.scheduler.start();
        } else {
            self.scheduler.stop();
        }
    }
}

fn kill_relief(cfg: &EngineConfig, enemy: EnemyKind) -> f64 {
    if enemy.is_armored() {
        cfg.economy.kill_armored_relief
    } else {
        cfg.economy.kill_infantry_relief
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::combat::CardKind;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn engine() -> (GameEngine, ManualClock) {
        let clock = ManualClock::new();
        let engine = GameEngine::with_clock(42, Box::new(clock.clone())).unwrap();
        (engine, clock)
    }

    fn diagnostics() -> GameEngine {
        let (mut engine, _) = engine();
        engine.reset_for_tests();
        engine
    }

    fn play(engine: &mut GameEngine, value: u8, kind: CardKind) -> ActionOutcome {
        engine.debug_set_hand(vec![Card::new("test", value, kind)]);
        engine.play_card("test")
    }

    #[test]
    fn starts_in_menu_with_baseline_state() {
        let (engine, _) = engine();
        assert_eq!(engine.phase(), GamePhase::Menu);
        assert_eq!(engine.supplies(), 5);
        assert!(engine.threat_level().abs() < f64::EPSILON);
        assert!(!engine.scheduler().is_running());
    }

    #[test]
    fn first_battle_enters_tutorial() {
        let (mut engine, _) = engine();
        assert!(engine.select_faction(Faction::Axis).is_applied());
        assert_eq!(engine.current_battle().id, "A1");
        assert!(engine.start_battle().is_applied());
        assert_eq!(engine.phase(), GamePhase::Tutorial);
        assert_eq!(engine.tutorial_step(), 1);
        assert_eq!(engine.hand().len(), 5);
        assert_eq!(engine.grid().len(), 12);
        assert_eq!(engine.logs().head().unwrap().text, "DEPLOYMENT: POLAND");
        assert!(engine.current_call().is_none());
        assert!(!engine.scheduler().is_running());
    }

    #[test]
    fn tutorial_finishes_after_final_step() {
        let (mut engine, _) = engine();
        let _ = engine.select_faction(Faction::Allies);
        let _ = engine.start_battle();
        for expected in 2..=4 {
            let _ = engine.advance_tutorial();
            assert_eq!(engine.tutorial_step(), expected);
        }
        let _ = engine.advance_tutorial();
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.tutorial_step(), 0);
        assert!(engine.current_call().is_some());
        assert!(engine.scheduler().is_running());
        assert_eq!(engine.logs().head().unwrap().text, "Signal interceptor active.");
    }

    #[test]
    fn actions_are_inert_outside_active_phases() {
        let (mut engine, _) = engine();
        assert_eq!(
            engine.recycle_hand(),
            ActionOutcome::Rejected(Rejection::InactivePhase)
        );
        assert_eq!(
            engine.play_card("nope"),
            ActionOutcome::Rejected(Rejection::InactivePhase)
        );
        assert_eq!(
            engine.start_battle(),
            ActionOutcome::Rejected(Rejection::InvalidTransition)
        );
        assert!(engine.tick().is_none());
    }

    #[test]
    fn kill_rewards_supplies_and_relief() {
        let mut engine = diagnostics();
        engine.debug_set_threat(50.0);
        engine.debug_set_grid(vec![GridCell::labeled("T10", 10, EnemyKind::Infantry)]);
        engine.debug_set_call(10);
        assert!(play(&mut engine, 10, CardKind::LightWeapon).is_applied());
        assert!(engine.grid().cells()[0].is_daubed);
        assert_eq!(engine.supplies(), 6);
        assert!((engine.threat_level() - 42.0).abs() < f64::EPSILON);
        assert_eq!(engine.hand().len(), 1);
        assert_eq!(engine.phase(), GamePhase::Diagnostics);
    }

    #[test]
    fn failed_attack_keeps_card_and_call() {
        let mut engine = diagnostics();
        engine.debug_set_grid(vec![GridCell::labeled("T10", 10, EnemyKind::Heavy)]);
        engine.debug_set_call(10);
        let _ = play(&mut engine, 10, CardKind::LightWeapon);
        assert!(!engine.grid().cells()[0].is_daubed);
        assert_eq!(engine.hand()[0].id, "test");
        assert_eq!(engine.current_call(), Some(10));
        assert!((engine.threat_level() - 5.0).abs() < f64::EPSILON);
        assert_eq!(engine.logs().head().unwrap().text, "Ricochet! +5% Threat.");
    }

    #[test]
    fn comms_tower_opens_grace_window() {
        let (mut engine, clock) = engine();
        engine.reset_for_tests();
        engine.debug_set_threat(60.0);
        engine.debug_set_grid(vec![
            GridCell::labeled("T10", 10, EnemyKind::Infantry).with_special(Special::CommsTower),
            GridCell::labeled("T11", 11, EnemyKind::Infantry),
        ]);
        engine.debug_set_call(10);
        let _ = play(&mut engine, 10, CardKind::LightWeapon);
        assert!((engine.threat_level() - 27.0).abs() < f64::EPSILON);
        assert!(engine.in_grace_window());

        engine.debug_set_phase(GamePhase::Playing);
        assert_eq!(engine.tick(), Some(Escalation::Held));
        clock.advance(Duration::from_secs(5));
        assert!(matches!(engine.tick(), Some(Escalation::Raised { .. })));
    }

    #[test]
    fn observers_receive_events_until_unsubscribed() {
        let mut engine = diagnostics();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = engine.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        engine.debug_set_supplies(0);
        let _ = engine.emergency_resupply();
        {
            let events = seen.lock().unwrap();
            assert!(events.iter().any(|e| matches!(e, EngineEvent::ThreatChanged { .. })));
            assert!(events.iter().any(|e| matches!(e, EngineEvent::LogAppended(entry) if entry.text == "EMERGENCY DROP INBOUND.")));
            assert!(events.iter().any(|e| matches!(e, EngineEvent::HandChanged { size: 5 })));
        }

        assert!(engine.unsubscribe(id));
        assert!(!engine.unsubscribe(id));
        let count = seen.lock().unwrap().len();
        engine.debug_set_supplies(0);
        let _ = engine.emergency_resupply();
        assert_eq!(seen.lock().unwrap().len(), count);
    }

    #[test]
    fn announcements_are_suppressed_in_diagnostics() {
        let mut engine = diagnostics();
        let prompts = Arc::new(Mutex::new(0_usize));
        let sink = Arc::clone(&prompts);
        engine.subscribe(move |event| {
            if matches!(event, EngineEvent::CallAnnouncement { .. }) {
                *sink.lock().unwrap() += 1;
            }
        });
        engine.debug_set_grid(vec![
            GridCell::labeled("T1", 1, EnemyKind::Infantry),
            GridCell::labeled("T2", 2, EnemyKind::Infantry),
        ]);
        engine.debug_set_call(1);
        let _ = play(&mut engine, 1, CardKind::LightWeapon);
        assert_eq!(engine.current_call(), Some(2));
        assert_eq!(*prompts.lock().unwrap(), 0);
    }

    #[test]
    fn debug_phase_controls_scheduler() {
        let mut engine = diagnostics();
        engine.debug_set_phase(GamePhase::Playing);
        assert!(engine.scheduler().is_running());
        engine.debug_set_phase(GamePhase::Diagnostics);
        assert!(!engine.scheduler().is_running());
    }
}
