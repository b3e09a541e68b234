//! Seeded campaign auto-play. Each run drives one faction's campaign from
//! the menu to WAR_WON (or until retries run out) on a manual clock, and
//! checks engine invariants after every move.
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use colored::Colorize;
use frontline_game::{
    ActionOutcome, EngineError, EngineEvent, Faction, GameEngine, GamePhase, ManualClock,
    MissionResult,
};
use serde::{Serialize, Serializer};

use super::policy::{Move, PlayerPolicy, Strategy};

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: Strategy,
    /// Scheduler ticks that elapse before each move.
    pub reaction_ticks: u32,
    /// Moves allowed per attempt before the run is declared stalled.
    pub max_moves: usize,
    /// Restarts allowed per battle after a defeat.
    pub retries: usize,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            strategy: Strategy::Greedy,
            reaction_ticks: 12,
            max_moves: 600,
            retries: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BattleRecord {
    pub battle_id: String,
    pub name: String,
    pub attempt: usize,
    pub result: Option<MissionResult>,
    pub moves: usize,
    pub cards_played: usize,
    pub recycles: usize,
    pub emergencies: usize,
    pub ticks: u64,
    pub ghost_calls: usize,
    pub routes_cut: usize,
    pub peak_threat: f64,
    pub supplies_left: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignRun {
    pub seed: u64,
    pub faction: Faction,
    pub strategy: String,
    pub battles: Vec<BattleRecord>,
    pub war_won: bool,
    pub passed: bool,
    pub failures: Vec<String>,
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
}

impl CampaignRun {
    #[must_use]
    pub fn victories(&self) -> usize {
        self.battles
            .iter()
            .filter(|b| b.result == Some(MissionResult::Victory))
            .count()
    }

    #[must_use]
    pub fn defeats(&self) -> usize {
        self.battles
            .iter()
            .filter(|b| b.result == Some(MissionResult::Defeat))
            .count()
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

#[derive(Debug, Default)]
struct EventTally {
    ghost_calls: usize,
    routes_cut: usize,
}

/// Run `iterations` campaigns per seed and faction. Iteration `n` uses
/// `seed + n` so every run is reproducible from the report.
pub fn run_campaigns(
    plan: &SimulationPlan,
    seeds: &[u64],
    iterations: usize,
    verbose: bool,
) -> Result<Vec<CampaignRun>, EngineError> {
    let mut runs = Vec::new();
    for &seed in seeds {
        for iteration in 0..iterations.max(1) {
            let run_seed = seed.wrapping_add(u64::try_from(iteration).unwrap_or_default());
            for faction in [Faction::Allies, Faction::Axis] {
                let run = run_campaign(plan, run_seed, faction)?;
                if verbose {
                    let status = if run.passed { "✅".green() } else { "❌".red() };
                    println!(
                        "{status} {} seed {run_seed}: {}/{} battles won",
                        faction.as_str().bold(),
                        run.victories(),
                        run.battles.len(),
                    );
                }
                runs.push(run);
            }
        }
    }
    Ok(runs)
}

pub fn run_campaign(
    plan: &SimulationPlan,
    seed: u64,
    faction: Faction,
) -> Result<CampaignRun, EngineError> {
    let started = Instant::now();
    let clock = ManualClock::new();
    let mut engine = GameEngine::with_clock(seed, Box::new(clock.clone()))?;
    let tally = Arc::new(Mutex::new(EventTally::default()));
    let sink = Arc::clone(&tally);
    engine.subscribe(move |event| {
        let Ok(mut tally) = sink.lock() else {
            return;
        };
        match event {
            EngineEvent::CallBroadcast { ghost: true, .. } => tally.ghost_calls += 1,
            EngineEvent::RouteCut { .. } => tally.routes_cut += 1,
            _ => {}
        }
    });

    let mut policy = plan.strategy.create_policy();
    let mut driver = Driver {
        engine,
        clock,
        tally,
        failures: Vec::new(),
    };
    let mut battles = Vec::new();

    if !driver.engine.select_faction(faction).is_applied() {
        driver.fail("faction selection rejected from the menu");
    }
    log::info!("campaign run: {faction} seed {seed} ({})", plan.strategy);

    'campaign: while driver.failures.is_empty() && driver.engine.phase() == GamePhase::Briefing {
        driver.reset_tally();
        let mut outcome = driver.engine.start_battle();
        for attempt in 0..=plan.retries {
            if !outcome.is_applied() {
                driver.fail(format!("could not deploy: {outcome:?}"));
                break 'campaign;
            }
            let record = driver.fight(plan, policy.as_mut(), attempt);
            let result = record.result;
            battles.push(record);
            match result {
                Some(MissionResult::Victory) => {
                    if !driver.engine.next_level().is_applied() {
                        driver.fail("next level rejected after victory");
                    }
                    continue 'campaign;
                }
                Some(MissionResult::Defeat) if attempt < plan.retries => {
                    driver.reset_tally();
                    outcome = driver.engine.restart_level();
                }
                _ => break 'campaign,
            }
        }
        break;
    }

    let war_won = driver.engine.phase() == GamePhase::WarWon;
    Ok(CampaignRun {
        seed,
        faction,
        strategy: plan.strategy.label().to_string(),
        battles,
        war_won,
        passed: driver.failures.is_empty(),
        failures: driver.failures,
        duration: started.elapsed(),
    })
}

struct Driver {
    engine: GameEngine,
    clock: ManualClock,
    tally: Arc<Mutex<EventTally>>,
    failures: Vec<String>,
}

impl Driver {
    fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.failures.push(message);
    }

    fn reset_tally(&self) {
        if let Ok(mut tally) = self.tally.lock() {
            *tally = EventTally::default();
        }
    }

    /// Play the deployed battle to a terminal phase.
    fn fight(
        &mut self,
        plan: &SimulationPlan,
        policy: &mut dyn PlayerPolicy,
        attempt: usize,
    ) -> BattleRecord {
        while self.engine.phase() == GamePhase::Tutorial {
            let _ = self.engine.advance_tutorial();
        }

        let battle = self.engine.current_battle();
        let mut record = BattleRecord {
            battle_id: battle.id.clone(),
            name: battle.name.clone(),
            attempt,
            ..BattleRecord::default()
        };
        let fired_before = self.engine.scheduler().fired();
        let cadence = self.engine.config().threat.tick_cadence();

        while self.engine.phase() == GamePhase::Playing {
            if record.moves >= plan.max_moves {
                self.fail(format!(
                    "{} stalled after {} moves ({})",
                    record.battle_id,
                    record.moves,
                    policy.name()
                ));
                break;
            }
            for _ in 0..plan.reaction_ticks {
                self.clock.advance(cadence);
                let _ = self.engine.tick();
                record.peak_threat = record.peak_threat.max(self.engine.threat_level());
                if self.engine.phase() != GamePhase::Playing {
                    break;
                }
            }
            if self.engine.phase() != GamePhase::Playing {
                break;
            }

            let choice = policy.decide(&self.engine);
            let outcome = match &choice {
                Move::Play(card) => {
                    record.cards_played += 1;
                    self.engine.play_card(card)
                }
                Move::Recycle => {
                    record.recycles += 1;
                    self.engine.recycle_hand()
                }
                Move::EmergencyResupply => {
                    record.emergencies += 1;
                    self.engine.emergency_resupply()
                }
                Move::Wait => ActionOutcome::Applied,
            };
            record.moves += 1;
            record.peak_threat = record.peak_threat.max(self.engine.threat_level());
            if let ActionOutcome::Rejected(reason) = outcome {
                self.fail(format!("{} rejected {choice:?}: {reason}", policy.name()));
                break;
            }
            self.check_invariants();
        }

        record.result = match self.engine.phase() {
            GamePhase::Victory => Some(MissionResult::Victory),
            GamePhase::Defeat => Some(MissionResult::Defeat),
            _ => None,
        };
        record.ticks = self.engine.scheduler().fired().saturating_sub(fired_before);
        record.supplies_left = self.engine.supplies();
        if let Ok(tally) = self.tally.lock() {
            record.ghost_calls = tally.ghost_calls;
            record.routes_cut = tally.routes_cut;
        }
        self.check_terminal(&record);
        record
    }

    fn check_invariants(&mut self) {
        let threat = self.engine.threat_level();
        if !(0.0..=100.0).contains(&threat) {
            self.fail(format!("threat out of range: {threat}"));
        }
        if self.engine.phase() == GamePhase::Playing {
            let expected = self.engine.config().hand.hand_size;
            let held = self.engine.hand().len();
            if held != expected {
                self.fail(format!("hand holds {held} cards, expected {expected}"));
            }
        }
    }

    fn check_terminal(&mut self, record: &BattleRecord) {
        match record.result {
            Some(MissionResult::Victory) => {
                let needed = usize::from(self.engine.current_battle().routes_to_cut);
                let cleared = self.engine.grid().undaubed_count() == 0;
                if self.engine.routes_cut_count() < needed && !cleared {
                    self.fail(format!(
                        "{} won with {} of {needed} routes cut",
                        record.battle_id,
                        self.engine.routes_cut_count()
                    ));
                }
            }
            Some(MissionResult::Defeat) => {
                let threat = self.engine.threat_level();
                if threat < 100.0 {
                    self.fail(format!("{} lost at threat {threat}", record.battle_id));
                }
            }
            None => {}
        }
        if self.engine.phase().is_terminal() && self.engine.scheduler().is_running() {
            self.fail(format!("{} left the scheduler running", record.battle_id));
        }
    }
}
