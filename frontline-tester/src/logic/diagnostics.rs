//! Field-manual compliance checks driven through the engine's diagnostics
//! interface. Every check starts from `reset_for_tests` and builds the
//! smallest board that exercises one rule.
use frontline_game::{
    Card, CardKind, EngineError, EnemyKind, GameEngine, GamePhase, GridCell, ManualClock, Route,
    RouteCoords, Special,
};
use serde::Serialize;

pub const THREAT_ECONOMY: &str = "Threat Economy";
pub const LOGISTICS: &str = "Logistics";
pub const COMBAT_PROTOCOLS: &str = "Combat Protocols";
pub const HAND_LOCK: &str = "Hand Lock";
pub const GHOST_SIGNAL: &str = "Ghost Signal";
pub const VICTORY_DEFEAT: &str = "Victory/Defeat";
pub const FULL_MISSION_SIM: &str = "Full Mission Sim";

pub const CATEGORIES: [&str; 7] = [
    THREAT_ECONOMY,
    LOGISTICS,
    COMBAT_PROTOCOLS,
    HAND_LOCK,
    GHOST_SIGNAL,
    VICTORY_DEFEAT,
    FULL_MISSION_SIM,
];

const TEST_CARD: &str = "test";

/// Matrix rows checked under Combat Protocols.
const COMBAT_CASES: [(EnemyKind, CardKind, bool, &str); 8] = [
    (EnemyKind::Infantry, CardKind::LightWeapon, true, "Infantry vs Rifle"),
    (EnemyKind::Infantry, CardKind::HeavyWeapon, false, "Infantry vs Bazooka"),
    (EnemyKind::Heavy, CardKind::HeavyWeapon, true, "Tank vs Bazooka"),
    (EnemyKind::Heavy, CardKind::LightWeapon, false, "Tank vs Rifle"),
    (EnemyKind::Structure, CardKind::Explosive, true, "Bunker vs Satchel"),
    (EnemyKind::Structure, CardKind::LightWeapon, false, "Bunker vs Rifle"),
    (EnemyKind::Heavy, CardKind::Airstrike, true, "Any vs Airstrike"),
    (EnemyKind::Structure, CardKind::Intel, true, "Any vs Intel (Sabotage)"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub category: String,
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Run every compliance category in order against a fresh engine.
pub fn run_field_manual(seed: u64) -> Result<Vec<CheckResult>, EngineError> {
    let mut manual = FieldManual::new(seed)?;
    manual.threat_economy();
    manual.logistics();
    manual.combat_protocols();
    manual.hand_lock();
    manual.ghost_signal();
    manual.victory_defeat();
    manual.full_mission_sim();
    Ok(manual.results)
}

struct FieldManual {
    engine: GameEngine,
    clock: ManualClock,
    results: Vec<CheckResult>,
}

impl FieldManual {
    fn new(seed: u64) -> Result<Self, EngineError> {
        let clock = ManualClock::new();
        let engine = GameEngine::with_clock(seed, Box::new(clock.clone()))?;
        Ok(Self {
            engine,
            clock,
            results: Vec::new(),
        })
    }

    fn record(&mut self, category: &str, name: &str, passed: bool, message: Option<String>) {
        log::debug!("[{category}] {name}: {}", if passed { "pass" } else { "FAIL" });
        self.results.push(CheckResult {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        });
    }

    fn setup(&mut self) {
        self.engine.reset_for_tests();
    }

    /// Single-cell board with `call` active.
    fn place(&mut self, cell: GridCell, call: u8) {
        self.engine.debug_set_grid(vec![cell]);
        self.engine.debug_set_call(call);
    }

    fn play(&mut self, value: u8, kind: CardKind) {
        self.engine
            .debug_set_hand(vec![Card::new(TEST_CARD, value, kind)]);
        let _ = self.engine.play_card(TEST_CARD);
    }

    fn threat(&self) -> f64 {
        self.engine.threat_level()
    }

    fn is_daubed(&self, value: u8) -> bool {
        self.engine
            .grid()
            .find_value(value)
            .is_some_and(|cell| cell.is_daubed)
    }

    // Threat Economy -------------------------------------------------------

    fn threat_economy(&mut self) {
        self.setup();
        let before = self.threat();
        let _ = self.engine.recycle_hand();
        let delta = self.threat() - before;
        self.record(
            THREAT_ECONOMY,
            "Recycle Penalty",
            delta > 0.0,
            Some(format!("Threat delta: {delta}")),
        );

        self.setup();
        self.engine.debug_set_supplies(0);
        let _ = self.engine.emergency_resupply();
        let threat = self.threat();
        self.record(
            THREAT_ECONOMY,
            "Emergency Drop Penalty",
            approx(threat, 25.0),
            Some(format!("Threat: {threat}")),
        );

        self.setup();
        self.engine.debug_set_threat(50.0);
        self.place(target(10, EnemyKind::Infantry), 10);
        self.play(10, CardKind::LightWeapon);
        let threat = self.threat();
        self.record(THREAT_ECONOMY, "Kill Threat Reduction", threat < 50.0, None);

        self.setup();
        self.engine.debug_set_threat(50.0);
        self.place(target(10, EnemyKind::Structure), 10);
        self.play(10, CardKind::Intel);
        let threat = self.threat();
        self.record(
            THREAT_ECONOMY,
            "Intel Threat Reduction",
            approx(threat, 35.0),
            Some(format!("Threat: {threat}")),
        );

        self.setup();
        self.place(target(10, EnemyKind::Heavy), 10);
        self.play(10, CardKind::LightWeapon);
        let threat = self.threat();
        self.record(THREAT_ECONOMY, "Ricochet Penalty", threat > 0.0, None);
    }

    // Logistics ------------------------------------------------------------

    fn logistics(&mut self) {
        self.setup();
        let supplies = self.engine.supplies();
        self.record(LOGISTICS, "Initial Supply Check", supplies == 5, None);

        self.setup();
        let _ = self.engine.recycle_hand();
        let supplies = self.engine.supplies();
        self.record(LOGISTICS, "Recycle Cost", supplies == 4, None);

        self.setup();
        self.place(target(10, EnemyKind::Infantry), 10);
        self.play(10, CardKind::LightWeapon);
        let supplies = self.engine.supplies();
        self.record(LOGISTICS, "Standard Kill Reward", supplies == 6, None);

        self.setup();
        let cache = target(10, EnemyKind::Infantry).with_special(Special::SupplyDrop);
        self.place(cache, 10);
        self.play(10, CardKind::LightWeapon);
        let supplies = self.engine.supplies();
        self.record(LOGISTICS, "Supply Cache Reward", supplies == 9, None);

        self.setup();
        self.engine
            .debug_set_grid(vec![GridCell::labeled("A1", 10, EnemyKind::Infantry)]);
        self.engine.debug_set_routes(vec![route("R1", "Test", "A1")]);
        self.engine.debug_set_call(10);
        self.play(10, CardKind::LightWeapon);
        let supplies = self.engine.supplies();
        self.record(LOGISTICS, "Route Cut Reward", supplies == 8, None);

        self.setup();
        self.engine.debug_set_supplies(0);
        let _ = self.engine.emergency_resupply();
        let supplies = self.engine.supplies();
        self.record(LOGISTICS, "Emergency Drop Gain", supplies == 3, None);

        self.setup();
        self.engine
            .debug_set_hand(vec![Card::new(TEST_CARD, 1, CardKind::LightWeapon)]);
        self.engine.debug_set_supplies(0);
        let before = first_card_id(&self.engine);
        let _ = self.engine.recycle_hand();
        let after = first_card_id(&self.engine);
        let passed = before == after && self.engine.supplies() == 0;
        self.record(LOGISTICS, "Zero Supply Recycle Block", passed, None);
    }

    // Combat Protocols -----------------------------------------------------

    fn combat_protocols(&mut self) {
        for (enemy, weapon, kills, label) in COMBAT_CASES {
            self.setup();
            self.place(target(50, enemy), 50);
            self.play(50, weapon);
            let destroyed = self.is_daubed(50);
            let message = if destroyed {
                "Target Destroyed"
            } else {
                "Target Survived"
            };
            self.record(
                COMBAT_PROTOCOLS,
                label,
                kills == destroyed,
                Some(message.to_string()),
            );
        }
    }

    // Hand Lock ------------------------------------------------------------

    fn hand_lock(&mut self) {
        self.setup();
        self.place(target(20, EnemyKind::Infantry), 99);
        self.engine
            .debug_set_hand(vec![Card::new(TEST_CARD, 20, CardKind::LightWeapon)]);
        let logs_before = self.engine.logs().len();
        let outcome = self.engine.play_card(TEST_CARD);
        let logs_after = self.engine.logs().len();
        let warned = self
            .engine
            .logs()
            .head()
            .is_some_and(|entry| entry.text.contains("MISMATCH"));
        let passed = logs_after > logs_before && warned && !self.is_daubed(20);
        let message = outcome.rejection().map(|reason| reason.to_string());
        self.record(HAND_LOCK, "Prevent Mismatched Play", passed, message);
    }

    // Ghost Signal ---------------------------------------------------------

    fn ghost_signal(&mut self) {
        self.setup();
        self.engine.debug_set_grid(Vec::new());
        self.engine.debug_set_call(99);
        self.engine.debug_set_threat(10.0);
        self.play(99, CardKind::LightWeapon);
        let threat = self.threat();
        self.record(
            GHOST_SIGNAL,
            "Counter-Intel Execution",
            threat < 10.0,
            Some(format!("Threat: {threat}")),
        );
    }

    // Victory/Defeat -------------------------------------------------------

    fn victory_defeat(&mut self) {
        self.setup();
        let mut battle = self.engine.current_battle().clone();
        battle.routes_to_cut = 1;
        self.engine.debug_set_battle(battle);
        self.engine.debug_set_routes(vec![route("R1", "WinRoute", "T1")]);
        self.place(target(1, EnemyKind::Infantry), 1);
        self.play(1, CardKind::LightWeapon);
        let phase = self.engine.phase();
        self.record(
            VICTORY_DEFEAT,
            "Objective Complete Trigger",
            phase == GamePhase::Victory,
            Some(format!("Phase: {phase}")),
        );

        self.setup();
        self.engine.debug_set_phase(GamePhase::Playing);
        self.engine.debug_set_threat(100.0);
        self.clock.advance(self.engine.config().threat.tick_cadence());
        let _ = self.engine.tick();
        let phase = self.engine.phase();
        let passed = phase == GamePhase::Defeat && !self.engine.scheduler().is_running();
        if !passed {
            self.engine.debug_set_phase(GamePhase::Diagnostics);
        }
        self.record(
            VICTORY_DEFEAT,
            "Threat Overflow Trigger",
            passed,
            Some(format!("Phase: {phase}")),
        );
    }

    // Full Mission Sim -----------------------------------------------------

    fn full_mission_sim(&mut self) {
        self.setup();
        self.engine.debug_set_grid(vec![
            target(1, EnemyKind::Infantry),
            target(2, EnemyKind::Structure),
        ]);

        self.engine.debug_set_call(1);
        self.play(1, CardKind::LightWeapon);
        if self.engine.supplies() != 6 {
            let message = format!("Kill paid {} supplies", self.engine.supplies());
            self.record(FULL_MISSION_SIM, "Sequence Complete", false, Some(message));
            return;
        }

        self.engine.debug_set_call(2);
        self.play(2, CardKind::LightWeapon);
        if self.threat() <= 0.0 || self.is_daubed(2) {
            let message = "Failed attack went unpunished".to_string();
            self.record(FULL_MISSION_SIM, "Sequence Complete", false, Some(message));
            return;
        }

        self.engine.debug_set_call(2);
        self.play(2, CardKind::Explosive);
        let passed = self.is_daubed(1) && self.is_daubed(2);
        self.record(FULL_MISSION_SIM, "Sequence Complete", passed, None);
    }
}

fn target(value: u8, enemy: EnemyKind) -> GridCell {
    let mut cell = GridCell::labeled(format!("T{value}"), value, enemy);
    cell.is_objective = true;
    cell
}

fn route(id: &str, name: &str, coord: &str) -> Route {
    Route::new(id, name, RouteCoords::from_vec(vec![coord.to_string()]))
}

fn first_card_id(engine: &GameEngine) -> Option<String> {
    engine.hand().first().map(|card| card.id.clone())
}

fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}
