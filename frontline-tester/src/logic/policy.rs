use std::fmt;

use clap::ValueEnum;
use frontline_game::{CardKind, CombatOutcome, EnemyKind, GameEngine, GridCell, Weapon, resolve};

/// Action chosen by a [`PlayerPolicy`] for the current engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    Play(String),
    Recycle,
    EmergencyResupply,
    Wait,
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the next move while the engine is in live play.
    fn decide(&mut self, engine: &GameEngine) -> Move;
}

/// Built-in strategies for campaign runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Strategy {
    /// Knows every enemy type and only fires winning cards.
    Greedy,
    /// Plays the first card matching the call, whatever it is.
    Reckless,
}

impl Strategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::Reckless => "reckless",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Reckless => Box::new(RecklessPolicy),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyPolicy;

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn decide(&mut self, engine: &GameEngine) -> Move {
        let Some(call) = engine.current_call() else {
            return Move::Wait;
        };
        let target = engine.grid().find_value(call);
        let matching = engine.hand().iter().filter(|card| card.value == call);

        let mut intel = None;
        for card in matching {
            match target {
                None => return Move::Play(card.id.clone()),
                Some(cell) if wins(card.kind, cell) => return Move::Play(card.id.clone()),
                Some(_) if card.kind == CardKind::Intel => intel = Some(card.id.clone()),
                Some(_) => {}
            }
        }
        intel.map_or_else(|| restock(engine), Move::Play)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RecklessPolicy;

impl PlayerPolicy for RecklessPolicy {
    fn name(&self) -> &'static str {
        "Reckless"
    }

    fn decide(&mut self, engine: &GameEngine) -> Move {
        let Some(call) = engine.current_call() else {
            return Move::Wait;
        };
        engine
            .hand()
            .iter()
            .find(|card| card.value == call)
            .map_or_else(|| restock(engine), |card| Move::Play(card.id.clone()))
    }
}

/// Whether `kind` destroys `cell` outright. Intel only counts against
/// unrevealed structures (sabotage).
fn wins(kind: CardKind, cell: &GridCell) -> bool {
    match Weapon::new(kind) {
        Some(weapon) => resolve(weapon, cell.enemy_type) == CombatOutcome::Kill,
        None => cell.enemy_type == EnemyKind::Structure && !cell.is_revealed,
    }
}

/// Nothing useful in hand: cycle it, or call in a drop when dry.
fn restock(engine: &GameEngine) -> Move {
    if engine.supplies() >= engine.config().economy.recycle_cost {
        Move::Recycle
    } else if engine.supplies() == 0 {
        Move::EmergencyResupply
    } else {
        Move::Wait
    }
}
