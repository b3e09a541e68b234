//! Combat resolution: the weapon/enemy effectiveness matrix.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of enemy position a grid cell can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnemyKind {
    Heavy,
    Infantry,
    Structure,
}

impl EnemyKind {
    pub const ALL: [Self; 3] = [Self::Heavy, Self::Infantry, Self::Structure];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heavy => "HEAVY",
            Self::Infantry => "INFANTRY",
            Self::Structure => "STRUCTURE",
        }
    }

    /// The weapon that reliably kills this enemy kind.
    ///
    /// Shared by the resolver and the hand composer so the bias toward
    /// "correct" cards can never drift from the actual matrix.
    #[must_use]
    pub const fn counter(self) -> CardKind {
        match self {
            Self::Heavy => CardKind::HeavyWeapon,
            Self::Infantry => CardKind::LightWeapon,
            Self::Structure => CardKind::Explosive,
        }
    }

    /// HEAVY and STRUCTURE positions are worth more threat relief when destroyed.
    #[must_use]
    pub const fn is_armored(self) -> bool {
        matches!(self, Self::Heavy | Self::Structure)
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Card kinds: four weapons plus the non-combat INTEL card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardKind {
    HeavyWeapon,
    LightWeapon,
    Explosive,
    Airstrike,
    Intel,
}

impl CardKind {
    /// Weapons drawn uniformly when no better choice is available.
    pub const BASE_WEAPONS: [Self; 3] = [Self::HeavyWeapon, Self::LightWeapon, Self::Explosive];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeavyWeapon => "HEAVY_WEAPON",
            Self::LightWeapon => "LIGHT_WEAPON",
            Self::Explosive => "EXPLOSIVE",
            Self::Airstrike => "AIRSTRIKE",
            Self::Intel => "INTEL",
        }
    }

    #[must_use]
    pub const fn is_weapon(self) -> bool {
        !matches!(self, Self::Intel)
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatOutcome {
    Kill,
    Fail,
}

/// Weapon kinds accepted by [`resolve`]. INTEL is handled by the action
/// sequencer and never reaches the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weapon(CardKind);

impl Weapon {
    #[must_use]
    pub const fn new(kind: CardKind) -> Option<Self> {
        if kind.is_weapon() {
            Some(Self(kind))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn kind(self) -> CardKind {
        self.0
    }
}

/// Resolve a weapon against an enemy position.
#[must_use]
pub const fn resolve(weapon: Weapon, enemy: EnemyKind) -> CombatOutcome {
    match (weapon.0, enemy) {
        (CardKind::Airstrike, _)
        | (CardKind::HeavyWeapon | CardKind::Explosive, EnemyKind::Heavy | EnemyKind::Structure)
        | (CardKind::LightWeapon, EnemyKind::Infantry) => CombatOutcome::Kill,
        _ => CombatOutcome::Fail,
    }
}

/// Player-facing reason attached to a failed attack.
#[must_use]
pub const fn failure_reason(weapon: Weapon, enemy: EnemyKind) -> &'static str {
    if matches!(weapon.0, CardKind::LightWeapon) && matches!(enemy, EnemyKind::Heavy) {
        "Ricochet"
    } else {
        "Ineffective"
    }
}
