//! Campaign content: factions and their ordered battle records.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use crate::combat::EnemyKind;
use crate::constants::MAX_GRID_CELLS;

const STATIC_CAMPAIGNS: &str = include_str!("../assets/campaigns.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Faction {
    #[default]
    Allies,
    Axis,
}

impl Faction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allies => "ALLIES",
            Self::Axis => "AXIS",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single battle record. Display fields are opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub description: String,
    pub difficulty_multiplier: f64,
    #[serde(default)]
    pub background_theme: String,
    pub grid_rows: u8,
    pub grid_cols: u8,
    pub allowed_enemies: Vec<EnemyKind>,
    pub routes_to_cut: u8,
    #[serde(default)]
    pub intro_tip: String,
}

impl Battle {
    #[must_use]
    pub fn cell_count(&self) -> usize {
        usize::from(self.grid_rows) * usize::from(self.grid_cols)
    }

    /// Number of objective routes the map generator builds for this shape.
    ///
    /// Alpha (first column) always exists, Bravo (last column) needs more
    /// than two columns, Charlie (middle row interior) is only laid when the
    /// battle asks for more than two routes and has more than three columns.
    #[must_use]
    pub const fn route_capacity(&self) -> u8 {
        let mut routes = 1;
        if self.grid_cols > 2 {
            routes += 1;
        }
        if self.routes_to_cut > 2 && self.grid_cols > 3 {
            routes += 1;
        }
        routes
    }

    /// Check the authoring invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] naming the first violated invariant.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(CatalogError::EmptyGrid {
                battle: self.id.clone(),
            });
        }
        if self.cell_count() > MAX_GRID_CELLS {
            return Err(CatalogError::GridTooLarge {
                battle: self.id.clone(),
                cells: self.cell_count(),
            });
        }
        if self.allowed_enemies.is_empty() {
            return Err(CatalogError::NoEnemies {
                battle: self.id.clone(),
            });
        }
        if !self.difficulty_multiplier.is_finite() || self.difficulty_multiplier < 0.0 {
            return Err(CatalogError::Difficulty {
                battle: self.id.clone(),
                value: self.difficulty_multiplier,
            });
        }
        if self.routes_to_cut > self.route_capacity() {
            return Err(CatalogError::RoutesUnreachable {
                battle: self.id.clone(),
                required: self.routes_to_cut,
                available: self.route_capacity(),
            });
        }
        Ok(())
    }
}

/// Errors raised when campaign content violates engine invariants.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("campaign JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{faction} campaign has no battles")]
    EmptyCampaign { faction: Faction },
    #[error("battle {battle} has an empty grid")]
    EmptyGrid { battle: String },
    #[error("battle {battle} needs {cells} cells but only 99 unique values exist")]
    GridTooLarge { battle: String, cells: usize },
    #[error("battle {battle} allows no enemy kinds")]
    NoEnemies { battle: String },
    #[error("battle {battle} has invalid difficulty {value}")]
    Difficulty { battle: String, value: f64 },
    #[error("battle {battle} requires {required} routes but its grid only yields {available}")]
    RoutesUnreachable {
        battle: String,
        required: u8,
        available: u8,
    },
}

/// Ordered battle lists for both factions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BattleCatalog {
    allies: Vec<Battle>,
    axis: Vec<Battle>,
}

impl BattleCatalog {
    /// Build a catalog from explicit campaigns.
    ///
    /// # Errors
    ///
    /// Returns an error if either campaign is empty or any battle is invalid.
    pub fn new(allies: Vec<Battle>, axis: Vec<Battle>) -> Result<Self, CatalogError> {
        let catalog = Self { allies, axis };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate campaign content.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or violates an invariant.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load the campaigns bundled with the crate.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(STATIC_CAMPAIGNS).unwrap_or_else(|err| {
            log::error!("bundled campaigns rejected: {err}");
            Self::default()
        })
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for faction in [Faction::Allies, Faction::Axis] {
            let campaign = self.campaign(faction);
            if campaign.is_empty() {
                return Err(CatalogError::EmptyCampaign { faction });
            }
            campaign.iter().try_for_each(Battle::validate)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn campaign(&self, faction: Faction) -> &[Battle] {
        match faction {
            Faction::Allies => &self.allies,
            Faction::Axis => &self.axis,
        }
    }

    #[must_use]
    pub fn battle(&self, faction: Faction, index: usize) -> Option<&Battle> {
        self.campaign(faction).get(index)
    }
}

/// Shared bundled catalog.
#[must_use]
pub fn campaigns() -> &'static BattleCatalog {
    static CATALOG: OnceLock<BattleCatalog> = OnceLock::new();
    CATALOG.get_or_init(BattleCatalog::load_from_static)
}
