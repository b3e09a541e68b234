//! Call broadcaster: picks the next target value announced to the player.
use rand::Rng;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

use crate::config::BroadcastConfig;
use crate::constants::{VALUE_POOL_MAX, VALUE_POOL_MIN};
use crate::grid::Grid;
use crate::numbers::probability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Broadcast {
    /// Value of a live cell.
    Call(u8),
    /// Value with no grid position at all.
    Ghost(u8),
    /// Every cell is daubed; nothing left to call.
    Exhausted,
}

impl Broadcast {
    #[must_use]
    pub const fn value(self) -> Option<u8> {
        match self {
            Self::Call(value) | Self::Ghost(value) => Some(value),
            Self::Exhausted => None,
        }
    }

    #[must_use]
    pub const fn is_ghost(self) -> bool {
        matches!(self, Self::Ghost(_))
    }
}

/// Ghost probability for a difficulty tier.
#[must_use]
pub fn ghost_chance(cfg: &BroadcastConfig, difficulty: f64) -> f64 {
    if difficulty > cfg.ghost_min_difficulty {
        probability(cfg.ghost_chance)
    } else {
        0.0
    }
}

/// Select the next call for `grid`.
///
/// Ghosts are drawn only from pool values with no cell on the grid, never
/// uniformly over 1..=99, so a ghost cannot repeat an already daubed value.
pub fn next_call<R>(grid: &Grid, difficulty: f64, cfg: &BroadcastConfig, rng: &mut R) -> Broadcast
where
    R: Rng + ?Sized,
{
    if grid.undaubed_count() == 0 {
        return Broadcast::Exhausted;
    }
    if rng.gen_bool(ghost_chance(cfg, difficulty)) {
        let ghost = (VALUE_POOL_MIN..=VALUE_POOL_MAX)
            .filter(|&value| grid.index_of_value(value).is_none())
            .choose(rng);
        if let Some(value) = ghost {
            return Broadcast::Ghost(value);
        }
    }
    grid.undaubed()
        .choose(rng)
        .map_or(Broadcast::Exhausted, |cell| Broadcast::Call(cell.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::EnemyKind;
    use crate::grid::GridCell;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn grid() -> Grid {
        let mut grid = Grid::new(vec![
            GridCell::at(0, 0, 11, EnemyKind::Infantry),
            GridCell::at(0, 1, 22, EnemyKind::Heavy),
            GridCell::at(0, 2, 33, EnemyKind::Structure),
        ]);
        grid.get_mut(1).unwrap().is_daubed = true;
        grid
    }

    #[test]
    fn easy_tiers_only_call_live_cells() {
        let grid = grid();
        let cfg = BroadcastConfig::default();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        for _ in 0..500 {
            match next_call(&grid, 1.0, &cfg, &mut rng) {
                Broadcast::Call(value) => assert!(value == 11 || value == 33),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn hard_tiers_emit_some_ghosts() {
        let grid = grid();
        let cfg = BroadcastConfig::default();
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let ghosts = (0..1_000)
            .filter(|_| next_call(&grid, 1.6, &cfg, &mut rng).is_ghost())
            .count();
        assert!((80..=230).contains(&ghosts), "ghosts {ghosts}");
    }

    #[test]
    fn ghosts_never_land_on_grid_values() {
        let grid = grid();
        let cfg = BroadcastConfig {
            ghost_chance: 1.0,
            ..BroadcastConfig::default()
        };
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        for _ in 0..500 {
            let call = next_call(&grid, 2.2, &cfg, &mut rng);
            assert!(call.is_ghost());
            assert!(grid.find_value(call.value().unwrap()).is_none());
        }
    }

    #[test]
    fn exhausted_grid_signals_completion() {
        let mut grid = grid();
        for idx in 0..grid.len() {
            grid.get_mut(idx).unwrap().is_daubed = true;
        }
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let call = next_call(&grid, 2.2, &BroadcastConfig::default(), &mut rng);
        assert_eq!(call, Broadcast::Exhausted);
        assert_eq!(call.value(), None);
        assert_eq!(
            next_call(&Grid::default(), 0.5, &BroadcastConfig::default(), &mut rng),
            Broadcast::Exhausted
        );
    }

    #[test]
    fn ghost_chance_is_gated_by_difficulty() {
        let cfg = BroadcastConfig::default();
        assert!(ghost_chance(&cfg, 1.0).abs() < f64::EPSILON);
        assert!((ghost_chance(&cfg, 1.01) - 0.15).abs() < f64::EPSILON);
    }
}
