//! Battlefield generation: unique-valued grid, specials, and objective routes.
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::catalog::Battle;
use crate::combat::EnemyKind;
use crate::constants::{
    COMMS_TOWER_DIFFICULTY, SUPPLY_DROPS_MAX, SUPPLY_DROPS_MIN, VALUE_POOL_MAX, VALUE_POOL_MIN,
};
use crate::grid::{Grid, GridCell, Special, coordinate_id};
use crate::routes::{Route, RouteCoords};

/// Freshly generated grid plus the routes laid across it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battlefield {
    pub grid: Grid,
    pub routes: Vec<Route>,
}

/// Build the battlefield for `battle`.
pub fn generate_map<R>(battle: &Battle, rng: &mut R) -> Battlefield
where
    R: Rng + ?Sized,
{
    let mut pool: Vec<u8> = (VALUE_POOL_MIN..=VALUE_POOL_MAX).collect();
    pool.shuffle(rng);
    let mut values = pool.into_iter();

    let mut cells = Vec::with_capacity(battle.cell_count());
    'rows: for row in 0..battle.grid_rows {
        for col in 0..battle.grid_cols {
            let Some(value) = values.next() else {
                break 'rows;
            };
            let enemy = battle
                .allowed_enemies
                .choose(rng)
                .copied()
                .unwrap_or(EnemyKind::Infantry);
            cells.push(GridCell::at(row, col, value, enemy));
        }
    }

    let drops = rng.gen_range(SUPPLY_DROPS_MIN..=SUPPLY_DROPS_MAX);
    for _ in 0..drops {
        place_special(&mut cells, Special::SupplyDrop, rng);
    }
    if battle.difficulty_multiplier > COMMS_TOWER_DIFFICULTY {
        place_special(&mut cells, Special::CommsTower, rng);
    }

    let routes = build_routes(battle);
    let mut grid = Grid::new(cells);
    let objective_ids: HashSet<&str> = routes
        .iter()
        .flat_map(|route| route.coords.iter().map(String::as_str))
        .collect();
    grid.mark_objectives(&objective_ids);

    log::debug!(
        "generated {} ({}x{}): {} cells, {} routes",
        battle.id,
        battle.grid_rows,
        battle.grid_cols,
        grid.len(),
        routes.len()
    );
    Battlefield { grid, routes }
}

fn place_special<R>(cells: &mut [GridCell], special: Special, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let open: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.special.is_none())
        .map(|(idx, _)| idx)
        .collect();
    if let Some(&idx) = open.choose(rng) {
        cells[idx].special = Some(special);
    }
}

/// Lay Alpha (first column), Bravo (last column) and Charlie (middle row
/// interior) according to the battle's shape; see [`Battle::route_capacity`].
#[must_use]
pub fn build_routes(battle: &Battle) -> Vec<Route> {
    let rows = battle.grid_rows;
    let cols = battle.grid_cols;
    let column = |col: u8| -> RouteCoords { (0..rows).map(|row| coordinate_id(row, col)).collect() };

    let mut routes = vec![Route::new("R1", "Alpha Line", column(0))];
    if cols > 2 {
        routes.push(Route::new("R2", "Bravo Supply", column(cols - 1)));
    }
    if battle.routes_to_cut > 2 && cols > 3 {
        let mid_row = rows / 2;
        let coords = (1..cols - 1).map(|col| coordinate_id(mid_row, col)).collect();
        routes.push(Route::new("R3", "Charlie Train", coords));
    }
    routes
}
