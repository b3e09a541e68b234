//! Objective routes and their cut tracking.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::grid::Grid;

/// Coordinates a route passes through. Routes are one grid line long.
pub type RouteCoords = SmallVec<[String; 6]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    pub coords: RouteCoords,
    pub is_cut: bool,
    /// Latched on the first cut so the reward is paid once per battle.
    #[serde(default)]
    reward_claimed: bool,
}

impl Route {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, coords: RouteCoords) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coords,
            is_cut: false,
            reward_claimed: false,
        }
    }

    /// Cut state implied by the grid: every coordinate daubed.
    #[must_use]
    pub fn is_severed_on(&self, grid: &Grid) -> bool {
        self.coords.iter().all(|coord| grid.is_daubed(coord))
    }

    #[must_use]
    pub const fn reward_claimed(&self) -> bool {
        self.reward_claimed
    }
}

/// Routes whose cut state flipped during one check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteReport {
    pub newly_cut: Vec<String>,
    pub cut_count: usize,
}

impl RouteReport {
    #[must_use]
    pub fn objective_met(&self, routes_to_cut: u8) -> bool {
        self.cut_count >= usize::from(routes_to_cut)
    }
}

/// Recompute every route's cut flag against the grid.
///
/// Only a first false-to-true transition is reported in `newly_cut`; the
/// caller pays rewards for exactly those names.
pub fn check_routes(routes: &mut [Route], grid: &Grid) -> RouteReport {
    let mut report = RouteReport::default();
    for route in routes.iter_mut() {
        let severed = route.is_severed_on(grid);
        if severed && !route.is_cut && !route.reward_claimed {
            route.reward_claimed = true;
            report.newly_cut.push(route.name.clone());
        }
        route.is_cut = severed;
        if severed {
            report.cut_count += 1;
        }
    }
    report
}

#[must_use]
pub fn cut_count(routes: &[Route]) -> usize {
    routes.iter().filter(|route| route.is_cut).count()
}
