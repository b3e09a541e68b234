//! Battlefield grid: numbered enemy positions.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::combat::EnemyKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Special {
    SupplyDrop,
    CommsTower,
}

/// Coordinate label: column letter then 1-based row, e.g. `C2`.
#[must_use]
pub fn coordinate_id(row: u8, col: u8) -> String {
    let letter = char::from(b'A'.saturating_add(col));
    format!("{letter}{}", u16::from(row) + 1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub id: String,
    pub row: u8,
    pub col: u8,
    pub value: u8,
    pub enemy_type: EnemyKind,
    pub is_daubed: bool,
    pub is_objective: bool,
    pub is_revealed: bool,
    #[serde(default)]
    pub special: Option<Special>,
}

impl GridCell {
    /// A fresh, untouched cell at the given coordinate.
    #[must_use]
    pub fn at(row: u8, col: u8, value: u8, enemy_type: EnemyKind) -> Self {
        Self {
            id: coordinate_id(row, col),
            row,
            col,
            value,
            enemy_type,
            is_daubed: false,
            is_objective: false,
            is_revealed: false,
            special: None,
        }
    }

    /// A free-standing cell with an explicit id, used for scenario construction.
    #[must_use]
    pub fn labeled(id: impl Into<String>, value: u8, enemy_type: EnemyKind) -> Self {
        Self {
            id: id.into(),
            ..Self::at(0, 0, value, enemy_type)
        }
    }

    #[must_use]
    pub fn with_special(mut self, special: Special) -> Self {
        self.special = Some(special);
        self
    }

    #[must_use]
    pub fn revealed(mut self) -> Self {
        self.is_revealed = true;
        self
    }
}

/// Ordered collection of cells for one battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Grid {
    cells: Vec<GridCell>,
}

impl Grid {
    #[must_use]
    pub const fn new(cells: Vec<GridCell>) -> Self {
        Self { cells }
    }

    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Index of the cell carrying `value`, daubed or not.
    #[must_use]
    pub fn index_of_value(&self, value: u8) -> Option<usize> {
        self.cells.iter().position(|cell| cell.value == value)
    }

    #[must_use]
    pub fn find_value(&self, value: u8) -> Option<&GridCell> {
        self.cells.iter().find(|cell| cell.value == value)
    }

    #[must_use]
    pub fn find_id(&self, id: &str) -> Option<&GridCell> {
        self.cells.iter().find(|cell| cell.id == id)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut GridCell> {
        self.cells.get_mut(index)
    }

    pub fn undaubed(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter().filter(|cell| !cell.is_daubed)
    }

    #[must_use]
    pub fn undaubed_count(&self) -> usize {
        self.undaubed().count()
    }

    /// Whether `value` still names a live target.
    #[must_use]
    pub fn has_live_value(&self, value: u8) -> bool {
        self.undaubed().any(|cell| cell.value == value)
    }

    /// Daub state of the cell with this id; unknown ids are never daubed.
    #[must_use]
    pub fn is_daubed(&self, id: &str) -> bool {
        self.find_id(id).is_some_and(|cell| cell.is_daubed)
    }

    pub(crate) fn mark_objectives(&mut self, objective_ids: &HashSet<&str>) {
        for cell in &mut self.cells {
            cell.is_objective = objective_ids.contains(cell.id.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_use_letter_then_row() {
        assert_eq!(coordinate_id(0, 0), "A1");
        assert_eq!(coordinate_id(3, 5), "F4");
    }

    #[test]
    fn lookups_respect_daub_state() {
        let mut grid = Grid::new(vec![
            GridCell::at(0, 0, 10, EnemyKind::Infantry),
            GridCell::at(0, 1, 20, EnemyKind::Heavy),
        ]);
        assert!(grid.has_live_value(10));
        grid.get_mut(0).unwrap().is_daubed = true;
        assert!(!grid.has_live_value(10));
        assert!(grid.find_value(10).is_some());
        assert!(grid.is_daubed("A1"));
        assert!(!grid.is_daubed("Z9"));
        assert_eq!(grid.undaubed_count(), 1);
        assert_eq!(grid.index_of_value(20), Some(1));
    }

    #[test]
    fn labeled_cells_keep_explicit_ids() {
        let cell = GridCell::labeled("T10", 10, EnemyKind::Structure)
            .with_special(Special::SupplyDrop)
            .revealed();
        assert_eq!(cell.id, "T10");
        assert_eq!(cell.special, Some(Special::SupplyDrop));
        assert!(cell.is_revealed);
    }
}
