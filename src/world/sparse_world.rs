use std::collections::HashMap;

use metrohash::MetroBuildHasher;

use crate::{Cell, CellState, Pos, StateCounts, World};

#[cfg(test)]
use crate::pos;

/// Sparse store over the unbounded plane. Only cells that deviate from the
/// healthy default are kept, so memory tracks the outbreak's extent rather
/// than the (infinite) world size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseWorld {
    cells: HashMap<Pos, Cell, MetroBuildHasher>,
}

impl SparseWorld {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl World for SparseWorld {
    fn get(&self, pos: Pos) -> Cell {
        self.cells.get(&pos).copied().unwrap_or_default()
    }

    fn set(&mut self, pos: Pos, cell: Cell) {
        if cell.state == CellState::Healthy {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, cell);
        }
    }

    fn actives(&self) -> Vec<Pos> {
        self.cells.keys().copied().collect()
    }

    fn counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for cell in self.cells.values() {
            match cell.state {
                CellState::Infected => counts.infected += 1,
                CellState::Dead => counts.dead += 1,
                CellState::Recovered => counts.recovered += 1,
                // never stored, `set` removes healthy cells
                CellState::Healthy => {}
            }
        }
        counts
    }
}

#[test]
fn test_get_defaults_to_healthy() {
    let world = SparseWorld::default();
    assert_eq!(world.get(pos!(1_000_000, -1_000_000)), Cell::healthy());
    assert!(world.is_empty());
}

#[test]
fn test_set_healthy_removes_entry() {
    let mut world = SparseWorld::default();
    world.set(pos!(2, 3), Cell::infected(7));
    assert_eq!(world.len(), 1);

    world.set(pos!(2, 3), Cell::healthy());
    assert!(world.is_empty());
    assert_eq!(world.get(pos!(2, 3)), Cell::healthy());
}

#[test]
fn test_counts_tally_stored_states() {
    let mut world = SparseWorld::default();
    world.set(pos!(0, 0), Cell::infected(5));
    world.set(pos!(1, 0), Cell::infected(2));
    world.set(pos!(0, 1), Cell::dead());
    world.set(pos!(-4, 9), Cell::recovered());

    let counts = world.counts();
    assert_eq!(counts.infected, 2);
    assert_eq!(counts.dead, 1);
    assert_eq!(counts.recovered, 1);
}
