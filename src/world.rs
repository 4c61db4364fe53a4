use crate::Pos;

/// Health state of one cell. `Healthy` is the implicit default of every
/// coordinate absent from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    Healthy,
    Infected,
    Dead,
    Recovered,
}

/// A cell's state together with its remaining infection ticks. The timer is
/// only meaningful while infected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub state: CellState,
    pub timer: u32,
}

impl Cell {
    pub fn healthy() -> Self {
        Self {
            state: CellState::Healthy,
            timer: 0,
        }
    }

    pub fn infected(timer: u32) -> Self {
        Self {
            state: CellState::Infected,
            timer,
        }
    }

    pub fn dead() -> Self {
        Self {
            state: CellState::Dead,
            timer: 0,
        }
    }

    pub fn recovered() -> Self {
        Self {
            state: CellState::Recovered,
            timer: 0,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::healthy()
    }
}

/// Tally of stored cells by state. There is no healthy field: over an
/// unbounded plane the healthy population is not a number, so only the
/// deviations from it are countable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub infected: usize,
    pub dead: usize,
    pub recovered: usize,
}

pub trait World: Default + Clone + Send + 'static {
    /// Total over all of the plane; absent coordinates are healthy.
    fn get(&self, pos: Pos) -> Cell;
    /// Upserts a cell; setting `Healthy` removes the entry.
    fn set(&mut self, pos: Pos, cell: Cell);
    /// Every stored (non-healthy) coordinate.
    fn actives(&self) -> Vec<Pos>;
    fn counts(&self) -> StateCounts;
}

pub use sparse_world::SparseWorld;
mod sparse_world;
