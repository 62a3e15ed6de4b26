//! Frozen whole-grid view taken at the start of a step.

use crate::cell::CellInfo;
use crate::grid::Grid;
use dispersal_core::{Boundary, Neighborhood, Position};

/// Immutable per-step view of every cell. Inactive positions are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    step: u64,
    cells: Grid<Option<CellInfo>>,
}

impl Snapshot {
    pub(crate) fn new(step: u64, cells: Grid<Option<CellInfo>>) -> Self {
        Self { step, cells }
    }

    /// Step counter of the world when the snapshot was taken
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn rows(&self) -> usize {
        self.cells.rows()
    }

    pub fn cols(&self) -> usize {
        self.cells.cols()
    }

    pub fn get(&self, pos: Position) -> Option<&CellInfo> {
        self.cells.get(pos).and_then(Option::as_ref)
    }

    /// Records of active, occupied cells in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = &CellInfo> + '_ {
        self.cells
            .iter()
            .filter_map(|(_, info)| info.as_ref())
            .filter(|info| info.occupied)
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied().count()
    }

    /// Neighbor records of `pos`, one slot per offset of `neighborhood`.
    ///
    /// A slot is `None` for inactive cells and for offsets that leave a
    /// closed grid.
    pub fn neighbor_info(
        &self,
        pos: Position,
        neighborhood: Neighborhood,
        boundary: Boundary,
    ) -> Vec<Option<&CellInfo>> {
        self.cells
            .neighbor_slots(pos, neighborhood, boundary)
            .map(|slot| slot.and_then(|p| self.get(p)))
            .collect()
    }
}
