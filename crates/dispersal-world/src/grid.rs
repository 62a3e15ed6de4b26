//! 2D grid storage shared by worlds, snapshots and aggregate maps.

use dispersal_core::{Boundary, Error, Neighborhood, Position, Result};
use serde::{Deserialize, Serialize};

/// A fixed-size row-major grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![fill; rows * cols],
        }
    }
}

impl<T> Grid<T> {
    /// Build a grid by evaluating `f` at every position in row-major order
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(Position) -> T) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(f(Position::new(row, col)));
            }
        }
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.within(self.rows, self.cols)
    }

    pub fn get(&self, pos: Position) -> Option<&T> {
        if !self.contains(pos) {
            return None;
        }
        let index = self.pos_to_index(pos);
        self.cells.get(index)
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut T> {
        if !self.contains(pos) {
            return None;
        }
        let index = self.pos_to_index(pos);
        self.cells.get_mut(index)
    }

    /// Like [`Grid::get`], but reports an out-of-bounds error
    pub fn try_get(&self, pos: Position) -> Result<&T> {
        let (rows, cols) = (self.rows, self.cols);
        self.get(pos).ok_or(Error::OutOfBounds {
            position: pos,
            rows,
            cols,
        })
    }

    /// Like [`Grid::get_mut`], but reports an out-of-bounds error
    pub fn try_get_mut(&mut self, pos: Position) -> Result<&mut T> {
        let (rows, cols) = (self.rows, self.cols);
        self.get_mut(pos).ok_or(Error::OutOfBounds {
            position: pos,
            rows,
            cols,
        })
    }

    /// Neighbor slots of a position, one per offset of `neighborhood`.
    ///
    /// A slot is `None` when its offset leaves a closed grid.
    pub fn neighbor_slots(
        &self,
        pos: Position,
        neighborhood: Neighborhood,
        boundary: Boundary,
    ) -> impl Iterator<Item = Option<Position>> + '_ {
        neighborhood
            .offsets()
            .iter()
            .map(move |&(d_row, d_col)| pos.offset(d_row, d_col, self.rows, self.cols, boundary))
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        pos.row * self.cols + pos.col
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        Position::new(index / self.cols, index % self.cols)
    }

    /// Iterator over all positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(move |i| self.index_to_pos(i))
    }

    /// Iterator over all cells with positions, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell))
    }

    /// Row slices, top to bottom
    pub fn row_slices(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.cells.chunks(self.cols.max(1))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Position, &T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            cells: self.iter().map(|(pos, cell)| f(pos, cell)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(4, 6, 0u8);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.cols(), 6);
        assert_eq!(grid.len(), 24);
    }

    #[test]
    fn test_row_major_layout() {
        let grid = Grid::from_fn(3, 4, |pos| pos.row * 10 + pos.col);
        assert_eq!(grid.get(Position::new(2, 3)), Some(&23));
        assert_eq!(grid.index_to_pos(5), Position::new(1, 1));

        let order: Vec<_> = grid.positions().take(5).collect();
        assert_eq!(order[4], Position::new(1, 0));

        let rows: Vec<Vec<usize>> = grid.row_slices().map(|r| r.to_vec()).collect();
        assert_eq!(rows[1], vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = Grid::new(3, 3, 0);
        assert!(grid.get(Position::new(3, 0)).is_none());
        assert!(grid.get_mut(Position::new(0, 3)).is_none());

        let err = grid.try_get(Position::new(5, 5)).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfBounds { rows: 3, cols: 3, .. }
        ));
    }

    #[test]
    fn test_neighbors() {
        let grid = Grid::new(10, 10, ());
        let pos = Position::new(5, 5);

        let moore: Vec<_> = grid
            .neighbor_slots(pos, Neighborhood::Moore, Boundary::Closed)
            .collect();
        // Should have 8 neighbors
        assert_eq!(moore.len(), 8);
        assert!(moore.iter().all(Option::is_some));

        let hex: Vec<_> = grid
            .neighbor_slots(pos, Neighborhood::Hex, Boundary::Closed)
            .flatten()
            .collect();
        assert_eq!(
            hex,
            vec![
                Position::new(4, 4),
                Position::new(4, 5),
                Position::new(5, 4),
                Position::new(5, 6),
                Position::new(6, 5),
            ]
        );
    }

    #[test]
    fn test_edge_neighbors() {
        let grid = Grid::new(10, 10, ());
        let corner = Position::new(0, 0);

        let closed: Vec<_> = grid
            .neighbor_slots(corner, Neighborhood::Moore, Boundary::Closed)
            .flatten()
            .collect();
        assert_eq!(closed.len(), 3);

        let toroidal: Vec<_> = grid
            .neighbor_slots(corner, Neighborhood::Moore, Boundary::Toroidal)
            .flatten()
            .collect();
        assert_eq!(toroidal.len(), 8);
        assert!(toroidal.contains(&Position::new(9, 9)));
    }

    #[test]
    fn test_map() {
        let grid = Grid::from_fn(2, 2, |pos| pos.col);
        let doubled = grid.map(|_, v| v * 2);
        assert_eq!(doubled.get(Position::new(1, 1)), Some(&2));
    }
}
