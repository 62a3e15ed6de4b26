//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Heritable trait vector, rendered as a color. Components live in `[0, 255]`.
pub type Genotype = [f64; 3];

/// Per-step genetic displacement carried by a lineage.
pub type DriftVector = [f64; 3];

pub const GENOTYPE_MIN: f64 = 0.0;
pub const GENOTYPE_MAX: f64 = 255.0;

/// Grid coordinate, addressed as (row, col)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset this position on a `rows` x `cols` grid.
    ///
    /// Returns `None` when the result falls off a closed grid. On a toroidal
    /// grid the result always exists.
    pub fn offset(
        &self,
        d_row: isize,
        d_col: isize,
        rows: usize,
        cols: usize,
        boundary: Boundary,
    ) -> Option<Self> {
        match boundary {
            Boundary::Closed => {
                let row = self.row.checked_add_signed(d_row)?;
                let col = self.col.checked_add_signed(d_col)?;
                (row < rows && col < cols).then_some(Self { row, col })
            }
            Boundary::Toroidal => Some(Self {
                row: wrap(self.row as isize + d_row, rows),
                col: wrap(self.col as isize + d_col, cols),
            }),
        }
    }

    /// Whether this position lies inside a `rows` x `cols` grid
    pub fn within(&self, rows: usize, cols: usize) -> bool {
        self.row < rows && self.col < cols
    }
}

fn wrap(value: isize, size: usize) -> usize {
    value.rem_euclid(size as isize) as usize
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Neighbor topology used when stepping a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// All 8 surrounding cells.
    #[default]
    Moore,
    /// Five-cell asymmetric pattern: the row above (left and center), both
    /// horizontal neighbors, and the cell directly below. Not a true hexagon.
    Hex,
}

const MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const HEX_OFFSETS: [(isize, isize); 5] = [(-1, -1), (-1, 0), (0, -1), (0, 1), (1, 0)];

impl Neighborhood {
    /// (row, col) offsets in the order neighbor records are handed to a cell
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Neighborhood::Moore => &MOORE_OFFSETS,
            Neighborhood::Hex => &HEX_OFFSETS,
        }
    }
}

/// What happens to neighbor lookups that leave the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Off-grid neighbors are absent.
    #[default]
    Closed,
    /// Neighbors wrap around the opposite edge.
    Toroidal,
}

/// 8-bit RGB color as read from an environment raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "rgb({}, {}, {})", r, g, b)
    }
}
