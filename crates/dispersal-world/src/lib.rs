//! World simulation engine.
//!
//! This module implements the cellular automaton in which a population
//! colonizes and abandons habitat cells, carrying a drifting genotype.

pub mod cell;
pub mod grid;
pub mod snapshot;
pub mod world;
pub mod landscape;
pub mod ensemble;

pub use cell::{Cell, CellInfo, Descent, Lineage, Occupancy, UpdateOutcome};
pub use grid::Grid;
pub use snapshot::Snapshot;
pub use world::{StepSummary, World};
pub use landscape::{Habitat, Landscape, Raster};
pub use ensemble::{DensityMap, Ensemble};
