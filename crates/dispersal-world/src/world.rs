//! World grid and the synchronous stepping algorithm.

use crate::cell::{Cell, Descent, Lineage, UpdateOutcome};
use crate::grid::Grid;
use crate::snapshot::Snapshot;
use dispersal_core::{
    check_probability, Error, Genotype, Position, Result, SimulationConfig, GENOTYPE_MAX,
    GENOTYPE_MIN,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Effect of one occupied cell's update, applied after the evaluation phase
#[derive(Debug)]
struct Effect {
    source: Position,
    /// Source lineage as it was in the snapshot
    lineage: Option<Lineage>,
    outcome: UpdateOutcome,
}

/// Counts describing one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Step counter after the step completed
    pub step: u64,
    /// Successful colonization attempts, including overwritten ones
    pub colonizations: usize,
    /// Colonizations that landed on a cell already colonized this step
    pub collisions: usize,
    pub extinctions: usize,
    /// Occupied cells after the step
    pub occupied: usize,
}

pub struct World {
    cells: Grid<Cell>,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    step_count: u64,
}

impl World {
    /// Create a world of inactive placeholder cells, shaped by `config.world`
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let cells = Grid::new(config.world.rows, config.world.cols, Cell::inactive());

        Ok(Self {
            cells,
            config,
            rng,
            step_count: 0,
        })
    }

    pub fn rows(&self) -> usize {
        self.cells.rows()
    }

    pub fn cols(&self) -> usize {
        self.cells.cols()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Place a cell with fixed environment parameters at `pos`.
    ///
    /// Active cells need both probabilities; inactive cells ignore them.
    pub fn create_cell(
        &mut self,
        pos: Position,
        active: bool,
        p_ext: Option<f64>,
        p_col: Option<f64>,
    ) -> Result<()> {
        if self.step_count > 0 {
            return Err(Error::InvalidState(format!(
                "cannot create cell {} after stepping has started",
                pos
            )));
        }

        let cell = if active {
            let (Some(p_ext), Some(p_col)) = (p_ext, p_col) else {
                return Err(Error::Validation(format!(
                    "active cell {} needs both extinction and colonization probabilities",
                    pos
                )));
            };
            check_probability("p_ext", p_ext)?;
            check_probability("p_col", p_col)?;
            Cell::active(p_ext, p_col)
        } else {
            Cell::inactive()
        };

        *self.cells.try_get_mut(pos)? = cell;
        Ok(())
    }

    /// Occupy an active cell with a founder
    pub fn populate(&mut self, pos: Position) -> Result<()> {
        let descent = if self.config.genetics.enabled {
            let genotype = match self.config.genetics.founder_genotype {
                Some(genotype) => genotype,
                None => random_genotype(&mut self.rng),
            };
            Descent::Founder(genotype)
        } else {
            Descent::Neutral
        };

        self.cells
            .try_get_mut(pos)?
            .become_occupied(descent, &self.config.genetics, &mut self.rng)
            .map_err(|e| match e {
                Error::InvalidState(_) => {
                    Error::InvalidState(format!("cannot populate inactive cell {}", pos))
                }
                other => other,
            })?;
        debug!(position = %pos, "Seeded founder");
        Ok(())
    }

    /// Advance every cell by one synchronous generation.
    ///
    /// All updates read from one snapshot; colonizations and deaths are
    /// applied afterwards. Colonizations apply in row-major order of their
    /// source cell, so when two sources hit the same target the later one
    /// wins.
    pub fn step(&mut self) -> Result<StepSummary> {
        let snapshot = self.get_current_state();
        let neighborhood = self.config.world.neighborhood;
        let boundary = self.config.world.boundary;

        let mut effects = Vec::with_capacity(snapshot.occupied_count());
        for info in snapshot.occupied() {
            let neighbors = snapshot.neighbor_info(info.location, neighborhood, boundary);
            let outcome = self.cells.try_get_mut(info.location)?.update(
                &neighbors,
                &self.config.genetics,
                &self.config.dynamics,
                &mut self.rng,
            )?;
            effects.push(Effect {
                source: info.location,
                lineage: info.lineage.clone(),
                outcome,
            });
        }

        let mut summary = StepSummary::default();
        let mut colonized = HashSet::new();
        for effect in &effects {
            let Some(target) = effect.outcome.colonized else {
                continue;
            };
            if !colonized.insert(target) {
                summary.collisions += 1;
                trace!(source = %effect.source, target = %target, "Colonization overwrites earlier arrival");
            }
            let descent = match &effect.lineage {
                Some(lineage) => Descent::Inherited(lineage.clone()),
                None => Descent::Neutral,
            };
            self.cells.try_get_mut(target)?.become_occupied(
                descent,
                &self.config.genetics,
                &mut self.rng,
            )?;
            summary.colonizations += 1;
        }

        for effect in effects.iter().filter(|e| e.outcome.died) {
            self.cells.try_get_mut(effect.source)?.become_extinct()?;
            summary.extinctions += 1;
        }

        self.step_count += 1;
        summary.step = self.step_count;
        summary.occupied = self.occupied_count();

        debug!(
            step = summary.step,
            colonizations = summary.colonizations,
            collisions = summary.collisions,
            extinctions = summary.extinctions,
            occupied = summary.occupied,
            "Step complete"
        );

        Ok(summary)
    }

    /// Snapshot of every cell's public state, tagged with its location
    pub fn get_current_state(&self) -> Snapshot {
        Snapshot::new(self.step_count, self.cells.map(|pos, cell| cell.get_info(pos)))
    }

    /// Occupied positions in row-major order, with genotype when tracked
    pub fn get_occupied_cells(&self) -> Vec<(Position, Option<Genotype>)> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.is_occupied())
            .map(|(pos, cell)| (pos, cell.genotype()))
            .collect()
    }

    pub fn get_all_cells(&self) -> &Grid<Cell> {
        &self.cells
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|(_, cell)| cell.is_occupied()).count()
    }
}

fn random_genotype<R: Rng>(rng: &mut R) -> Genotype {
    [
        rng.gen_range(GENOTYPE_MIN..=GENOTYPE_MAX),
        rng.gen_range(GENOTYPE_MIN..=GENOTYPE_MAX),
        rng.gen_range(GENOTYPE_MIN..=GENOTYPE_MAX),
    ]
}
