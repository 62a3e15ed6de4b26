//! Independent worlds stepped together and aggregated into maps.

use crate::grid::Grid;
use crate::landscape::Landscape;
use crate::world::World;
use dispersal_core::{Error, Genotype, Position, Result, SimulationConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Occupancy counts per cell across the members of an ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityMap {
    pub members: usize,
    pub counts: Grid<u32>,
}

impl DensityMap {
    pub fn count(&self, pos: Position) -> u32 {
        self.counts.get(pos).copied().unwrap_or(0)
    }

    /// Share of members occupying `pos`
    pub fn fraction(&self, pos: Position) -> f64 {
        if self.members == 0 {
            return 0.0;
        }
        self.count(pos) as f64 / self.members as f64
    }

    /// Gray level for rendering: darker where more members are present.
    /// `None` where no member is present.
    pub fn shade(&self, pos: Position) -> Option<u8> {
        if self.count(pos) == 0 {
            return None;
        }
        Some((255.0 - self.fraction(pos) * 255.0) as u8)
    }
}

pub struct Ensemble {
    worlds: Vec<World>,
}

impl Ensemble {
    /// Build `members` worlds from one landscape. Member seeds are drawn
    /// from a generator seeded with `config.seed`.
    pub fn new(landscape: &Landscape, config: &SimulationConfig, members: usize) -> Result<Self> {
        if members == 0 {
            return Err(Error::Validation(
                "an ensemble needs at least one member".to_string(),
            ));
        }

        let mut seeder = ChaCha8Rng::seed_from_u64(config.seed);
        let worlds = (0..members)
            .map(|_| landscape.build_world(config, seeder.gen()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { worlds })
    }

    pub fn worlds(&self) -> &[World] {
        &self.worlds
    }

    pub fn members(&self) -> usize {
        self.worlds.len()
    }

    /// Step every member once
    pub fn step(&mut self) -> Result<()> {
        for world in &mut self.worlds {
            world.step()?;
        }
        Ok(())
    }

    /// Run the ensemble for the specified number of steps
    #[instrument(skip(self), fields(members = self.worlds.len()))]
    pub fn run(&mut self, steps: u64) -> Result<()> {
        info!("Starting ensemble for {} steps", steps);

        for step in 0..steps {
            self.step()?;

            if step % 1000 == 0 {
                info!(
                    "Step {}/{}: {:?} occupied cells per member",
                    step,
                    steps,
                    self.occupied_counts()
                );
            }
        }

        info!(
            event = "ensemble_complete",
            steps,
            occupied = ?self.occupied_counts(),
            "Ensemble finished"
        );
        Ok(())
    }

    pub fn occupied_counts(&self) -> Vec<usize> {
        self.worlds.iter().map(World::occupied_count).collect()
    }

    /// Number of members occupying each cell
    pub fn density_map(&self) -> DensityMap {
        let first = &self.worlds[0];
        let counts = Grid::from_fn(first.rows(), first.cols(), |pos| {
            self.worlds
                .iter()
                .filter(|w| w.get_all_cells().get(pos).is_some_and(|c| c.is_occupied()))
                .count() as u32
        });

        DensityMap {
            members: self.worlds.len(),
            counts,
        }
    }

    /// Mean genotype over the members occupying each cell
    pub fn variation_map(&self) -> Grid<Option<Genotype>> {
        let first = &self.worlds[0];
        Grid::from_fn(first.rows(), first.cols(), |pos| {
            let genotypes: Vec<Genotype> = self
                .worlds
                .iter()
                .filter_map(|w| w.get_all_cells().get(pos).and_then(|c| c.genotype()))
                .collect();
            if genotypes.is_empty() {
                return None;
            }

            let n = genotypes.len() as f64;
            let mut mean = [0.0; 3];
            for genotype in &genotypes {
                for (total, component) in mean.iter_mut().zip(genotype) {
                    *total += component / n;
                }
            }
            Some(mean)
        })
    }
}
