//! Execution of a simulation mode and assembly of its report.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use dispersal_core::SimulationConfig;
use dispersal_world::{Ensemble, Landscape, Raster};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument};

/// What the run aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Several independent worlds, aggregated into an occupancy density map
    Density,
    /// A single world, reported as a genotype map
    Variation,
}

impl Mode {
    pub fn default_members(&self) -> usize {
        match self {
            Mode::Density => 3,
            Mode::Variation => 1,
        }
    }
}

/// Everything needed to execute one run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub mode: Mode,
    pub steps: u64,
    pub members: usize,
    pub config: SimulationConfig,
    pub vegetation: Option<Raster>,
    pub elevation: Option<Raster>,
}

/// Aggregated outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub mode: Mode,
    pub steps: u64,
    pub members: usize,
    pub seed: u64,
    /// Occupied cell count per member
    pub occupied: Vec<usize>,
    /// Members occupying each cell, row by row
    pub density: Vec<Vec<u32>>,
    /// Mean genotype per cell as an RGB triple, row by row
    pub variation: Vec<Vec<Option<[u8; 3]>>>,
}

pub fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    SimulationConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))
}

pub fn load_raster(path: &Path) -> Result<Raster> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading raster {}", path.display()))?;
    Raster::from_json(&json).with_context(|| format!("parsing raster {}", path.display()))
}

/// Landscape from the rasters when both are given, otherwise a uniform
/// savanna block on the base elevation band with a one-cell margin
pub fn build_landscape(
    config: &SimulationConfig,
    vegetation: Option<&Raster>,
    elevation: Option<&Raster>,
) -> Result<Landscape> {
    let (rows, cols) = (config.world.rows, config.world.cols);
    let landscape = match (vegetation, elevation) {
        (Some(vegetation), Some(elevation)) => {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            Landscape::from_rasters(vegetation, elevation, rows, cols, &config.habitat, &mut rng)?
        }
        (None, None) => {
            info!("No rasters given, using a uniform landscape");
            Landscape::uniform(
                rows,
                cols,
                config.habitat.extinction.savanna,
                config.habitat.colonization.base,
                1,
            )?
        }
        _ => bail!("vegetation and elevation rasters must be given together"),
    };
    Ok(landscape)
}

#[instrument(skip(request), fields(mode = ?request.mode, steps = request.steps, members = request.members))]
pub fn execute(request: RunRequest) -> Result<Report> {
    let started = Instant::now();
    let landscape = build_landscape(
        &request.config,
        request.vegetation.as_ref(),
        request.elevation.as_ref(),
    )?;

    let mut ensemble = Ensemble::new(&landscape, &request.config, request.members)?;
    ensemble.run(request.steps)?;

    let density = ensemble.density_map();
    let variation = ensemble.variation_map();

    info!(
        event = "run_complete",
        elapsed_ms = started.elapsed().as_millis() as u64,
        occupied = ?ensemble.occupied_counts(),
        "Run finished"
    );

    Ok(Report {
        mode: request.mode,
        steps: request.steps,
        members: ensemble.members(),
        seed: request.config.seed,
        occupied: ensemble.occupied_counts(),
        density: density.counts.row_slices().map(<[u32]>::to_vec).collect(),
        variation: variation
            .row_slices()
            .map(|row| {
                row.iter()
                    .map(|genotype| genotype.map(|g| g.map(|c| c as u8)))
                    .collect()
            })
            .collect(),
    })
}
