//! Configuration types for the simulation.

use crate::error::Error;
use crate::types::{Boundary, Genotype, Neighborhood, Position, GENOTYPE_MAX, GENOTYPE_MIN};
use serde::{Deserialize, Serialize};

/// World grid parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of grid rows
    pub rows: usize,
    /// Number of grid columns
    pub cols: usize,
    /// Neighbor topology
    pub neighborhood: Neighborhood,
    /// Edge handling for neighbor lookups
    pub boundary: Boundary,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            rows: 205,
            cols: 155,
            neighborhood: Neighborhood::Moore,
            boundary: Boundary::Closed,
        }
    }
}

/// Genetic drift parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticsConfig {
    /// Track genotypes at all. When off, occupants carry no lineage.
    pub enabled: bool,
    /// Scale applied to the drift vector on every genotype update
    pub alpha: f64,
    /// Standard deviation of the noise added to an inherited drift vector
    pub drift_noise_std: f64,
    /// Founder drift components are drawn uniformly from `[-range, range]`
    pub founder_drift_range: f64,
    /// Fixed founder genotype; random in `[0, 255]` when unset
    pub founder_genotype: Option<Genotype>,
}

impl Default for GeneticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            alpha: 3.0,
            drift_noise_std: 0.1,
            founder_drift_range: 1.0,
            founder_genotype: None,
        }
    }
}

/// Birth/death rule parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// Extra extinction probability for a cell that colonized this step.
    /// 0.0 disables the penalty.
    pub colonization_hazard: f64,
}

/// Extinction probability per vegetation class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeExtinction {
    pub temperate_forest: f64,
    pub grassland: f64,
    pub desert: f64,
    pub tropical_forest: f64,
    pub tundra: f64,
    pub warm_temperate_forest: f64,
    pub boreal_forest: f64,
    pub savanna: f64,
}

impl Default for BiomeExtinction {
    fn default() -> Self {
        Self {
            temperate_forest: 0.15,
            grassland: 0.08,
            desert: 0.60,
            tropical_forest: 0.20,
            tundra: 0.50,
            warm_temperate_forest: 0.12,
            boreal_forest: 0.35,
            savanna: 0.05,
        }
    }
}

/// Colonization probability per elevation band
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationColonization {
    pub base: f64,
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl Default for ElevationColonization {
    fn default() -> Self {
        Self {
            base: 0.6,
            low: 0.45,
            mid: 0.3,
            high: 0.1,
        }
    }
}

/// Raster sampling and classification parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitatConfig {
    pub extinction: BiomeExtinction,
    pub colonization: ElevationColonization,
    /// Raster pixels per world cell along each axis
    pub stride: usize,
    /// Raster `(x, y)` of the pixel sampled for world cell (0, 0). World
    /// rows advance along x and world columns along y.
    pub offset: (usize, usize),
    /// Standard deviation of the per-cell noise added to extinction
    /// probabilities at construction. 0.0 disables it.
    pub noise_std: f64,
}

impl Default for HabitatConfig {
    fn default() -> Self {
        Self {
            extinction: BiomeExtinction::default(),
            colonization: ElevationColonization::default(),
            stride: 5,
            offset: (0, 0),
            noise_std: 0.0,
        }
    }
}

/// Complete configuration for one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    pub world: WorldConfig,
    pub genetics: GeneticsConfig,
    pub dynamics: DynamicsConfig,
    pub habitat: HabitatConfig,
    /// Cells occupied before the first step
    pub initial_population: Vec<Position>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            world: WorldConfig::default(),
            genetics: GeneticsConfig::default(),
            dynamics: DynamicsConfig::default(),
            habitat: HabitatConfig::default(),
            // A handful of cells in the East African Rift Valley
            initial_population: vec![
                Position::new(120, 110),
                Position::new(121, 110),
                Position::new(120, 111),
                Position::new(122, 112),
            ],
        }
    }
}

impl SimulationConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject parameters the stepping rules cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        self.world.validate()?;
        self.genetics.validate()?;
        self.dynamics.validate()
    }
}

impl WorldConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::Validation(format!(
                "world must have at least one cell, got {}x{}",
                self.rows, self.cols
            )));
        }
        // Narrower tori wrap distinct offsets onto one cell or onto the cell itself
        if self.boundary == Boundary::Toroidal && (self.rows < 3 || self.cols < 3) {
            return Err(Error::Validation(format!(
                "a toroidal world needs at least 3x3 cells, got {}x{}",
                self.rows, self.cols
            )));
        }
        Ok(())
    }
}

impl GeneticsConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if !self.alpha.is_finite() {
            return Err(Error::Validation(format!("alpha must be finite, got {}", self.alpha)));
        }
        if !self.drift_noise_std.is_finite() || self.drift_noise_std < 0.0 {
            return Err(Error::Validation(format!(
                "drift_noise_std must be a non-negative number, got {}",
                self.drift_noise_std
            )));
        }
        if !self.founder_drift_range.is_finite() || self.founder_drift_range < 0.0 {
            return Err(Error::Validation(format!(
                "founder_drift_range must be a non-negative number, got {}",
                self.founder_drift_range
            )));
        }
        if let Some(genotype) = self.founder_genotype {
            if genotype
                .iter()
                .any(|c| !(GENOTYPE_MIN..=GENOTYPE_MAX).contains(c))
            {
                return Err(Error::Validation(format!(
                    "founder_genotype components must lie in [0, 255], got {:?}",
                    genotype
                )));
            }
        }
        Ok(())
    }
}

impl DynamicsConfig {
    pub fn validate(&self) -> crate::Result<()> {
        check_probability("colonization_hazard", self.colonization_hazard)
    }
}

/// Ensure `value` is a probability in `[0, 1]`
pub fn check_probability(name: &str, value: f64) -> crate::Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )))
    }
}
