//! Construction of worlds from environment rasters.

use crate::grid::Grid;
use crate::world::World;
use dispersal_core::{
    classify_vegetation, check_probability, ElevationBand, Error, HabitatConfig, Position,
    Result, Rgb, SimulationConfig, Vegetation,
};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Row-major RGB image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgb>,
}

impl Raster {
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self> {
        let raster = Self {
            width,
            height,
            pixels,
        };
        raster.validate()?;
        Ok(raster)
    }

    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raster: Self = serde_json::from_str(json)?;
        raster.validate()?;
        Ok(raster)
    }

    pub fn pixel(&self, row: usize, col: usize) -> Option<Rgb> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.pixels.get(row * self.width + col).copied()
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, color: Rgb) {
        if row < self.height && col < self.width {
            self.pixels[row * self.width + col] = color;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pixels.len() != self.width * self.height {
            return Err(Error::Validation(format!(
                "raster of {}x{} needs {} pixels, got {}",
                self.width,
                self.height,
                self.width * self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }
}

/// Fixed environment parameters of a habitable cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Habitat {
    pub p_ext: f64,
    pub p_col: f64,
}

/// Per-position habitat layout; `None` marks uninhabitable positions
#[derive(Debug, Clone, PartialEq)]
pub struct Landscape {
    sites: Grid<Option<Habitat>>,
}

impl Landscape {
    /// Sample a vegetation and an elevation raster into a `rows` x `cols`
    /// layout.
    ///
    /// World rows run along the raster's x axis: cell (r, c) reads the pixel
    /// at `x = offset.0 + r * stride`, `y = offset.1 + c * stride`.
    /// White vegetation is uninhabitable; any other unknown color in either
    /// raster is a classification error.
    pub fn from_rasters<R: Rng>(
        vegetation: &Raster,
        elevation: &Raster,
        rows: usize,
        cols: usize,
        habitat: &HabitatConfig,
        rng: &mut R,
    ) -> Result<Self> {
        if habitat.stride == 0 {
            return Err(Error::Validation("stride must be at least 1".to_string()));
        }
        if rows == 0 || cols == 0 {
            return Err(Error::Validation(format!(
                "landscape must have at least one cell, got {}x{}",
                rows, cols
            )));
        }
        if !habitat.noise_std.is_finite() || habitat.noise_std < 0.0 {
            return Err(Error::Validation(format!(
                "noise_std must be a non-negative number, got {}",
                habitat.noise_std
            )));
        }

        let (x_offset, y_offset) = habitat.offset;
        let needed_width = x_offset + (rows - 1) * habitat.stride + 1;
        let needed_height = y_offset + (cols - 1) * habitat.stride + 1;
        for (name, raster) in [("vegetation", vegetation), ("elevation", elevation)] {
            if raster.height < needed_height || raster.width < needed_width {
                return Err(Error::Validation(format!(
                    "{} raster is {}x{} but sampling {} rows by {} columns needs {}x{}",
                    name, raster.width, raster.height, rows, cols, needed_width, needed_height
                )));
            }
        }

        let noise = Normal::new(0.0, habitat.noise_std)
            .map_err(|e| Error::Validation(format!("habitat noise: {}", e)))?;

        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let x = x_offset + row * habitat.stride;
                let y = y_offset + col * habitat.stride;
                cells.push(classify_site(
                    vegetation, elevation, y, x, habitat, &noise, rng,
                )?);
            }
        }

        let mut cells = cells.into_iter();
        let sites = Grid::from_fn(rows, cols, |_| cells.next().flatten());
        let landscape = Self { sites };
        info!(
            rows,
            cols,
            active = landscape.active_count(),
            "Landscape sampled from rasters"
        );
        Ok(landscape)
    }

    /// Rectangular habitable block with uniform probabilities, surrounded by
    /// `margin` rows and columns of uninhabitable cells
    pub fn uniform(rows: usize, cols: usize, p_ext: f64, p_col: f64, margin: usize) -> Result<Self> {
        check_probability("p_ext", p_ext)?;
        check_probability("p_col", p_col)?;
        if rows <= 2 * margin || cols <= 2 * margin {
            return Err(Error::Validation(format!(
                "a margin of {} leaves no habitable cells in a {}x{} grid",
                margin, rows, cols
            )));
        }

        let sites = Grid::from_fn(rows, cols, |pos| {
            let inside = pos.row >= margin
                && pos.row < rows - margin
                && pos.col >= margin
                && pos.col < cols - margin;
            inside.then_some(Habitat { p_ext, p_col })
        });
        Ok(Self { sites })
    }

    pub fn rows(&self) -> usize {
        self.sites.rows()
    }

    pub fn cols(&self) -> usize {
        self.sites.cols()
    }

    pub fn habitat(&self, pos: Position) -> Option<Habitat> {
        self.sites.get(pos).copied().flatten()
    }

    pub fn active_count(&self) -> usize {
        self.sites.iter().filter(|(_, site)| site.is_some()).count()
    }

    /// Build a world with every cell created and the configured initial
    /// population seeded. `seed` overrides `config.seed`.
    pub fn build_world(&self, config: &SimulationConfig, seed: u64) -> Result<World> {
        if config.world.rows != self.rows() || config.world.cols != self.cols() {
            return Err(Error::Validation(format!(
                "landscape is {}x{} but the world is configured as {}x{}",
                self.rows(),
                self.cols(),
                config.world.rows,
                config.world.cols
            )));
        }

        let mut config = config.clone();
        config.seed = seed;
        let initial_population = std::mem::take(&mut config.initial_population);

        let mut world = World::new(config)?;
        for (pos, site) in self.sites.iter() {
            match site {
                Some(habitat) => {
                    world.create_cell(pos, true, Some(habitat.p_ext), Some(habitat.p_col))?
                }
                None => world.create_cell(pos, false, None, None)?,
            }
        }
        for pos in initial_population {
            world.populate(pos)?;
        }
        Ok(world)
    }
}

fn classify_site<R: Rng>(
    vegetation: &Raster,
    elevation: &Raster,
    row: usize,
    col: usize,
    habitat: &HabitatConfig,
    noise: &Normal<f64>,
    rng: &mut R,
) -> Result<Option<Habitat>> {
    let veg_color = pixel(vegetation, row, col)?;
    let biome = match classify_vegetation(veg_color) {
        Some(Vegetation::Uninhabitable) => return Ok(None),
        Some(Vegetation::Biome(biome)) => biome,
        None => {
            return Err(Error::Classification {
                layer: "vegetation",
                color: veg_color,
                row,
                col,
            })
        }
    };

    let elv_color = pixel(elevation, row, col)?;
    let band = ElevationBand::from_color(elv_color).ok_or(Error::Classification {
        layer: "elevation",
        color: elv_color,
        row,
        col,
    })?;

    let mut p_ext = biome.extinction(&habitat.extinction);
    if habitat.noise_std > 0.0 {
        p_ext += noise.sample(rng);
    }

    Ok(Some(Habitat {
        p_ext: p_ext.clamp(0.0, 1.0),
        p_col: band.colonization(&habitat.colonization).clamp(0.0, 1.0),
    }))
}

fn pixel(raster: &Raster, row: usize, col: usize) -> Result<Rgb> {
    raster.pixel(row, col).ok_or_else(|| {
        Error::Validation(format!(
            "pixel ({}, {}) lies outside the {}x{} raster",
            row, col, raster.width, raster.height
        ))
    })
}
