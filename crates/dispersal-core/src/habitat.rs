//! Classification of environment raster colors into habitat probabilities.

use crate::config::{BiomeExtinction, ElevationColonization};
use crate::types::Rgb;
use serde::{Deserialize, Serialize};

/// Vegetation class read from the vegetation raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Biome {
    TemperateForest,
    Grassland,
    Desert,
    TropicalForest,
    Tundra,
    WarmTemperateForest,
    BorealForest,
    Savanna,
}

impl Biome {
    pub fn all() -> [Biome; 8] {
        [
            Biome::TemperateForest,
            Biome::Grassland,
            Biome::Desert,
            Biome::TropicalForest,
            Biome::Tundra,
            Biome::WarmTemperateForest,
            Biome::BorealForest,
            Biome::Savanna,
        ]
    }

    pub fn color(&self) -> Rgb {
        match self {
            Biome::TemperateForest => Rgb::new(7, 120, 11),
            Biome::Grassland => Rgb::new(255, 128, 0),
            Biome::Desert => Rgb::new(255, 242, 0),
            Biome::TropicalForest => Rgb::new(0, 79, 0),
            Biome::Tundra => Rgb::new(22, 204, 250),
            Biome::WarmTemperateForest => Rgb::new(164, 252, 67),
            Biome::BorealForest => Rgb::new(128, 128, 255),
            Biome::Savanna => Rgb::new(132, 97, 37),
        }
    }

    pub fn from_color(color: Rgb) -> Option<Self> {
        Self::all().into_iter().find(|b| b.color() == color)
    }

    pub fn extinction(&self, table: &BiomeExtinction) -> f64 {
        match self {
            Biome::TemperateForest => table.temperate_forest,
            Biome::Grassland => table.grassland,
            Biome::Desert => table.desert,
            Biome::TropicalForest => table.tropical_forest,
            Biome::Tundra => table.tundra,
            Biome::WarmTemperateForest => table.warm_temperate_forest,
            Biome::BorealForest => table.boreal_forest,
            Biome::Savanna => table.savanna,
        }
    }
}

/// Elevation band read from the elevation raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElevationBand {
    Base,
    Low,
    Mid,
    High,
}

impl ElevationBand {
    pub fn all() -> [ElevationBand; 4] {
        [
            ElevationBand::Base,
            ElevationBand::Low,
            ElevationBand::Mid,
            ElevationBand::High,
        ]
    }

    pub fn color(&self) -> Rgb {
        match self {
            ElevationBand::Base => Rgb::WHITE,
            ElevationBand::Low => Rgb::new(203, 131, 7),
            ElevationBand::Mid => Rgb::new(203, 41, 21),
            ElevationBand::High => Rgb::new(112, 6, 6),
        }
    }

    pub fn from_color(color: Rgb) -> Option<Self> {
        Self::all().into_iter().find(|b| b.color() == color)
    }

    pub fn colonization(&self, table: &ElevationColonization) -> f64 {
        match self {
            ElevationBand::Base => table.base,
            ElevationBand::Low => table.low,
            ElevationBand::Mid => table.mid,
            ElevationBand::High => table.high,
        }
    }
}

/// Vegetation pixel meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vegetation {
    /// White pixels lie outside the habitable area.
    Uninhabitable,
    Biome(Biome),
}

/// Classify a vegetation pixel. Unknown colors yield `None`.
pub fn classify_vegetation(color: Rgb) -> Option<Vegetation> {
    if color == Rgb::WHITE {
        return Some(Vegetation::Uninhabitable);
    }
    Biome::from_color(color).map(Vegetation::Biome)
}
