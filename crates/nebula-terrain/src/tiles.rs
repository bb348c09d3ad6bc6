//! Tile synthesis: biome base tile, then cave carving.

use nebula_chunk::{BiomeId, TileType};

use crate::biome::BiomeClassifier;
use crate::noise_field::{NoiseChannel, NoiseField};

/// Default height below which tiles are underwater and never carved.
pub const DEFAULT_WATER_LEVEL: f64 = 0.3;

/// Default normalized cave-noise value above which a tile becomes a cave.
pub const DEFAULT_CAVE_THRESHOLD: f64 = 0.7;

/// Two-stage tile rule shared by chunk generation and point queries.
///
/// Caves are a post-process: a tile above the water level whose cave sample
/// exceeds the threshold is a cave whatever its biome.
pub fn tile_for(base: TileType, height: f64, cave: f64, water_level: f64, cave_threshold: f64) -> TileType {
    if height > water_level && cave > cave_threshold {
        TileType::Cave
    } else {
        base
    }
}

/// Maps a world position, its height and its biome to a tile type.
#[derive(Clone, Debug)]
pub struct TileSynthesizer {
    base_tiles: Vec<TileType>,
    water_level: f64,
    cave_threshold: f64,
}

impl TileSynthesizer {
    /// Resolves every registered biome's base tile up front.
    pub fn new(classifier: &BiomeClassifier, water_level: f64, cave_threshold: f64) -> Self {
        let base_tiles = classifier.registry().iter().map(|(_, def)| def.base_tile()).collect();
        Self {
            base_tiles,
            water_level,
            cave_threshold,
        }
    }

    /// Base tile of `biome`; unregistered ids get grass.
    pub fn base_tile(&self, biome: BiomeId) -> TileType {
        self.base_tiles.get(biome.0 as usize).copied().unwrap_or(TileType::Grass)
    }

    /// Tile at world position `(x, y)`, sampling the cave channel of `field`.
    pub fn tile_at(&self, field: &NoiseField, x: f64, y: f64, height: f64, biome: BiomeId) -> TileType {
        let base = self.base_tile(biome);
        if height <= self.water_level {
            return base;
        }
        let cave = field.sample_normalized(NoiseChannel::Cave, x, y);
        tile_for(base, height, cave, self.water_level, self.cave_threshold)
    }

    /// Height at or below which nothing is carved.
    pub fn water_level(&self) -> f64 {
        self.water_level
    }

    /// Cave-noise threshold.
    pub fn cave_threshold(&self) -> f64 {
        self.cave_threshold
    }
}
