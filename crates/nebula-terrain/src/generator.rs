//! The full terrain pipeline behind [`ChunkSource`].

use glam::DVec2;
use nebula_chunk::{BiomeId, ChunkCoord, ChunkPayload, ChunkSource, TileSample, TileType};
use tracing::trace;

use crate::biome::{BiomeClassifier, BiomeDef, BiomeRegistry, default_biomes};
use crate::error::TerrainError;
use crate::feature::{FeaturePlacer, FeatureRules};
use crate::noise_field::{NoiseChannel, NoiseField, NoiseParams};
use crate::tiles::{DEFAULT_CAVE_THRESHOLD, DEFAULT_WATER_LEVEL, TileSynthesizer};

/// Everything needed to build a [`TerrainGenerator`].
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainGenConfig {
    /// World seed.
    pub seed: u64,
    /// Tiles per chunk edge.
    pub chunk_size: u32,
    /// Per-channel fractal parameters.
    pub noise: NoiseParams,
    /// Share of the detail channel mixed into height, in `[0, 1]`.
    pub detail_weight: f64,
    /// Height at or below which nothing is carved.
    pub water_level: f64,
    /// Normalized cave-noise threshold.
    pub cave_threshold: f64,
    /// Structure and resource rules.
    pub features: FeatureRules,
    /// Ordered biome table.
    pub biomes: Vec<BiomeDef>,
}

impl Default for TerrainGenConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_size: 16,
            noise: NoiseParams::default(),
            detail_weight: 0.15,
            water_level: DEFAULT_WATER_LEVEL,
            cave_threshold: DEFAULT_CAVE_THRESHOLD,
            features: FeatureRules::default(),
            biomes: default_biomes(),
        }
    }
}

/// Terrain values at one world position, all normalized to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainSample {
    /// Elevation including detail noise.
    pub height: f64,
    /// Climate temperature.
    pub temperature: f64,
    /// Climate moisture.
    pub moisture: f64,
    /// Classified biome.
    pub biome: BiomeId,
    /// Tile after cave carving.
    pub tile: TileType,
}

impl TerrainSample {
    /// Narrows to the per-tile payload representation.
    pub fn to_tile(self) -> TileSample {
        TileSample {
            tile: self.tile,
            biome: self.biome,
            height: self.height as f32,
            temperature: self.temperature as f32,
            moisture: self.moisture as f32,
        }
    }
}

/// Pure, seed-deterministic world generator.
///
/// All sampling happens in continuous world space, so a tile's values do not
/// depend on which chunk computes them. The generator is read-only after
/// construction and is shared across worker threads behind an `Arc`.
#[derive(Debug)]
pub struct TerrainGenerator {
    seed: u64,
    chunk_size: u32,
    detail_weight: f64,
    field: NoiseField,
    classifier: BiomeClassifier,
    tiles: TileSynthesizer,
    features: FeaturePlacer,
}

impl TerrainGenerator {
    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// [`TerrainError::InvalidChunkSize`] for a zero chunk size, and any
    /// biome table or feature rule error.
    pub fn new(config: TerrainGenConfig) -> Result<Self, TerrainError> {
        if config.chunk_size == 0 {
            return Err(TerrainError::InvalidChunkSize(config.chunk_size));
        }
        let classifier = BiomeClassifier::new(BiomeRegistry::from_defs(config.biomes)?)?;
        let features = FeaturePlacer::new(config.seed, &config.features, classifier.registry())?;
        let tiles = TileSynthesizer::new(&classifier, config.water_level, config.cave_threshold);
        Ok(Self {
            seed: config.seed,
            chunk_size: config.chunk_size,
            detail_weight: config.detail_weight.clamp(0.0, 1.0),
            field: NoiseField::new(config.seed, &config.noise),
            classifier,
            tiles,
            features,
        })
    }

    /// The world seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The noise channels.
    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    /// The biome classifier.
    pub fn classifier(&self) -> &BiomeClassifier {
        &self.classifier
    }

    /// Name of a biome id, if registered.
    pub fn biome_name(&self, id: BiomeId) -> Option<&str> {
        self.classifier.registry().try_get(id).map(|d| d.name.as_str())
    }

    /// Normalized height at `pos`, detail noise included.
    pub fn height_at(&self, pos: DVec2) -> f64 {
        let base = self.field.sample(NoiseChannel::Height, pos.x, pos.y);
        let detail = self.field.sample(NoiseChannel::Detail, pos.x, pos.y);
        let mixed = base * (1.0 - self.detail_weight) + detail * self.detail_weight;
        let h = ((mixed + 1.0) * 0.5).clamp(0.0, 1.0);
        debug_assert!((0.0..=1.0).contains(&h), "height {h} escaped [0, 1]");
        h
    }

    /// Biome at `pos`.
    pub fn biome_at(&self, pos: DVec2) -> BiomeId {
        self.climate_at(pos).3
    }

    /// Every terrain value at `pos`.
    pub fn sample(&self, pos: DVec2) -> TerrainSample {
        let (height, temperature, moisture, biome) = self.climate_at(pos);
        let tile = self.tiles.tile_at(&self.field, pos.x, pos.y, height, biome);
        TerrainSample {
            height,
            temperature,
            moisture,
            biome,
            tile,
        }
    }

    fn climate_at(&self, pos: DVec2) -> (f64, f64, f64, BiomeId) {
        let height = self.height_at(pos);
        let temperature = self.field.sample_normalized(NoiseChannel::Temperature, pos.x, pos.y);
        let moisture = self.field.sample_normalized(NoiseChannel::Moisture, pos.x, pos.y);
        let biome = self.classifier.classify(height, temperature, moisture);
        (height, temperature, moisture, biome)
    }
}

impl ChunkSource for TerrainGenerator {
    fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    fn generate_into(&self, coord: ChunkCoord, payload: &mut ChunkPayload) {
        if payload.coord() != coord || payload.size() != self.chunk_size {
            payload.reset(coord, self.chunk_size);
        }
        let origin = coord.origin(self.chunk_size);
        for ly in 0..self.chunk_size {
            for lx in 0..self.chunk_size {
                let pos = origin + DVec2::new(f64::from(lx), f64::from(ly));
                payload.set(lx, ly, self.sample(pos).to_tile());
            }
        }
        self.features.place_into(&self.field, payload);
        trace!(
            %coord,
            structures = payload.structures.len(),
            resources = payload.resources.len(),
            "chunk generated"
        );
    }
}
