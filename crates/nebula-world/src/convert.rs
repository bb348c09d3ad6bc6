//! Translation from the on-disk config to runtime types.

use nebula_chunk::{ChunkBounds, ChunkCoord, ChunkStoreConfig};
use nebula_config::{BiomeConfig, ChannelConfig, WorldGenConfig};
use nebula_terrain::{
    BiomeDef, FeatureRules, NoiseChannel, NoiseParams, OctaveParams, ResourceRule, StructureRule, TerrainGenConfig,
    ValueRange, WorkerPoolConfig,
};

fn octave(c: &ChannelConfig) -> OctaveParams {
    OctaveParams {
        frequency: c.frequency,
        octaves: c.octaves,
        lacunarity: c.lacunarity,
        persistence: c.persistence,
    }
}

fn range(r: [f64; 2]) -> ValueRange {
    ValueRange::new(r[0], r[1])
}

fn biome(b: &BiomeConfig) -> BiomeDef {
    BiomeDef {
        name: b.name.clone(),
        height: range(b.height),
        temperature: range(b.temperature),
        moisture: range(b.moisture),
        surface: b.surface,
    }
}

/// Terrain pipeline settings for `config`.
pub fn terrain_config(config: &WorldGenConfig) -> TerrainGenConfig {
    let mut noise = NoiseParams::default();
    for (channel, (_, c)) in NoiseChannel::ALL.into_iter().zip(config.noise.channels()) {
        *noise.get_mut(channel) = octave(c);
    }

    let f = &config.features;
    let features = FeatureRules {
        structure_stride: f.structure_stride,
        structure_threshold: f.structure_threshold,
        resource_stride: f.resource_stride,
        quantity: f.quantity_min..=f.quantity_max,
        resources: f
            .resources
            .iter()
            .map(|r| ResourceRule {
                biome: r.biome.clone(),
                kind: r.resource,
                probability: r.probability,
            })
            .collect(),
        structures: f
            .structures
            .iter()
            .map(|s| StructureRule {
                biome: s.biome.clone(),
                kind: s.structure,
            })
            .collect(),
        default_structure: f.default_structure,
    };

    TerrainGenConfig {
        seed: config.world.seed,
        chunk_size: config.world.chunk_size,
        noise,
        detail_weight: config.noise.detail_weight,
        water_level: config.terrain.water_level,
        cave_threshold: config.terrain.cave_threshold,
        features,
        biomes: config.biomes.iter().map(biome).collect(),
    }
}

/// Chunk store settings for `config`.
pub fn store_config(config: &WorldGenConfig) -> ChunkStoreConfig {
    let bounds = config.world.bounds.and_then(|b| {
        ChunkBounds::new(ChunkCoord::new(b.min[0], b.min[1]), ChunkCoord::new(b.max[0], b.max[1]))
    });
    ChunkStoreConfig {
        chunk_size: config.world.chunk_size,
        max_chunks: config.effective_max_chunks(),
        unload_margin: config.world.unload_margin,
        bounds,
    }
}

/// Worker pool settings for `config`.
pub(crate) fn worker_config(config: &WorldGenConfig) -> WorkerPoolConfig {
    WorkerPoolConfig {
        threads: config.streaming.worker_threads,
        max_in_flight: config.streaming.max_in_flight,
        result_capacity: config.streaming.result_capacity,
    }
}
