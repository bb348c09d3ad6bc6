//! Procedural terrain generation: fractal noise channels, biome
//! classification, tile synthesis, feature placement, and background workers.

mod async_generation;
mod error;
mod feature;
mod generator;
mod noise_field;
mod tiles;

pub mod biome;
pub mod seed;

pub use async_generation::{AsyncChunkGenerator, WorkerPoolConfig, worker_thread_count};
pub use biome::{BiomeClassifier, BiomeDef, BiomeRegistry, BiomeRegistryError, ValueRange, default_biomes};
pub use error::TerrainError;
pub use feature::{FeaturePlacer, FeatureRules, ResourceRule, StructureRule};
pub use generator::{TerrainGenConfig, TerrainGenerator, TerrainSample};
pub use noise_field::{NoiseChannel, NoiseField, NoiseParams, OctaveParams};
pub use seed::{SeedPurpose, chunk_rng, derive_chunk_seed, fold_seed, hash_payload};
pub use tiles::{DEFAULT_CAVE_THRESHOLD, DEFAULT_WATER_LEVEL, TileSynthesizer, tile_for};
