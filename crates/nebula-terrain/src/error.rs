//! Errors raised while building the terrain pipeline.

use crate::biome::BiomeRegistryError;

/// Errors that can occur when constructing terrain generators.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// The biome table is unusable.
    #[error(transparent)]
    Registry(#[from] BiomeRegistryError),
    /// Chunks must be at least one tile wide.
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(u32),
    /// A feature rule names a biome that is not registered.
    #[error("feature rule references unknown biome: {0}")]
    UnknownBiome(String),
    /// Feature strides, probabilities or quantities are out of range.
    #[error("invalid feature rules: {0}")]
    InvalidFeatureRules(String),
    /// A background worker thread could not be started.
    #[error("failed to spawn chunk generation worker")]
    WorkerSpawn(#[source] std::io::Error),
}
