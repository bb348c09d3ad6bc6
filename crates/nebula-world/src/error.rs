use nebula_chunk::StoreError;
use nebula_config::ConfigError;
use nebula_terrain::TerrainError;

/// Errors surfaced by the world façade.
#[derive(Debug, thiserror::Error)]
pub enum WorldGenError {
    /// The configuration is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The terrain pipeline could not be built.
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    /// The chunk store rejected a request.
    #[error(transparent)]
    Store(#[from] StoreError),
}
