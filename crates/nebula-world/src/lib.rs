//! World generation façade.
//!
//! [`WorldGenerator`] owns the configuration, the terrain pipeline, and the
//! chunk store. Collaborators feed it a position each frame through
//! [`WorldGenerator::tick`] and read chunk lifecycle events back; it never
//! calls into rendering or UI code.

mod convert;
mod error;
mod world;

pub use convert::{store_config, terrain_config};
pub use error::WorldGenError;
pub use world::{StreamingMode, WorldGenerator};

pub use nebula_chunk::{
    BiomeId, ChunkCoord, ChunkEvent, ChunkPayload, ChunkState, LoadOutcome, StoreStats, UpdateReport,
};
pub use nebula_config::WorldGenConfig;
pub use nebula_terrain::TerrainSample;
