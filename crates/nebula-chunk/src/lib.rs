//! Chunk data, pooled chunk handles, and the streaming chunk store.
//!
//! A [`ChunkStore`] owns the coordinate-to-handle map and the bounded
//! [`ChunkPool`]. Content comes from a [`ChunkSource`] (synchronous) or a
//! [`ChunkExecutor`] (background workers); lifecycle changes are reported
//! through a [`ChunkEventBuffer`].

pub mod coord;
pub mod events;
pub mod loading;
pub mod payload;
pub mod pool;
pub mod source;
pub mod store;
pub mod tile;

pub use coord::{ChunkBounds, ChunkCoord};
pub use events::{ChunkEvent, ChunkEventBuffer};
pub use loading::{ChunkLoadQueue, MAX_RENDER_DISTANCE, coords_in_radius, radius_contains};
pub use payload::{ChunkPayload, PayloadSummary};
pub use pool::{ChunkHandle, ChunkPool, HandleId};
pub use source::{ChunkExecutor, ChunkSource, CompletedChunk};
pub use store::{
    ChunkState, ChunkStore, ChunkStoreConfig, CompletionOutcome, EvictOutcome, LoadOutcome,
    StoreError, StoreStats, UpdateReport, square_count,
};
pub use tile::{
    BiomeId, ResourceInstance, ResourceKind, StructureInstance, StructureKind, TileSample,
    TileType,
};
