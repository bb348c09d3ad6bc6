//! Seams between the store and whatever produces chunk content.

use std::sync::Arc;

use crate::coord::ChunkCoord;
use crate::payload::ChunkPayload;

/// Synchronous producer of chunk content.
///
/// Implementations must be pure: the same coordinate always yields an
/// identical payload.
pub trait ChunkSource {
    /// Tiles per chunk edge this source produces.
    fn chunk_size(&self) -> u32;

    /// Fills `payload` with the content of `coord`.
    ///
    /// The payload has already been reset to `coord` and `chunk_size()`.
    fn generate_into(&self, coord: ChunkCoord, payload: &mut ChunkPayload);

    /// Generates a fresh payload for `coord`.
    fn generate(&self, coord: ChunkCoord) -> ChunkPayload {
        let mut payload = ChunkPayload::new(coord, self.chunk_size());
        self.generate_into(coord, &mut payload);
        payload
    }
}

impl<T: ChunkSource + ?Sized> ChunkSource for Arc<T> {
    fn chunk_size(&self) -> u32 {
        (**self).chunk_size()
    }

    fn generate_into(&self, coord: ChunkCoord, payload: &mut ChunkPayload) {
        (**self).generate_into(coord, payload);
    }
}

/// A finished (or abandoned) background generation.
#[derive(Debug)]
pub struct CompletedChunk {
    /// The coordinate that was submitted.
    pub coord: ChunkCoord,
    /// Generated content, or `None` if the task was cancelled before it ran.
    pub payload: Option<ChunkPayload>,
    /// Generation time in microseconds (zero for cancelled tasks).
    pub generation_time_us: u64,
}

/// Background executor for chunk generation.
///
/// The store guarantees at most one submission per coordinate until the
/// matching [`CompletedChunk`] has been drained. Every accepted submission
/// must eventually be reported back, cancelled or not.
pub trait ChunkExecutor {
    /// Queues `coord` for generation, handing it back if the executor is full.
    fn submit(&self, coord: ChunkCoord) -> Result<(), ChunkCoord>;

    /// Asks the executor to skip `coord` if it has not started yet.
    fn cancel(&self, coord: ChunkCoord);

    /// Collects everything that finished since the last call.
    fn drain_completed(&self) -> Vec<CompletedChunk>;

    /// Submissions not yet drained.
    fn in_flight(&self) -> usize;
}
