//! Chunk lifecycle events.
//!
//! The store never calls into renderers or UI directly. It records
//! [`ChunkEvent`]s in a [`ChunkEventBuffer`] that collaborators read each frame.

use crate::coord::ChunkCoord;
use crate::payload::PayloadSummary;

/// A change in a chunk's lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub enum ChunkEvent {
    /// A chunk finished generating and is now active.
    Generated {
        /// The chunk that became active.
        coord: ChunkCoord,
        /// Summary of the attached payload.
        summary: PayloadSummary,
    },
    /// A chunk left the active set and its handle returned to the pool.
    Evicted {
        /// The chunk that was evicted.
        coord: ChunkCoord,
    },
}

impl ChunkEvent {
    /// The chunk this event concerns.
    pub fn coord(&self) -> ChunkCoord {
        match self {
            ChunkEvent::Generated { coord, .. } | ChunkEvent::Evicted { coord } => *coord,
        }
    }
}

/// Double-buffered event storage.
///
/// Events written in the current frame stay readable for the next frame too;
/// after two [`swap`](ChunkEventBuffer::swap) calls they are dropped. Consumers
/// that want ownership use [`drain`](ChunkEventBuffer::drain) instead.
#[derive(Debug, Default)]
pub struct ChunkEventBuffer {
    prev: Vec<ChunkEvent>,
    current: Vec<ChunkEvent>,
}

impl ChunkEventBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event for the current frame.
    pub fn send(&mut self, event: ChunkEvent) {
        self.current.push(event);
    }

    /// Readable events, oldest first.
    pub fn read(&self) -> impl Iterator<Item = &ChunkEvent> {
        self.prev.iter().chain(self.current.iter())
    }

    /// Number of readable events.
    pub fn len(&self) -> usize {
        self.prev.len() + self.current.len()
    }

    /// Returns `true` if nothing is readable.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advances one frame.
    pub fn swap(&mut self) {
        self.prev.clear();
        std::mem::swap(&mut self.prev, &mut self.current);
    }

    /// Removes and returns every readable event, oldest first.
    pub fn drain(&mut self) -> Vec<ChunkEvent> {
        let mut out = std::mem::take(&mut self.prev);
        out.append(&mut self.current);
        out
    }

    /// Drops all events.
    pub fn clear(&mut self) {
        self.prev.clear();
        self.current.clear();
    }
}
