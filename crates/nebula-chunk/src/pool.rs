//! Bounded pool of reusable chunk containers.
//!
//! Instead of allocating a fresh tile grid every time a chunk streams in, the
//! [`ChunkPool`] keeps released [`ChunkHandle`]s on a free list and hands them
//! back out with their buffers intact. The pool grows lazily and never past its
//! hard capacity.

use crate::coord::ChunkCoord;
use crate::payload::ChunkPayload;

/// Ownership token for one pooled handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId(u32);

impl HandleId {
    /// Slot index inside the pool.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A reusable container wrapping at most one attached payload.
///
/// A handle is either free (no coordinate, invisible) or active (one
/// coordinate, visible).
#[derive(Debug)]
pub struct ChunkHandle {
    coord: Option<ChunkCoord>,
    payload: ChunkPayload,
    visible: bool,
    reuse_count: u32,
}

impl ChunkHandle {
    fn new(coord: ChunkCoord, size: u32) -> Self {
        Self {
            coord: None,
            payload: ChunkPayload::new(coord, size),
            visible: false,
            reuse_count: 0,
        }
    }

    /// The coordinate this handle is attached to, `None` while free.
    pub fn coord(&self) -> Option<ChunkCoord> {
        self.coord
    }

    /// Returns `true` if the handle is on the free list.
    pub fn is_free(&self) -> bool {
        self.coord.is_none()
    }

    /// Returns `true` while attached and shown to consumers.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The attached payload.
    ///
    /// Only meaningful while the handle is active; a free handle keeps a
    /// cleared buffer around for reuse.
    pub fn payload(&self) -> &ChunkPayload {
        &self.payload
    }

    /// How many times this handle has been recycled.
    pub fn reuse_count(&self) -> u32 {
        self.reuse_count
    }

    /// Mutable access to the payload buffer for in-place generation.
    pub fn payload_mut(&mut self) -> &mut ChunkPayload {
        &mut self.payload
    }

    /// Swaps in a payload produced elsewhere, returning the previous buffer.
    pub fn replace_payload(&mut self, payload: ChunkPayload) -> ChunkPayload {
        std::mem::replace(&mut self.payload, payload)
    }
}

/// Free-list pool of [`ChunkHandle`]s with a hard capacity.
#[derive(Debug)]
pub struct ChunkPool {
    handles: Vec<ChunkHandle>,
    free: Vec<HandleId>,
    capacity: usize,
    chunk_size: u32,
}

impl ChunkPool {
    /// Creates an empty pool that will allocate at most `capacity` handles.
    pub fn new(capacity: usize, chunk_size: u32) -> Self {
        Self {
            handles: Vec::new(),
            free: Vec::new(),
            capacity,
            chunk_size,
        }
    }

    /// Hard cap on allocated handles.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Handles allocated so far (active plus free).
    pub fn allocated(&self) -> usize {
        self.handles.len()
    }

    /// Handles currently attached to a coordinate.
    pub fn in_use(&self) -> usize {
        self.handles.len() - self.free.len()
    }

    /// Handles that could still be acquired, counting unallocated headroom.
    pub fn available(&self) -> usize {
        self.free.len() + (self.capacity - self.handles.len())
    }

    /// Acquires a handle for `coord`, reusing a free one before allocating.
    ///
    /// The returned handle's payload is reset to `coord` and ready to be
    /// filled. Returns `None` when the pool is at capacity with no free handle.
    pub fn acquire(&mut self, coord: ChunkCoord) -> Option<(HandleId, &mut ChunkHandle)> {
        let id = match self.free.pop() {
            Some(id) => id,
            None if self.handles.len() < self.capacity => {
                let id = HandleId(self.handles.len() as u32);
                self.handles.push(ChunkHandle::new(coord, self.chunk_size));
                id
            }
            None => return None,
        };

        let chunk_size = self.chunk_size;
        let handle = &mut self.handles[id.index()];
        debug_assert!(handle.is_free(), "acquired handle {id:?} is still active");
        if handle.reuse_count > 0 || handle.payload.coord() != coord {
            handle.payload.reset(coord, chunk_size);
        }
        handle.coord = Some(coord);
        handle.visible = true;
        Some((id, handle))
    }

    /// Returns a handle to the free list.
    ///
    /// Returns the coordinate it was attached to, or `None` if the handle was
    /// already free or does not belong to this pool.
    pub fn release(&mut self, id: HandleId) -> Option<ChunkCoord> {
        let handle = self.handles.get_mut(id.index())?;
        let coord = handle.coord.take()?;
        handle.visible = false;
        handle.reuse_count += 1;
        self.free.push(id);
        Some(coord)
    }

    /// Shared access to a handle.
    pub fn get(&self, id: HandleId) -> Option<&ChunkHandle> {
        self.handles.get(id.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{BiomeId, TileSample};

    #[test]
    fn test_acquire_release_reuses_slot() {
        let mut pool = ChunkPool::new(2, 4);
        let (a, _) = pool.acquire(ChunkCoord::new(0, 0)).expect("capacity");
        assert_eq!(pool.release(a), Some(ChunkCoord::new(0, 0)));

        let (b, handle) = pool.acquire(ChunkCoord::new(9, 9)).expect("free handle");
        assert_eq!(a, b, "released slot should be reused before allocating");
        assert_eq!(handle.coord(), Some(ChunkCoord::new(9, 9)));
        assert_eq!(handle.reuse_count(), 1);
        assert_eq!(pool.allocated(), 1);
    }

    #[test]
    fn test_pool_never_exceeds_capacity() {
        let mut pool = ChunkPool::new(3, 4);
        for i in 0..3 {
            assert!(pool.acquire(ChunkCoord::new(i, 0)).is_some());
        }
        assert_eq!(pool.available(), 0);
        assert!(pool.acquire(ChunkCoord::new(99, 0)).is_none());
        assert_eq!(pool.allocated(), 3);
    }

    #[test]
    fn test_released_handle_is_free_and_invisible() {
        let mut pool = ChunkPool::new(1, 4);
        let (id, handle) = pool.acquire(ChunkCoord::new(1, 1)).expect("capacity");
        assert!(handle.is_visible());
        pool.release(id);
        let handle = pool.get(id).expect("allocated");
        assert!(handle.is_free());
        assert!(!handle.is_visible());
        assert_eq!(pool.release(id), None, "double release must be a no-op");
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_reacquired_payload_is_reset() {
        let mut pool = ChunkPool::new(1, 4);
        let (id, handle) = pool.acquire(ChunkCoord::new(0, 0)).expect("capacity");
        handle.payload_mut().set(
            0,
            0,
            TileSample {
                biome: BiomeId(7),
                ..TileSample::default()
            },
        );
        pool.release(id);
        let (_, handle) = pool.acquire(ChunkCoord::new(1, 0)).expect("free handle");
        assert_eq!(handle.payload().coord(), ChunkCoord::new(1, 0));
        assert_eq!(handle.payload().get(0, 0).biome, BiomeId(0));
    }
}
