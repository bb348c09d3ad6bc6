//! The streaming chunk store.
//!
//! [`ChunkStore`] is the single authority for which chunks exist. Each
//! coordinate is Unloaded, Generating, or Active:
//!
//! - Unloaded -> Generating: a load was requested and a pool slot is reserved.
//! - Generating -> Active: the payload is attached to a visible handle.
//! - Active -> Unloaded: eviction returns the handle to the pool.
//!
//! Synchronous loads pass through Generating inside a single call. Background
//! loads stay Generating until the executor reports back; evicting such a
//! chunk only marks it unwanted and the late result is discarded.

use glam::DVec2;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::coord::{ChunkBounds, ChunkCoord};
use crate::events::{ChunkEvent, ChunkEventBuffer};
use crate::loading::{ChunkLoadQueue, coords_in_radius, radius_contains};
use crate::payload::ChunkPayload;
use crate::pool::{ChunkHandle, ChunkPool, HandleId};
use crate::source::{ChunkExecutor, ChunkSource, CompletedChunk};

/// Store sizing and streaming policy.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkStoreConfig {
    /// Tiles per chunk edge.
    pub chunk_size: u32,
    /// Hard cap on pooled handles, counting in-flight background generations.
    pub max_chunks: usize,
    /// Extra chunks beyond the render distance before eviction kicks in.
    pub unload_margin: u32,
    /// Optional rectangle outside which nothing is ever loaded.
    pub bounds: Option<ChunkBounds>,
}

impl ChunkStoreConfig {
    /// Config whose cap exactly fits one render radius (plus margin).
    pub fn for_render_distance(chunk_size: u32, render_distance: u32) -> Self {
        Self {
            chunk_size,
            max_chunks: square_count(render_distance),
            unload_margin: 0,
            bounds: None,
        }
    }
}

/// Number of chunks in the `(2r+1)²` square around a center.
pub fn square_count(radius: u32) -> usize {
    let side = (radius as usize).saturating_mul(2).saturating_add(1);
    side.saturating_mul(side)
}

/// Errors reported by the store.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// Every handle is in use. Recoverable: retry once eviction frees one.
    #[error("chunk pool exhausted ({capacity} handles in use)")]
    PoolExhausted {
        /// The pool's hard cap.
        capacity: usize,
    },
    /// The coordinate lies outside the configured world bounds.
    #[error("chunk {0} is outside the world bounds")]
    OutOfBounds(ChunkCoord),
    /// The source produces chunks of a different size than the store holds.
    #[error("chunk size mismatch: store holds {expected}, source produces {found}")]
    ChunkSizeMismatch {
        /// Store chunk size.
        expected: u32,
        /// Source chunk size.
        found: u32,
    },
    /// The store configuration cannot work.
    #[error("invalid store config: {0}")]
    InvalidConfig(&'static str),
}

/// Lifecycle state of one coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// No handle assigned.
    Unloaded,
    /// Content is being computed.
    Generating,
    /// Payload attached to a visible handle.
    Active,
}

/// Result of [`ChunkStore::ensure_loaded`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The chunk was generated and attached.
    Loaded,
    /// The chunk was already active; nothing changed.
    AlreadyActive,
    /// A background generation is in flight; it will attach on completion.
    Pending,
}

/// Result of [`ChunkStore::evict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictOutcome {
    /// The chunk was detached and its handle freed.
    Evicted,
    /// The chunk was not loaded; nothing changed.
    NotLoaded,
    /// The chunk is mid-generation; its result will be discarded.
    Deferred,
}

/// Result of [`ChunkStore::complete`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The payload was attached and the chunk is active.
    Attached,
    /// The chunk was no longer wanted; the payload was dropped.
    Discarded,
    /// The executor skipped the task; the chunk is Unloaded again.
    Cancelled,
    /// No generation was outstanding for this coordinate.
    Unexpected,
}

/// What one update call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Chunk containing the tracked position.
    pub center: ChunkCoord,
    /// Chunks generated and attached synchronously.
    pub loaded: u32,
    /// Chunks evicted.
    pub evicted: u32,
    /// Loads postponed because the pool (or executor) was full.
    pub deferred: u32,
    /// Background generations submitted.
    pub submitted: u32,
    /// Background results attached.
    pub attached: u32,
    /// Background results dropped because the chunk was no longer wanted.
    pub discarded: u32,
}

/// Cumulative counters since the store was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Chunks attached.
    pub generated: u64,
    /// Chunks evicted.
    pub evicted: u64,
    /// Loads postponed by pool exhaustion.
    pub deferred: u64,
    /// Background results dropped.
    pub discarded: u64,
    /// Largest number of simultaneously active chunks.
    pub peak_active: usize,
}

/// Owns the coordinate-to-handle map and the handle pool.
#[derive(Debug)]
pub struct ChunkStore {
    config: ChunkStoreConfig,
    pool: ChunkPool,
    active: FxHashMap<ChunkCoord, HandleId>,
    /// In-flight background generations; the flag says whether the result is still wanted.
    generating: FxHashMap<ChunkCoord, bool>,
    queue: ChunkLoadQueue,
    events: ChunkEventBuffer,
    stats: StoreStats,
}

impl ChunkStore {
    /// Creates an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] for a zero chunk size or a zero cap.
    pub fn new(config: ChunkStoreConfig) -> Result<Self, StoreError> {
        if config.chunk_size == 0 {
            return Err(StoreError::InvalidConfig("chunk_size must be positive"));
        }
        if config.max_chunks == 0 {
            return Err(StoreError::InvalidConfig("max_chunks must be positive"));
        }
        Ok(Self {
            pool: ChunkPool::new(config.max_chunks, config.chunk_size),
            config,
            active: FxHashMap::default(),
            generating: FxHashMap::default(),
            queue: ChunkLoadQueue::new(),
            events: ChunkEventBuffer::new(),
            stats: StoreStats::default(),
        })
    }

    /// The store configuration.
    pub fn config(&self) -> &ChunkStoreConfig {
        &self.config
    }

    /// Lifecycle state of `coord`.
    pub fn state(&self, coord: ChunkCoord) -> ChunkState {
        if self.active.contains_key(&coord) {
            ChunkState::Active
        } else if self.generating.contains_key(&coord) {
            ChunkState::Generating
        } else {
            ChunkState::Unloaded
        }
    }

    /// Returns `true` if `coord` is active.
    pub fn is_active(&self, coord: ChunkCoord) -> bool {
        self.active.contains_key(&coord)
    }

    /// Payload of an active chunk.
    pub fn payload(&self, coord: ChunkCoord) -> Option<&ChunkPayload> {
        self.handle(coord).map(ChunkHandle::payload)
    }

    /// Handle of an active chunk.
    pub fn handle(&self, coord: ChunkCoord) -> Option<&ChunkHandle> {
        let id = self.active.get(&coord)?;
        self.pool.get(*id)
    }

    /// Number of active chunks.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of background generations in flight.
    pub fn generating_count(&self) -> usize {
        self.generating.len()
    }

    /// Iterates over in-flight background generations in no particular order.
    pub fn generating_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.generating.keys().copied()
    }

    /// Iterates over active coordinates in no particular order.
    pub fn active_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.active.keys().copied()
    }

    /// The handle pool.
    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }

    /// Lifecycle events.
    pub fn events(&self) -> &ChunkEventBuffer {
        &self.events
    }

    /// Mutable lifecycle events, for swapping or draining.
    pub fn events_mut(&mut self) -> &mut ChunkEventBuffer {
        &mut self.events
    }

    /// Cumulative counters.
    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    /// Returns `true` if `coord` may be loaded under the configured bounds.
    pub fn in_bounds(&self, coord: ChunkCoord) -> bool {
        self.config.bounds.is_none_or(|b| b.contains(coord))
    }

    /// Generates `coord` synchronously if it is Unloaded.
    ///
    /// No-op for active chunks ([`LoadOutcome::AlreadyActive`]) and for chunks
    /// already generating in the background ([`LoadOutcome::Pending`]).
    ///
    /// # Errors
    ///
    /// [`StoreError::PoolExhausted`] if no handle is available (the chunk stays
    /// Unloaded), [`StoreError::OutOfBounds`] outside the world bounds, and
    /// [`StoreError::ChunkSizeMismatch`] if `source` disagrees on chunk size.
    pub fn ensure_loaded<S>(&mut self, coord: ChunkCoord, source: &S) -> Result<LoadOutcome, StoreError>
    where
        S: ChunkSource + ?Sized,
    {
        self.check_source(source)?;
        if !self.in_bounds(coord) {
            return Err(StoreError::OutOfBounds(coord));
        }
        if self.active.contains_key(&coord) {
            return Ok(LoadOutcome::AlreadyActive);
        }
        if self.generating.contains_key(&coord) {
            if self.rewant(coord) {
                return Ok(LoadOutcome::Pending);
            }
            self.stats.deferred += 1;
            return Err(StoreError::PoolExhausted {
                capacity: self.config.max_chunks,
            });
        }
        if self.reserved() >= self.config.max_chunks {
            self.stats.deferred += 1;
            return Err(StoreError::PoolExhausted {
                capacity: self.config.max_chunks,
            });
        }

        let capacity = self.config.max_chunks;
        let Some((id, handle)) = self.pool.acquire(coord) else {
            self.stats.deferred += 1;
            return Err(StoreError::PoolExhausted { capacity });
        };
        source.generate_into(coord, handle.payload_mut());
        self.attach(coord, id);
        Ok(LoadOutcome::Loaded)
    }

    /// Evicts `coord` if it is active.
    ///
    /// A chunk still generating in the background is marked unwanted instead;
    /// its result is discarded when it arrives.
    pub fn evict(&mut self, coord: ChunkCoord) -> EvictOutcome {
        if let Some(wanted) = self.generating.get_mut(&coord) {
            *wanted = false;
            return EvictOutcome::Deferred;
        }
        let Some(id) = self.active.remove(&coord) else {
            return EvictOutcome::NotLoaded;
        };
        let released = self.pool.release(id);
        debug_assert_eq!(released, Some(coord), "handle/coordinate mapping out of sync");
        self.stats.evicted += 1;
        self.events.send(ChunkEvent::Evicted { coord });
        debug!(%coord, "chunk evicted");
        EvictOutcome::Evicted
    }

    /// Evicts every active chunk and abandons in-flight generations.
    pub fn unload_all(&mut self) -> u32 {
        for wanted in self.generating.values_mut() {
            *wanted = false;
        }
        let coords: Vec<ChunkCoord> = self.active.keys().copied().collect();
        let mut evicted = 0;
        for coord in coords {
            if self.evict(coord) == EvictOutcome::Evicted {
                evicted += 1;
            }
        }
        evicted
    }

    /// Streams chunks synchronously around `position`.
    ///
    /// Evicts every active chunk farther than `render_distance` (plus the
    /// unload margin) from the chunk containing `position`, then loads every
    /// missing chunk within `render_distance`, nearest first. Both phases
    /// complete before returning. Loads that hit pool exhaustion are counted
    /// in [`UpdateReport::deferred`] and retried on the next call.
    ///
    /// # Errors
    ///
    /// [`StoreError::ChunkSizeMismatch`] if `source` disagrees on chunk size.
    pub fn update_around<S>(
        &mut self,
        position: DVec2,
        render_distance: u32,
        source: &S,
    ) -> Result<UpdateReport, StoreError>
    where
        S: ChunkSource + ?Sized,
    {
        self.check_source(source)?;
        let center = ChunkCoord::containing(position, self.config.chunk_size);
        let mut report = UpdateReport {
            center,
            ..UpdateReport::default()
        };

        report.evicted = self.evict_outside(center, render_distance).0;

        self.enqueue_missing(center, render_distance);
        while let Some((_, coord)) = self.queue.dequeue() {
            match self.ensure_loaded(coord, source) {
                Ok(LoadOutcome::Loaded) => report.loaded += 1,
                Ok(LoadOutcome::AlreadyActive | LoadOutcome::Pending) => {}
                Err(StoreError::PoolExhausted { .. }) => report.deferred += 1,
                Err(e) => return Err(e),
            }
        }

        if report.deferred > 0 {
            warn!(
                deferred = report.deferred,
                capacity = self.config.max_chunks,
                "chunk pool exhausted, loads deferred to next update"
            );
        }
        Ok(report)
    }

    /// Streams chunks around `position` through a background executor.
    ///
    /// 1. Attaches (or discards) every result the executor has finished.
    /// 2. Evicts active chunks outside the radius and cancels unwanted work.
    /// 3. Submits missing chunks nearest first while pool capacity remains.
    ///
    /// Wanted in-flight generations count toward the pool cap, so an attach
    /// never fails for lack of a handle. Abandoned ones do not.
    pub fn schedule_around<E>(&mut self, position: DVec2, render_distance: u32, executor: &E) -> UpdateReport
    where
        E: ChunkExecutor + ?Sized,
    {
        let center = ChunkCoord::containing(position, self.config.chunk_size);
        let mut report = UpdateReport {
            center,
            ..UpdateReport::default()
        };

        for done in executor.drain_completed() {
            match self.complete(done) {
                CompletionOutcome::Attached => report.attached += 1,
                CompletionOutcome::Discarded => report.discarded += 1,
                CompletionOutcome::Cancelled | CompletionOutcome::Unexpected => {}
            }
        }

        let (evicted, abandoned) = self.evict_outside(center, render_distance);
        report.evicted = evicted;
        for coord in abandoned {
            executor.cancel(coord);
        }

        self.enqueue_missing(center, render_distance);
        while let Some((_, coord)) = self.queue.dequeue() {
            if self.generating.contains_key(&coord) {
                if !self.rewant(coord) {
                    report.deferred += 1;
                    self.stats.deferred += 1;
                }
                continue;
            }
            if self.reserved() >= self.config.max_chunks {
                report.deferred += 1;
                self.stats.deferred += 1;
                continue;
            }
            match executor.submit(coord) {
                Ok(()) => {
                    self.generating.insert(coord, true);
                    report.submitted += 1;
                }
                Err(_) => {
                    report.deferred += 1;
                    self.stats.deferred += 1;
                }
            }
        }
        self.queue.clear();

        report
    }

    /// Hands a finished background generation back to the store.
    pub fn complete(&mut self, done: CompletedChunk) -> CompletionOutcome {
        let Some(wanted) = self.generating.remove(&done.coord) else {
            return CompletionOutcome::Unexpected;
        };
        let Some(payload) = done.payload else {
            return CompletionOutcome::Cancelled;
        };
        if !wanted || !self.in_bounds(done.coord) {
            self.stats.discarded += 1;
            trace!(coord = %done.coord, "discarded result for unwanted chunk");
            return CompletionOutcome::Discarded;
        }
        debug_assert_eq!(payload.coord(), done.coord);
        debug_assert_eq!(payload.size(), self.config.chunk_size);

        let Some((id, handle)) = self.pool.acquire(done.coord) else {
            self.stats.discarded += 1;
            return CompletionOutcome::Discarded;
        };
        handle.replace_payload(payload);
        self.attach(done.coord, id);
        trace!(coord = %done.coord, us = done.generation_time_us, "attached background chunk");
        CompletionOutcome::Attached
    }

    /// Active chunks plus in-flight generations that will attach.
    fn reserved(&self) -> usize {
        self.active.len() + self.generating.values().filter(|w| **w).count()
    }

    /// Marks an in-flight generation as wanted again if capacity allows.
    fn rewant(&mut self, coord: ChunkCoord) -> bool {
        match self.generating.get(&coord) {
            Some(true) => true,
            Some(false) if self.reserved() < self.config.max_chunks => {
                self.generating.insert(coord, true);
                true
            }
            _ => false,
        }
    }

    fn check_source<S: ChunkSource + ?Sized>(&self, source: &S) -> Result<(), StoreError> {
        let found = source.chunk_size();
        if found != self.config.chunk_size {
            return Err(StoreError::ChunkSizeMismatch {
                expected: self.config.chunk_size,
                found,
            });
        }
        Ok(())
    }

    fn attach(&mut self, coord: ChunkCoord, id: HandleId) {
        let previous = self.active.insert(coord, id);
        debug_assert!(previous.is_none(), "chunk {coord} attached twice");
        self.stats.generated += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.active.len());

        if let Some(handle) = self.pool.get(id) {
            let summary = handle.payload().summary();
            self.events.send(ChunkEvent::Generated { coord, summary });
        }
        debug!(%coord, active = self.active.len(), "chunk loaded");
    }

    /// Evicts active chunks outside the keep radius and marks in-flight ones
    /// unwanted. Returns the eviction count and the abandoned coordinates.
    fn evict_outside(&mut self, center: ChunkCoord, render_distance: u32) -> (u32, Vec<ChunkCoord>) {
        let keep = render_distance.saturating_add(self.config.unload_margin);

        let stale: Vec<ChunkCoord> = self
            .active
            .keys()
            .filter(|c| !radius_contains(c.distance_sq(center), keep))
            .copied()
            .collect();
        let mut evicted = 0;
        for coord in stale {
            if self.evict(coord) == EvictOutcome::Evicted {
                evicted += 1;
            }
        }

        let mut abandoned = Vec::new();
        for (coord, wanted) in &mut self.generating {
            if *wanted && !radius_contains(coord.distance_sq(center), keep) {
                *wanted = false;
                abandoned.push(*coord);
            }
        }
        (evicted, abandoned)
    }

    fn enqueue_missing(&mut self, center: ChunkCoord, render_distance: u32) {
        self.queue.clear();
        for coord in coords_in_radius(center, render_distance) {
            if !self.active.contains_key(&coord) && self.in_bounds(coord) {
                self.queue.enqueue(coord, coord.distance_sq(center));
            }
        }
    }
}
