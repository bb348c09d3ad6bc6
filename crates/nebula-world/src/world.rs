use std::sync::Arc;

use glam::DVec2;
use nebula_chunk::{
    BiomeId, ChunkCoord, ChunkEvent, ChunkEventBuffer, ChunkExecutor, ChunkPayload, ChunkState, ChunkStore,
    LoadOutcome, StoreStats, UpdateReport,
};
use nebula_config::WorldGenConfig;
use nebula_terrain::{AsyncChunkGenerator, TerrainGenerator, TerrainSample};
use tracing::{debug, info};

use crate::convert::{store_config, terrain_config, worker_config};
use crate::error::WorldGenError;

/// Where chunk content is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamingMode {
    /// Inside [`WorldGenerator::tick`]; every in-range chunk is active when it returns.
    Sync,
    /// On worker threads; chunks attach on a later tick.
    Background,
}

/// Single entry point for world generation.
///
/// Owns the configuration, the terrain pipeline, and the chunk store. Point
/// queries never force chunk generation.
pub struct WorldGenerator {
    config: WorldGenConfig,
    terrain: Arc<TerrainGenerator>,
    store: ChunkStore,
    workers: Option<AsyncChunkGenerator>,
    position: Option<DVec2>,
}

impl WorldGenerator {
    /// Validates `config` and builds every component.
    ///
    /// # Errors
    ///
    /// Any configuration, terrain, or store error. Nothing is left partially
    /// initialized on failure.
    pub fn new(config: WorldGenConfig) -> Result<Self, WorldGenError> {
        config.validate()?;
        let terrain = Arc::new(TerrainGenerator::new(terrain_config(&config))?);
        let store = ChunkStore::new(store_config(&config))?;
        let workers = if config.streaming.background {
            Some(AsyncChunkGenerator::new(Arc::clone(&terrain), worker_config(&config))?)
        } else {
            None
        };

        info!(
            seed = config.world.seed,
            chunk_size = config.world.chunk_size,
            render_distance = config.world.render_distance,
            max_chunks = store.config().max_chunks,
            worker_threads = workers.as_ref().map_or(0, AsyncChunkGenerator::thread_count),
            "world generator ready"
        );

        Ok(Self {
            config,
            terrain,
            store,
            workers,
            position: None,
        })
    }

    /// Streams chunks around `position`.
    ///
    /// Advances the event buffer one frame, then evicts out-of-range chunks and
    /// loads (or schedules) in-range ones. In [`StreamingMode::Sync`] every
    /// in-range chunk the pool can hold is active when this returns.
    ///
    /// # Errors
    ///
    /// Only store invariant violations; pool exhaustion is reported in the
    /// returned [`UpdateReport`] and retried next tick.
    pub fn tick(&mut self, position: DVec2) -> Result<UpdateReport, WorldGenError> {
        self.store.events_mut().swap();
        self.position = Some(position);
        let radius = self.config.world.render_distance;

        let report = match &self.workers {
            Some(workers) => self.store.schedule_around(position, radius, workers),
            None => self.store.update_around(position, radius, &*self.terrain)?,
        };
        if report.loaded + report.evicted + report.attached > 0 {
            debug!(
                center = %report.center,
                loaded = report.loaded + report.attached,
                evicted = report.evicted,
                active = self.store.active_count(),
                "tick"
            );
        }
        Ok(report)
    }

    /// Generates `coord` synchronously, regardless of streaming mode.
    ///
    /// # Errors
    ///
    /// [`StoreError::PoolExhausted`](nebula_chunk::StoreError::PoolExhausted)
    /// if no handle is free and
    /// [`StoreError::OutOfBounds`](nebula_chunk::StoreError::OutOfBounds)
    /// outside the world bounds.
    pub fn force_generate(&mut self, coord: ChunkCoord) -> Result<LoadOutcome, WorldGenError> {
        Ok(self.store.ensure_loaded(coord, &*self.terrain)?)
    }

    /// Evicts every chunk and abandons in-flight work.
    pub fn unload_all(&mut self) -> u32 {
        if let Some(workers) = &self.workers {
            for coord in self.store.generating_coords() {
                workers.cancel(coord);
            }
        }
        self.store.unload_all()
    }

    /// Biome at a world position.
    pub fn biome_at(&self, pos: DVec2) -> BiomeId {
        self.terrain.biome_at(pos)
    }

    /// Normalized height at a world position.
    pub fn height_at(&self, pos: DVec2) -> f64 {
        self.terrain.height_at(pos)
    }

    /// Every terrain value at a world position.
    pub fn sample_at(&self, pos: DVec2) -> TerrainSample {
        self.terrain.sample(pos)
    }

    /// Name of a biome id.
    pub fn biome_name(&self, id: BiomeId) -> Option<&str> {
        self.terrain.biome_name(id)
    }

    /// Payload of an active chunk.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&ChunkPayload> {
        self.store.payload(coord)
    }

    /// Lifecycle state of `coord`.
    pub fn chunk_state(&self, coord: ChunkCoord) -> ChunkState {
        self.store.state(coord)
    }

    /// Number of active chunks.
    pub fn active_count(&self) -> usize {
        self.store.active_count()
    }

    /// Events from this tick and the previous one.
    pub fn events(&self) -> &ChunkEventBuffer {
        self.store.events()
    }

    /// Takes every readable event, oldest first.
    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        self.store.events_mut().drain()
    }

    /// Cumulative store counters.
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// The chunk store.
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// The terrain pipeline.
    pub fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    /// The configuration the world was built from.
    pub fn config(&self) -> &WorldGenConfig {
        &self.config
    }

    /// Where chunk content is computed.
    pub fn mode(&self) -> StreamingMode {
        if self.workers.is_some() {
            StreamingMode::Background
        } else {
            StreamingMode::Sync
        }
    }

    /// Background generations not yet drained.
    pub fn in_flight(&self) -> usize {
        self.workers.as_ref().map_or(0, ChunkExecutor::in_flight)
    }

    /// Position passed to the last tick.
    pub fn position(&self) -> Option<DVec2> {
        self.position
    }
}

impl std::fmt::Debug for WorldGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldGenerator")
            .field("seed", &self.config.world.seed)
            .field("mode", &self.mode())
            .field("active", &self.store.active_count())
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_chunk::StoreError;

    fn config(render_distance: u32) -> WorldGenConfig {
        let mut config = WorldGenConfig::default();
        config.world.seed = 42;
        config.world.render_distance = render_distance;
        config
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut bad = config(1);
        bad.biomes.retain(|b| b.name != "plains");
        assert!(matches!(WorldGenerator::new(bad), Err(WorldGenError::Config(_))));
    }

    #[test]
    fn test_queries_do_not_generate() {
        let world = WorldGenerator::new(config(1)).expect("valid");
        let pos = DVec2::new(123.0, -45.0);
        let s = world.sample_at(pos);
        assert_eq!(s.biome, world.biome_at(pos));
        assert_eq!(s.height, world.height_at(pos));
        assert!(world.biome_name(s.biome).is_some());
        assert_eq!(world.active_count(), 0);
    }

    #[test]
    fn test_force_generate_outside_radius() {
        let mut world = WorldGenerator::new(config(1)).expect("valid");
        world.tick(DVec2::ZERO).expect("tick");
        let far = ChunkCoord::new(50, 50);
        assert!(matches!(
            world.force_generate(far),
            Err(WorldGenError::Store(StoreError::PoolExhausted { capacity: 9 }))
        ));

        let mut roomy = config(1);
        roomy.world.max_chunks = Some(10);
        let mut world = WorldGenerator::new(roomy).expect("valid");
        world.tick(DVec2::ZERO).expect("tick");
        assert_eq!(world.force_generate(far).expect("free handle"), LoadOutcome::Loaded);
        assert_eq!(world.force_generate(far).expect("idempotent"), LoadOutcome::AlreadyActive);

        // The next tick evicts it again.
        world.tick(DVec2::ZERO).expect("tick");
        assert_eq!(world.chunk_state(far), ChunkState::Unloaded);
    }

    #[test]
    fn test_events_survive_one_extra_tick() {
        let mut world = WorldGenerator::new(config(0)).expect("valid");
        world.tick(DVec2::ZERO).expect("tick");
        assert_eq!(world.events().len(), 1);
        world.tick(DVec2::ZERO).expect("tick");
        assert_eq!(world.events().len(), 1, "previous frame stays readable");
        world.tick(DVec2::ZERO).expect("tick");
        assert!(world.events().is_empty());
    }

    #[test]
    fn test_extreme_positions_stream_without_overflow() {
        let mut world = WorldGenerator::new(config(1)).expect("valid");
        for pos in [
            DVec2::new(1.0e21, 0.0),
            DVec2::new(f64::NEG_INFINITY, f64::INFINITY),
            DVec2::new(f64::NAN, -1.0e300),
        ] {
            let report = world.tick(pos).expect("tick");
            assert!(report.loaded > 0, "chunks at the grid edge still load for {pos:?}");
            assert!(world.active_count() <= 9);
        }
        world.tick(DVec2::ZERO).expect("tick");
        assert_eq!(world.active_count(), 9);
    }

    #[test]
    fn test_unload_all() {
        let mut world = WorldGenerator::new(config(1)).expect("valid");
        world.tick(DVec2::ZERO).expect("tick");
        assert_eq!(world.unload_all(), 9);
        assert_eq!(world.active_count(), 0);
        assert_eq!(world.store().pool().in_use(), 0);
    }
}
