//! End-to-end streaming through the world generator.

use std::time::{Duration, Instant};

use glam::DVec2;
use nebula_world::{ChunkCoord, ChunkEvent, StreamingMode, WorldGenConfig, WorldGenerator};
use rustc_hash::FxHashSet;

fn config(seed: u64, chunk_size: u32, render_distance: u32) -> WorldGenConfig {
    let mut config = WorldGenConfig::default();
    config.world.seed = seed;
    config.world.chunk_size = chunk_size;
    config.world.render_distance = render_distance;
    config
}

fn active_set(world: &WorldGenerator) -> FxHashSet<ChunkCoord> {
    world.store().active_coords().collect()
}

fn square(x0: i64, x1: i64, y0: i64, y1: i64) -> FxHashSet<ChunkCoord> {
    let mut set = FxHashSet::default();
    for x in x0..=x1 {
        for y in y0..=y1 {
            set.insert(ChunkCoord::new(x, y));
        }
    }
    set
}

#[test]
fn test_one_chunk_east_shift() {
    let mut world = WorldGenerator::new(config(42, 16, 1)).expect("default config is valid");
    assert_eq!(world.mode(), StreamingMode::Sync);

    let report = world.tick(DVec2::ZERO).expect("tick");
    assert_eq!(report.loaded, 9);
    assert_eq!(active_set(&world), square(-1, 1, -1, 1), "3x3 around the origin");
    world.drain_events();

    let report = world.tick(DVec2::new(16.0, 0.0)).expect("tick");
    assert_eq!(report.center, ChunkCoord::new(1, 0));
    assert_eq!(report.evicted, 3);
    assert_eq!(report.loaded, 3);
    assert_eq!(world.active_count(), 9);
    assert_eq!(active_set(&world), square(0, 2, -1, 1));

    let events = world.drain_events();
    let evicted: FxHashSet<_> = events
        .iter()
        .filter(|e| matches!(e, ChunkEvent::Evicted { .. }))
        .map(ChunkEvent::coord)
        .collect();
    let generated: FxHashSet<_> = events
        .iter()
        .filter(|e| matches!(e, ChunkEvent::Generated { .. }))
        .map(ChunkEvent::coord)
        .collect();
    assert_eq!(evicted, square(-1, -1, -1, 1), "west column evicted");
    assert_eq!(generated, square(2, 2, -1, 1), "east column generated");
}

#[test]
fn test_pool_stays_bounded_over_long_walk() {
    let render_distance = 1;
    let mut world = WorldGenerator::new(config(7, 8, render_distance)).expect("valid");
    let cap = world.store().config().max_chunks;
    let max_active = ((2 * render_distance + 1) * (2 * render_distance + 1)) as usize;
    assert_eq!(cap, max_active);

    // Square spiral: each leg is longer than the last, so the walk covers an
    // area far larger than the render distance.
    let directions = [DVec2::X, DVec2::Y, DVec2::NEG_X, DVec2::NEG_Y];
    let mut position = DVec2::new(4.0, 4.0);
    let mut leg = 0;
    let mut leg_len = 40;
    let mut step_in_leg = 0;
    let mut visited = FxHashSet::default();

    for _ in 0..10_000 {
        position += directions[leg % 4];
        step_in_leg += 1;
        if step_in_leg == leg_len {
            step_in_leg = 0;
            leg += 1;
            if leg % 2 == 0 {
                leg_len += 40;
            }
        }

        let report = world.tick(position).expect("tick");
        visited.insert(report.center);
        assert!(
            world.active_count() <= max_active,
            "{} active chunks exceed {max_active}",
            world.active_count()
        );
        assert!(world.store().pool().allocated() <= cap, "pool grew past its cap");
    }

    let stats = world.stats();
    assert!(stats.peak_active <= max_active);
    assert!(stats.evicted > 0 && stats.generated > stats.evicted);
    assert!(visited.len() > 100, "walk covered only {} chunks", visited.len());
    assert_eq!(world.store().pool().in_use(), world.active_count());
}

#[test]
fn test_generation_is_deterministic_across_instances() {
    let mut a = WorldGenerator::new(config(42, 16, 1)).expect("valid");
    let mut b = WorldGenerator::new(config(42, 16, 1)).expect("valid");
    let far = DVec2::new(-1000.0, 2500.0);

    // Different histories must not change content.
    b.tick(far).expect("tick");
    a.tick(DVec2::ZERO).expect("tick");
    b.tick(DVec2::ZERO).expect("tick");

    for coord in square(-1, 1, -1, 1) {
        let pa = a.chunk(coord).expect("active in a");
        let pb = b.chunk(coord).expect("active in b");
        assert_eq!(pa, pb, "chunk {coord} differs between instances");
    }

    let mut other = WorldGenerator::new(config(43, 16, 1)).expect("valid");
    other.tick(DVec2::ZERO).expect("tick");
    let origin = ChunkCoord::new(0, 0);
    assert_ne!(a.chunk(origin), other.chunk(origin), "seed must change content");
}

#[test]
fn test_chunk_seams_match_world_samples() {
    let size = 16;
    let mut world = WorldGenerator::new(config(42, size, 1)).expect("valid");
    world.tick(DVec2::ZERO).expect("tick");

    let pairs = [
        (ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)),
        (ChunkCoord::new(-1, 0), ChunkCoord::new(0, 0)),
        (ChunkCoord::new(0, 0), ChunkCoord::new(0, 1)),
        (ChunkCoord::new(0, -1), ChunkCoord::new(0, 0)),
    ];
    for (a, b) in pairs {
        let pa = world.chunk(a).expect("active");
        let pb = world.chunk(b).expect("active");
        let horizontal = a.y == b.y;
        for i in 0..size {
            let (la, lb) = if horizontal { ((size - 1, i), (0, i)) } else { ((i, size - 1), (i, 0)) };
            for (payload, coord, (lx, ly)) in [(pa, a, la), (pb, b, lb)] {
                let pos = coord.origin(size) + DVec2::new(f64::from(lx), f64::from(ly));
                assert_eq!(
                    *payload.get(lx, ly),
                    world.sample_at(pos).to_tile(),
                    "tile {lx},{ly} of {coord} disagrees with the world sample"
                );
            }
        }
    }
}

#[test]
fn test_biomes_vary_across_the_world() {
    let world = WorldGenerator::new(config(42, 16, 1)).expect("valid");
    let mut seen = FxHashSet::default();
    for i in 0..80 {
        for j in 0..80 {
            let pos = DVec2::new(f64::from(i) * 50.0, f64::from(j) * 50.0);
            let sample = world.sample_at(pos);
            assert!((0.0..=1.0).contains(&sample.height));
            assert!(world.biome_name(sample.biome).is_some(), "unknown biome id {:?}", sample.biome);
            seen.insert(sample.biome);
        }
    }
    assert!(seen.len() >= 2, "only {} biome(s) over a 4000-tile square", seen.len());
    assert_eq!(world.active_count(), 0, "point queries never generate chunks");
}

#[test]
fn test_background_streaming_converges() {
    let mut cfg = config(42, 16, 1);
    cfg.streaming.background = true;
    cfg.streaming.worker_threads = 2;
    let mut world = WorldGenerator::new(cfg).expect("valid");
    assert_eq!(world.mode(), StreamingMode::Background);

    let deadline = Instant::now() + Duration::from_secs(30);
    while world.active_count() < 9 && Instant::now() < deadline {
        world.tick(DVec2::ZERO).expect("tick");
        assert!(world.active_count() + world.store().generating_count() <= 9);
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(active_set(&world), square(-1, 1, -1, 1));

    let mut sync = WorldGenerator::new(config(42, 16, 1)).expect("valid");
    sync.tick(DVec2::ZERO).expect("tick");
    for coord in square(-1, 1, -1, 1) {
        assert_eq!(world.chunk(coord), sync.chunk(coord), "background {coord} differs from sync");
    }

    // Moving away while work is in flight never leaks handles.
    for step in 1..=20 {
        world.tick(DVec2::new(f64::from(step) * 40.0, 0.0)).expect("tick");
    }
    let deadline = Instant::now() + Duration::from_secs(30);
    while world.in_flight() > 0 && Instant::now() < deadline {
        world.tick(DVec2::new(800.0, 0.0)).expect("tick");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(world.active_count() <= 9);
    assert_eq!(world.store().pool().in_use(), world.active_count());
}

#[test]
fn test_bad_config_is_rejected_before_streaming() {
    let mut cfg = config(42, 16, 1);
    cfg.world.chunk_size = 0;
    assert!(WorldGenerator::new(cfg).is_err());
}
