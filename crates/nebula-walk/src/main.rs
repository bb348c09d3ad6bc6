//! Headless walker that streams a procedural world around a moving position.
//!
//! Configuration is loaded from `worldgen.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p nebula-walk -- --seed 42 --ticks 1000`.
//! Add `--background` to generate chunks on worker threads.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::DVec2;
use nebula_config::{CliArgs, WorldGenConfig, default_config_dir};
use nebula_log::LogOptions;
use nebula_world::{ChunkCoord, ChunkEvent, WorldGenerator};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

/// Chance per tick that the walker changes heading.
const TURN_CHANCE: f64 = 0.02;

/// A point wandering across the world at constant speed.
struct Walker {
    position: DVec2,
    heading: f64,
    speed: f64,
    rng: ChaCha8Rng,
}

impl Walker {
    fn new(seed: u64, speed: f64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let heading = rng.random_range(0.0..std::f64::consts::TAU);
        Self {
            position: DVec2::ZERO,
            heading,
            speed,
            rng,
        }
    }

    fn step(&mut self) -> DVec2 {
        if self.rng.random_bool(TURN_CHANCE) {
            let half = std::f64::consts::FRAC_PI_2;
            self.heading += self.rng.random_range(-half..half);
        }
        self.position += DVec2::from_angle(self.heading) * self.speed;
        self.position
    }
}

#[derive(Default)]
struct WalkTotals {
    generated: u64,
    evicted: u64,
    structures: u64,
    resources: u64,
    chunks_entered: u64,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = match &config_dir {
        Some(dir) => WorldGenConfig::load_or_create(dir).unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}, using defaults");
            WorldGenConfig::default()
        }),
        None => WorldGenConfig::default(),
    };
    config.apply_cli_overrides(&args);

    let log_options = LogOptions::from_config(config_dir.as_ref().map(|d| d.join("logs")), &config);
    nebula_log::init_logging(&log_options, Some(&config));

    let mut world = match WorldGenerator::new(config) {
        Ok(world) => world,
        Err(e) => {
            error!("cannot start world generation: {e}");
            return ExitCode::FAILURE;
        }
    };

    match walk(&mut world, args.ticks, args.speed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("walk aborted: {e}");
            ExitCode::FAILURE
        }
    }
}

fn walk(world: &mut WorldGenerator, ticks: u32, speed: f64) -> Result<(), nebula_world::WorldGenError> {
    let chunk_size = world.config().world.chunk_size;
    let mut walker = Walker::new(world.config().world.seed, speed);
    let mut totals = WalkTotals::default();
    let mut last_chunk: Option<ChunkCoord> = None;
    let started = Instant::now();

    for tick in 0..ticks {
        let position = walker.step();
        let report = world.tick(position)?;
        if report.deferred > 0 {
            debug!(tick, deferred = report.deferred, "loads deferred");
        }

        for event in world.drain_events() {
            match event {
                ChunkEvent::Generated { summary, .. } => {
                    totals.generated += 1;
                    totals.structures += u64::from(summary.structure_count);
                    totals.resources += u64::from(summary.resource_count);
                }
                ChunkEvent::Evicted { .. } => totals.evicted += 1,
            }
        }

        let chunk = ChunkCoord::containing(position, chunk_size);
        if last_chunk != Some(chunk) {
            totals.chunks_entered += 1;
            let sample = world.sample_at(position);
            debug!(
                tick,
                %chunk,
                biome = world.biome_name(sample.biome).unwrap_or("?"),
                height = sample.height,
                tile = sample.tile.name(),
                "entered chunk"
            );
            last_chunk = Some(chunk);
        }
    }

    // Let background work settle so the summary reflects a quiet store.
    let deadline = Instant::now() + Duration::from_secs(5);
    while world.in_flight() > 0 && Instant::now() < deadline {
        world.tick(walker.position)?;
        std::thread::sleep(Duration::from_millis(2));
    }
    if world.in_flight() > 0 {
        warn!(in_flight = world.in_flight(), "background generation still running at exit");
    }

    let stats = world.stats();
    info!(
        ticks,
        elapsed_ms = started.elapsed().as_millis() as u64,
        chunks_entered = totals.chunks_entered,
        generated = stats.generated,
        evicted = stats.evicted,
        deferred = stats.deferred,
        discarded = stats.discarded,
        peak_active = stats.peak_active,
        structures = totals.structures,
        resources = totals.resources,
        "walk finished"
    );
    debug!(observed_generated = totals.generated, observed_evicted = totals.evicted, "event totals");
    Ok(())
}
