//! Command-line argument parsing for the world walker.

use std::path::PathBuf;

use clap::Parser;

use crate::WorldGenConfig;

/// World generation command-line arguments.
///
/// CLI values override settings loaded from `worldgen.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nebula-walk", about = "Stream a procedural world around a simulated walker")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tiles per chunk edge.
    #[arg(long)]
    pub chunk_size: Option<u32>,

    /// Render distance in chunks.
    #[arg(long)]
    pub render_distance: Option<u32>,

    /// Generate chunks on background worker threads.
    #[arg(long)]
    pub background: bool,

    /// Worker thread count (0 = derive from CPU count).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of simulated ticks.
    #[arg(long, default_value_t = 600)]
    pub ticks: u32,

    /// Walker speed in tiles per tick.
    #[arg(long, default_value_t = 2.0)]
    pub speed: f64,
}

impl WorldGenConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(size) = args.chunk_size {
            self.world.chunk_size = size;
        }
        if let Some(rd) = args.render_distance {
            self.world.render_distance = rd;
        }
        if args.background {
            self.streaming.background = true;
        }
        if let Some(threads) = args.threads {
            self.streaming.worker_threads = threads;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
