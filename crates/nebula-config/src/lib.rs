//! World generation configuration.
//!
//! Settings persist to disk as RON (`worldgen.ron`), accept CLI overrides via
//! clap, and are validated before a world is built so bad tables fail fast.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BiomeConfig, BoundsConfig, ChannelConfig, DebugConfig, FeaturesConfig, NoiseConfig,
    ResourceRuleConfig, StreamingConfig, StructureRuleConfig, TerrainConfig, WorldConfig,
    WorldGenConfig, CONFIG_FILE_NAME, default_config_dir,
};
pub use error::ConfigError;
