//! Configuration structs with sensible defaults and RON persistence.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use nebula_chunk::{MAX_RENDER_DISTANCE, ResourceKind, StructureKind, TileType, square_count};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside a config directory.
pub const CONFIG_FILE_NAME: &str = "worldgen.ron";

/// Platform config directory for world generation settings.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nebula-worldgen"))
}

/// Top-level world generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldGenConfig {
    /// Seed, chunk geometry, and streaming radius.
    pub world: WorldConfig,
    /// Fractal parameters per noise channel.
    pub noise: NoiseConfig,
    /// Water and cave thresholds.
    pub terrain: TerrainConfig,
    /// Structure and resource placement.
    pub features: FeaturesConfig,
    /// Ordered biome table. Order is the classifier's tie-break.
    pub biomes: Vec<BiomeConfig>,
    /// Background generation settings.
    pub streaming: StreamingConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World geometry and streaming radius.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed.
    pub seed: u64,
    /// Tiles per chunk edge.
    pub chunk_size: u32,
    /// Radius in chunks that must stay loaded.
    pub render_distance: u32,
    /// Extra chunks beyond the render distance before eviction.
    pub unload_margin: u32,
    /// Hard cap on pooled chunks; derived from the radius when unset.
    pub max_chunks: Option<usize>,
    /// Optional inclusive chunk rectangle; the world is unbounded when unset.
    pub bounds: Option<BoundsConfig>,
}

/// Inclusive rectangle in chunk coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundsConfig {
    /// Lowest `(x, y)` chunk.
    pub min: [i64; 2],
    /// Highest `(x, y)` chunk.
    pub max: [i64; 2],
}

/// Fractal parameters for one noise channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelConfig {
    /// Frequency of the first octave, in cycles per tile.
    pub frequency: f64,
    /// Number of octaves.
    pub octaves: u32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
}

/// Fractal parameters for every channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    /// Base elevation.
    pub height: ChannelConfig,
    /// Climate temperature.
    pub temperature: ChannelConfig,
    /// Climate moisture.
    pub moisture: ChannelConfig,
    /// Elevation detail.
    pub detail: ChannelConfig,
    /// Cave mask.
    pub cave: ChannelConfig,
    /// Structure placement mask.
    pub structure: ChannelConfig,
    /// Share of detail noise mixed into height.
    pub detail_weight: f64,
}

/// Tile thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Height at or below which tiles are never carved.
    pub water_level: f64,
    /// Normalized cave-noise value above which tiles become caves.
    pub cave_threshold: f64,
}

/// Structure and resource placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Tiles between structure candidates.
    pub structure_stride: u32,
    /// Normalized structure-noise threshold.
    pub structure_threshold: f64,
    /// Tiles between resource candidates.
    pub resource_stride: u32,
    /// Smallest resource quantity.
    pub quantity_min: u32,
    /// Largest resource quantity.
    pub quantity_max: u32,
    /// Resource spawn rules per biome.
    pub resources: Vec<ResourceRuleConfig>,
    /// Structure type per biome.
    pub structures: Vec<StructureRuleConfig>,
    /// Structure for biomes without a rule.
    pub default_structure: StructureKind,
}

/// One biome's resource rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRuleConfig {
    /// Biome name.
    pub biome: String,
    /// Resource spawned.
    pub resource: ResourceKind,
    /// Spawn chance per candidate.
    pub probability: f64,
}

/// One biome's structure rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureRuleConfig {
    /// Biome name.
    pub biome: String,
    /// Structure placed.
    pub structure: StructureKind,
}

/// One biome table entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BiomeConfig {
    /// Unique biome name.
    pub name: String,
    /// Accepted height `[min, max]`.
    pub height: [f64; 2],
    /// Accepted temperature `[min, max]`.
    pub temperature: [f64; 2],
    /// Accepted moisture `[min, max]`.
    pub moisture: [f64; 2],
    /// Base tile override.
    #[serde(default)]
    pub surface: Option<TileType>,
}

impl BiomeConfig {
    fn new(name: &str, height: [f64; 2], temperature: [f64; 2], moisture: [f64; 2]) -> Self {
        Self {
            name: name.to_string(),
            height,
            temperature,
            moisture,
            surface: None,
        }
    }

    /// Returns `true` if every axis accepts the whole unit interval.
    pub fn is_universal(&self) -> bool {
        [self.height, self.temperature, self.moisture]
            .iter()
            .all(|r| r[0] <= 0.0 && r[1] >= 1.0)
    }
}

/// Background generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Generate chunks on worker threads instead of inside `tick`.
    pub background: bool,
    /// Worker threads (0 = derive from CPU count).
    pub worker_threads: usize,
    /// Maximum submitted-but-undrained chunks.
    pub max_in_flight: usize,
    /// Completed-chunk channel capacity.
    pub result_capacity: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Also write JSON logs to a file in the log directory.
    pub log_to_file: bool,
}

// --- Default implementations ---

impl Default for WorldGenConfig {
    fn default() -> Self {
        let full = [0.0, 1.0];
        Self {
            world: WorldConfig::default(),
            noise: NoiseConfig::default(),
            terrain: TerrainConfig::default(),
            features: FeaturesConfig::default(),
            biomes: vec![
                BiomeConfig::new("ocean", [0.0, 0.3], full, full),
                BiomeConfig::new("beach", [0.28, 0.36], [0.2, 1.0], full),
                BiomeConfig::new("plains", full, full, full),
                BiomeConfig::new("forest", [0.35, 0.75], [0.3, 0.8], [0.5, 1.0]),
                BiomeConfig::new("desert", [0.3, 0.7], [0.6, 1.0], [0.0, 0.35]),
                BiomeConfig::new("mountains", [0.65, 0.9], full, full),
                BiomeConfig::new("snow", [0.82, 1.0], [0.0, 0.6], full),
            ],
            streaming: StreamingConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_size: 16,
            render_distance: 4,
            unload_margin: 0,
            max_chunks: None,
            bounds: None,
        }
    }
}

impl ChannelConfig {
    fn with(frequency: f64, octaves: u32) -> Self {
        Self {
            frequency,
            octaves,
            ..Self::default()
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            frequency: 0.01,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            height: ChannelConfig::with(0.01, 5),
            temperature: ChannelConfig::with(0.004, 3),
            moisture: ChannelConfig::with(0.005, 3),
            detail: ChannelConfig::with(0.08, 2),
            cave: ChannelConfig::with(0.05, 2),
            structure: ChannelConfig::with(0.1, 1),
            detail_weight: 0.15,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            water_level: 0.3,
            cave_threshold: 0.7,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        let res = |biome: &str, resource, probability| ResourceRuleConfig {
            biome: biome.to_string(),
            resource,
            probability,
        };
        let st = |biome: &str, structure| StructureRuleConfig {
            biome: biome.to_string(),
            structure,
        };
        Self {
            structure_stride: 8,
            structure_threshold: 0.7,
            resource_stride: 4,
            quantity_min: 1,
            quantity_max: 5,
            resources: vec![
                res("forest", ResourceKind::Wood, 0.10),
                res("mountains", ResourceKind::Ore, 0.05),
                res("desert", ResourceKind::Crystal, 0.03),
                res("plains", ResourceKind::Herb, 0.08),
            ],
            structures: vec![
                st("forest", StructureKind::Tree),
                st("mountains", StructureKind::CaveEntrance),
                st("desert", StructureKind::Cactus),
            ],
            default_structure: StructureKind::House,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            background: false,
            worker_threads: 0,
            max_in_flight: 64,
            result_capacity: 128,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl NoiseConfig {
    /// Channels in seed-offset order: height, temperature, moisture, detail, cave, structure.
    pub fn channels(&self) -> [(&'static str, &ChannelConfig); 6] {
        [
            ("height", &self.height),
            ("temperature", &self.temperature),
            ("moisture", &self.moisture),
            ("detail", &self.detail),
            ("cave", &self.cave),
            ("structure", &self.structure),
        ]
    }
}

// --- Validation ---

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn check_unit(name: &str, v: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(format!("{name} = {v} must lie in [0, 1]")))
    }
}

impl WorldGenConfig {
    /// Pool cap: the configured value, or the square fitting the keep radius.
    pub fn effective_max_chunks(&self) -> usize {
        self.world.max_chunks.unwrap_or_else(|| {
            square_count(self.world.render_distance.saturating_add(self.world.unload_margin))
        })
    }

    /// Checks everything a world needs to start.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_world()?;
        self.validate_noise()?;
        self.validate_biomes()?;
        self.validate_features()?;

        check_unit("terrain.water_level", self.terrain.water_level)?;
        check_unit("terrain.cave_threshold", self.terrain.cave_threshold)?;

        if self.streaming.max_in_flight == 0 || self.streaming.result_capacity == 0 {
            return Err(invalid("streaming queues must have positive capacity"));
        }
        Ok(())
    }

    fn validate_world(&self) -> Result<(), ConfigError> {
        let w = &self.world;
        if w.chunk_size == 0 {
            return Err(invalid("world.chunk_size must be positive"));
        }
        if w.max_chunks == Some(0) {
            return Err(invalid("world.max_chunks must be positive"));
        }
        if let Some(b) = &w.bounds
            && (b.min[0] > b.max[0] || b.min[1] > b.max[1])
        {
            return Err(invalid(format!("world.bounds min {:?} exceeds max {:?}", b.min, b.max)));
        }
        let keep = w.render_distance.saturating_add(w.unload_margin);
        if keep > MAX_RENDER_DISTANCE {
            return Err(invalid(format!(
                "world.render_distance + world.unload_margin = {keep} exceeds {MAX_RENDER_DISTANCE}"
            )));
        }
        let square = square_count(keep);
        if self.effective_max_chunks() < square {
            log::warn!(
                "max_chunks {} is below the {} chunks the keep radius can hold; loads will be deferred",
                self.effective_max_chunks(),
                square
            );
        }
        Ok(())
    }

    fn validate_noise(&self) -> Result<(), ConfigError> {
        for (name, ch) in self.noise.channels() {
            if !(ch.frequency.is_finite() && ch.frequency > 0.0) {
                return Err(invalid(format!("noise.{name}.frequency must be positive")));
            }
            if ch.octaves == 0 {
                return Err(invalid(format!("noise.{name}.octaves must be at least 1")));
            }
            if !(ch.lacunarity > 0.0 && ch.persistence > 0.0) {
                return Err(invalid(format!("noise.{name} lacunarity and persistence must be positive")));
            }
        }
        check_unit("noise.detail_weight", self.noise.detail_weight)
    }

    fn validate_biomes(&self) -> Result<(), ConfigError> {
        if self.biomes.is_empty() {
            return Err(invalid("biome table is empty"));
        }
        let mut seen = HashSet::new();
        for b in &self.biomes {
            if !seen.insert(b.name.as_str()) {
                return Err(invalid(format!("duplicate biome name: {}", b.name)));
            }
            for (axis, r) in [("height", b.height), ("temperature", b.temperature), ("moisture", b.moisture)] {
                if !((0.0..=1.0).contains(&r[0]) && (0.0..=1.0).contains(&r[1]) && r[0] <= r[1]) {
                    return Err(invalid(format!("biome {}: invalid {axis} range {r:?}", b.name)));
                }
            }
        }
        if !self.biomes.iter().any(BiomeConfig::is_universal) {
            return Err(invalid("biome table has no universally permissive fallback entry"));
        }
        Ok(())
    }

    fn validate_features(&self) -> Result<(), ConfigError> {
        let f = &self.features;
        if f.structure_stride == 0 || f.resource_stride == 0 {
            return Err(invalid("feature strides must be positive"));
        }
        check_unit("features.structure_threshold", f.structure_threshold)?;
        if f.quantity_min == 0 || f.quantity_min > f.quantity_max {
            return Err(invalid(format!(
                "features quantity range {}..={} must be non-empty and positive",
                f.quantity_min, f.quantity_max
            )));
        }
        let known = |name: &str| self.biomes.iter().any(|b| b.name == name);
        for r in &f.resources {
            check_unit(&format!("features.resources[{}].probability", r.biome), r.probability)?;
            if !known(&r.biome) {
                return Err(invalid(format!("resource rule references unknown biome: {}", r.biome)));
            }
        }
        for s in &f.structures {
            if !known(&s.biome) {
                return Err(invalid(format!("structure rule references unknown biome: {}", s.biome)));
            }
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl WorldGenConfig {
    /// Load the config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::load(&config_path)?;
            log::info!("Loaded world config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save(config_dir)?;
            log::info!("Created default world config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }

    /// Save the config to the given directory as `worldgen.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::load(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("World config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
