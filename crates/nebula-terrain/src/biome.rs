//! Biome system: range-based definitions, registry, and best-fit classification.
//!
//! Biomes are chosen from normalized height, temperature and moisture. Ranges
//! may overlap; the [`BiomeClassifier`] resolves overlaps by score.

mod classifier;
mod def;
mod registry;

pub use classifier::BiomeClassifier;
pub use def::{BiomeDef, ValueRange, base_tile_for_name, default_biomes};
pub use registry::{BiomeRegistry, BiomeRegistryError};
