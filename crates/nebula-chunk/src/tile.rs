//! Per-tile data and the discrete kinds scattered across a chunk.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Index of a biome in the world's biome table.
///
/// Table order is significant: the classifier breaks score ties in favour of
/// the lower index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BiomeId(pub u16);

/// Surface kind of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    /// Open water.
    #[default]
    Water,
    /// Beach or desert sand.
    Sand,
    /// Grassland.
    Grass,
    /// Bare rock.
    Stone,
    /// Snow cover.
    Snow,
    /// Carved cave floor.
    Cave,
}

impl TileType {
    /// All tile types in declaration order.
    pub const ALL: [TileType; 6] = [
        TileType::Water,
        TileType::Sand,
        TileType::Grass,
        TileType::Stone,
        TileType::Snow,
        TileType::Cave,
    ];

    /// Lowercase identifier used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            TileType::Water => "water",
            TileType::Sand => "sand",
            TileType::Grass => "grass",
            TileType::Stone => "stone",
            TileType::Snow => "snow",
            TileType::Cave => "cave",
        }
    }
}

/// Structure archetypes placed on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Settlement dwelling.
    House,
    /// Single tree.
    Tree,
    /// Opening into a cave system.
    CaveEntrance,
    /// Desert cactus.
    Cactus,
}

impl StructureKind {
    /// All structure kinds in declaration order.
    pub const ALL: [StructureKind; 4] = [
        StructureKind::House,
        StructureKind::Tree,
        StructureKind::CaveEntrance,
        StructureKind::Cactus,
    ];

    /// Lowercase identifier used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            StructureKind::House => "house",
            StructureKind::Tree => "tree",
            StructureKind::CaveEntrance => "cave_entrance",
            StructureKind::Cactus => "cactus",
        }
    }
}

/// Harvestable resource types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Timber.
    Wood,
    /// Metal ore.
    Ore,
    /// Crystal deposit.
    Crystal,
    /// Medicinal herb.
    Herb,
}

impl ResourceKind {
    /// All resource kinds in declaration order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Wood,
        ResourceKind::Ore,
        ResourceKind::Crystal,
        ResourceKind::Herb,
    ];

    /// Lowercase identifier used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Wood => "wood",
            ResourceKind::Ore => "ore",
            ResourceKind::Crystal => "crystal",
            ResourceKind::Herb => "herb",
        }
    }
}

/// Everything generated for one tile.
///
/// Scalar fields are normalized to `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TileSample {
    /// Surface kind after cave carving.
    pub tile: TileType,
    /// Biome the tile was classified as.
    pub biome: BiomeId,
    /// Terrain height.
    pub height: f32,
    /// Temperature.
    pub temperature: f32,
    /// Moisture.
    pub moisture: f32,
}

/// A structure scattered within a chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureInstance {
    /// Structure archetype.
    pub kind: StructureKind,
    /// World-space position of the structure's anchor tile.
    pub position: DVec2,
    /// Biome at the anchor.
    pub biome: BiomeId,
    /// Terrain height at the anchor.
    pub height: f32,
}

/// A harvestable resource node scattered within a chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceInstance {
    /// Resource type.
    pub kind: ResourceKind,
    /// World-space position of the node.
    pub position: DVec2,
    /// Biome at the node.
    pub biome: BiomeId,
    /// Units available, always at least one.
    pub quantity: u32,
}
