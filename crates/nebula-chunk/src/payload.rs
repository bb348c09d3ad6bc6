//! Generated chunk content: a square tile grid plus scattered features.

use rustc_hash::FxHashMap;

use crate::coord::ChunkCoord;
use crate::tile::{BiomeId, ResourceInstance, StructureInstance, TileSample};

/// The full generated content of one chunk.
///
/// Tiles are stored row-major: index `y * size + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkPayload {
    coord: ChunkCoord,
    size: u32,
    tiles: Vec<TileSample>,
    /// Structures anchored inside this chunk.
    pub structures: Vec<StructureInstance>,
    /// Resource nodes inside this chunk.
    pub resources: Vec<ResourceInstance>,
}

/// Compact description of a payload carried by lifecycle events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PayloadSummary {
    /// Most common biome; ties go to the lower biome id.
    pub dominant_biome: BiomeId,
    /// Mean tile height in `[0.0, 1.0]`.
    pub mean_height: f32,
    /// Number of structures in the chunk.
    pub structure_count: u32,
    /// Number of resource nodes in the chunk.
    pub resource_count: u32,
}

impl ChunkPayload {
    /// Creates a payload with `size * size` default tiles.
    pub fn new(coord: ChunkCoord, size: u32) -> Self {
        let mut payload = Self {
            coord,
            size: 0,
            tiles: Vec::new(),
            structures: Vec::new(),
            resources: Vec::new(),
        };
        payload.reset(coord, size);
        payload
    }

    /// Re-targets the payload at a new coordinate, keeping allocated capacity.
    ///
    /// All tiles are reset to their default and feature lists are emptied.
    pub fn reset(&mut self, coord: ChunkCoord, size: u32) {
        let len = (size as usize) * (size as usize);
        self.coord = coord;
        self.size = size;
        self.tiles.clear();
        self.tiles.resize(len, TileSample::default());
        self.structures.clear();
        self.resources.clear();
    }

    /// The chunk this payload was generated for.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Tiles per chunk edge.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the tile at local `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is not below [`size`](Self::size).
    pub fn get(&self, x: u32, y: u32) -> &TileSample {
        &self.tiles[self.index(x, y)]
    }

    /// Overwrites the tile at local `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is not below [`size`](Self::size).
    pub fn set(&mut self, x: u32, y: u32, sample: TileSample) {
        let index = self.index(x, y);
        self.tiles[index] = sample;
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> &[TileSample] {
        &self.tiles
    }

    /// Iterates `(local_x, local_y, tile)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &TileSample)> {
        let size = self.size.max(1);
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| ((i as u32) % size, (i as u32) / size, t))
    }

    /// Builds the event summary for this payload.
    pub fn summary(&self) -> PayloadSummary {
        let mut counts: FxHashMap<BiomeId, u32> = FxHashMap::default();
        let mut height_sum = 0.0f64;
        for tile in &self.tiles {
            *counts.entry(tile.biome).or_insert(0) += 1;
            height_sum += f64::from(tile.height);
        }

        let dominant_biome = counts
            .into_iter()
            .max_by(|(a_id, a_n), (b_id, b_n)| a_n.cmp(b_n).then(b_id.cmp(a_id)))
            .map(|(id, _)| id)
            .unwrap_or_default();

        let mean_height = if self.tiles.is_empty() {
            0.0
        } else {
            (height_sum / self.tiles.len() as f64) as f32
        };

        PayloadSummary {
            dominant_biome,
            mean_height,
            structure_count: self.structures.len() as u32,
            resource_count: self.resources.len() as u32,
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.size && y < self.size,
            "local tile ({x}, {y}) outside chunk of size {}",
            self.size
        );
        (y as usize) * (self.size as usize) + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileType;

    fn sample(biome: u16, height: f32) -> TileSample {
        TileSample {
            tile: TileType::Grass,
            biome: BiomeId(biome),
            height,
            temperature: 0.5,
            moisture: 0.5,
        }
    }

    #[test]
    fn test_new_payload_has_size_squared_tiles() {
        let p = ChunkPayload::new(ChunkCoord::new(3, -4), 16);
        assert_eq!(p.tiles().len(), 256);
        assert_eq!(p.coord(), ChunkCoord::new(3, -4));
        assert_eq!(*p.get(15, 15), TileSample::default());
    }

    #[test]
    fn test_set_get_row_major() {
        let mut p = ChunkPayload::new(ChunkCoord::new(0, 0), 4);
        p.set(1, 2, sample(3, 0.7));
        assert_eq!(p.tiles()[2 * 4 + 1].biome, BiomeId(3));
        let (x, y, _) = p.iter().nth(9).expect("16 tiles");
        assert_eq!((x, y), (1, 2));
    }

    #[test]
    fn test_reset_keeps_capacity_and_clears() {
        let mut p = ChunkPayload::new(ChunkCoord::new(0, 0), 8);
        p.set(0, 0, sample(1, 0.9));
        let capacity = p.tiles.capacity();
        p.reset(ChunkCoord::new(5, 5), 8);
        assert_eq!(p.coord(), ChunkCoord::new(5, 5));
        assert_eq!(*p.get(0, 0), TileSample::default());
        assert_eq!(p.tiles.capacity(), capacity, "reset must not reallocate");
    }

    #[test]
    fn test_summary_dominant_biome_tie_goes_to_lower_id() {
        let mut p = ChunkPayload::new(ChunkCoord::new(0, 0), 2);
        p.set(0, 0, sample(4, 0.2));
        p.set(1, 0, sample(4, 0.2));
        p.set(0, 1, sample(2, 0.6));
        p.set(1, 1, sample(2, 0.6));
        let s = p.summary();
        assert_eq!(s.dominant_biome, BiomeId(2));
        assert!((s.mean_height - 0.4).abs() < 1e-6);
        assert_eq!(s.structure_count, 0);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_tile_panics() {
        let p = ChunkPayload::new(ChunkCoord::new(0, 0), 4);
        let _ = p.get(4, 0);
    }
}
