//! Chunk-grid coordinates and optional world bounds.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Identifies a chunk's position on the 2D chunk grid.
///
/// World tile `(wx, wy)` belongs to chunk `(floor(wx / size), floor(wy / size))`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk-grid X coordinate.
    pub x: i64,
    /// Chunk-grid Y coordinate.
    pub y: i64,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns the coordinate offset by `(dx, dy)` chunks, saturating at the grid edge.
    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// The chunk containing a continuous world position.
    ///
    /// Uses floor division so negative positions map to negative chunks
    /// (`-0.5` lies in chunk `-1`, not `0`). Positions beyond the grid clamp
    /// to its edge and NaN maps to zero.
    pub fn containing(position: DVec2, chunk_size: u32) -> Self {
        let size = f64::from(chunk_size.max(1));
        Self {
            x: grid_axis(position.x / size),
            y: grid_axis(position.y / size),
        }
    }

    /// World position of this chunk's local tile `(0, 0)`.
    pub fn origin(self, chunk_size: u32) -> DVec2 {
        let size = f64::from(chunk_size);
        DVec2::new(self.x as f64 * size, self.y as f64 * size)
    }

    /// World tile coordinates of a local tile inside this chunk.
    pub fn world_tile(self, chunk_size: u32, local_x: u32, local_y: u32) -> (i64, i64) {
        let size = i64::from(chunk_size);
        (
            self.x.saturating_mul(size).saturating_add(i64::from(local_x)),
            self.y.saturating_mul(size).saturating_add(i64::from(local_y)),
        )
    }

    /// Two coordinates are adjacent when they differ by one along exactly one axis.
    pub fn is_adjacent(self, other: Self) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.saturating_add(dy) == 1
    }

    /// Squared Euclidean distance in chunk units, saturating at `u64::MAX`.
    pub fn distance_sq(self, other: Self) -> u64 {
        let dx = u128::from(self.x.abs_diff(other.x));
        let dy = u128::from(self.y.abs_diff(other.y));
        let d = (dx * dx).saturating_add(dy * dy);
        u64::try_from(d).unwrap_or(u64::MAX)
    }
}

fn grid_axis(v: f64) -> i64 {
    if v.is_nan() {
        return 0;
    }
    // Float-to-int `as` saturates, so infinities land on the grid edge.
    v.floor() as i64
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive rectangle of chunk coordinates a bounded world may load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBounds {
    /// Smallest loadable coordinate on both axes.
    pub min: ChunkCoord,
    /// Largest loadable coordinate on both axes.
    pub max: ChunkCoord,
}

impl ChunkBounds {
    /// Creates bounds from two corners. Returns `None` if `min` exceeds `max` on either axis.
    pub fn new(min: ChunkCoord, max: ChunkCoord) -> Option<Self> {
        (min.x <= max.x && min.y <= max.y).then_some(Self { min, max })
    }

    /// Returns `true` if `coord` lies inside the rectangle.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        coord.x >= self.min.x && coord.x <= self.max.x && coord.y >= self.min.y && coord.y <= self.max.y
    }
}
