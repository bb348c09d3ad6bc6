//! Render-radius geometry and the nearest-first load queue.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use crate::coord::ChunkCoord;

/// Largest radius [`coords_in_radius`] enumerates.
pub const MAX_RENDER_DISTANCE: u32 = 256;

/// Returns `true` if a chunk at squared distance `dist_sq` from the center lies
/// inside `radius`.
///
/// Distance is Euclidean between chunk centers with half a chunk of tolerance,
/// i.e. `dist <= radius + 0.5`. This keeps the full `(2r+1)²` square for
/// `r <= 1` while rounding off the corners of larger radii, and never admits
/// anything outside that square.
pub fn radius_contains(dist_sq: u64, radius: u32) -> bool {
    let diameter = 2 * u128::from(radius) + 1;
    4 * u128::from(dist_sq) <= diameter * diameter
}

/// All coordinates within `radius` of `center`, nearest first.
///
/// Equal distances keep row-major order so the sequence is deterministic.
/// `radius` is capped at [`MAX_RENDER_DISTANCE`]. Near the grid edge offsets
/// saturate and the clamped duplicates are dropped.
pub fn coords_in_radius(center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
    let radius = radius.min(MAX_RENDER_DISTANCE);
    let r = i64::from(radius);
    let mut coords = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for dy in -r..=r {
        for dx in -r..=r {
            let dist_sq = (dx * dx + dy * dy) as u64;
            if radius_contains(dist_sq, radius) {
                coords.push(center.offset(dx, dy));
            }
        }
    }
    coords.sort_by_key(|c| (c.distance_sq(center), c.y, c.x));
    coords.dedup();
    coords
}

/// Priority queue for chunks awaiting loading, ordered by distance to the center.
#[derive(Debug, Default)]
pub struct ChunkLoadQueue {
    queue: BinaryHeap<Reverse<(u64, ChunkCoord)>>,
    pending: FxHashSet<ChunkCoord>,
}

impl ChunkLoadQueue {
    /// Creates an empty load queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a coordinate with its squared distance. Duplicates are ignored.
    pub fn enqueue(&mut self, coord: ChunkCoord, dist_sq: u64) {
        if self.pending.insert(coord) {
            self.queue.push(Reverse((dist_sq, coord)));
        }
    }

    /// Dequeues the nearest coordinate.
    pub fn dequeue(&mut self) -> Option<(u64, ChunkCoord)> {
        while let Some(Reverse((dist_sq, coord))) = self.queue.pop() {
            if self.pending.remove(&coord) {
                return Some((dist_sq, coord));
            }
        }
        None
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending coordinates.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Clears the queue.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_one_is_full_square() {
        let coords = coords_in_radius(ChunkCoord::new(0, 0), 1);
        assert_eq!(coords.len(), 9);
        assert_eq!(coords[0], ChunkCoord::new(0, 0), "center loads first");
    }

    #[test]
    fn test_radius_zero_is_center_only() {
        assert_eq!(coords_in_radius(ChunkCoord::new(4, 2), 0), vec![ChunkCoord::new(4, 2)]);
    }

    #[test]
    fn test_larger_radius_stays_within_square() {
        for r in 0..8u32 {
            let n = coords_in_radius(ChunkCoord::new(0, 0), r).len();
            let side = (2 * r + 1) as usize;
            assert!(n <= side * side, "radius {r} produced {n} chunks");
        }
        // Corners of the r=2 square are more than 2.5 chunks away.
        assert!(!coords_in_radius(ChunkCoord::new(0, 0), 2).contains(&ChunkCoord::new(2, 2)));
    }

    #[test]
    fn test_grid_edge_does_not_overflow() {
        let edge = ChunkCoord::new(i64::MAX, 0);
        let coords = coords_in_radius(edge, 1);
        assert_eq!(coords.len(), 6, "the clamped column collapses onto the edge");
        assert!(coords.iter().all(|c| c.x >= i64::MAX - 1));

        let corner = ChunkCoord::new(i64::MIN, i64::MIN);
        assert_eq!(coords_in_radius(corner, 1).len(), 4);
        assert!(radius_contains(u64::MAX / 4, u32::MAX));
        assert!(!radius_contains(u64::MAX, 0));
    }

    #[test]
    fn test_radius_is_capped() {
        let capped = coords_in_radius(ChunkCoord::new(0, 0), u32::MAX).len();
        let max = coords_in_radius(ChunkCoord::new(0, 0), MAX_RENDER_DISTANCE).len();
        assert_eq!(capped, max);
    }

    #[test]
    fn test_priority_queue_orders_by_distance() {
        let mut queue = ChunkLoadQueue::new();
        queue.enqueue(ChunkCoord::new(5, 0), 25);
        queue.enqueue(ChunkCoord::new(2, 0), 4);
        queue.enqueue(ChunkCoord::new(1, 0), 1);
        queue.enqueue(ChunkCoord::new(2, 0), 4);

        let mut distances = Vec::new();
        while let Some((d, _)) = queue.dequeue() {
            distances.push(d);
        }
        assert_eq!(distances, vec![1, 4, 25]);
    }
}
