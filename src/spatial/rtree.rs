//! R-tree based spatial index using the rstar crate.
//!
//! Provides O(log n) spatial queries for:
//! - Nearest neighbor (hit testing)
//! - Point-in-radius (repulsion candidates during a layout tick)

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::geometry::Point;

/// A point in the spatial index with the slot it was loaded from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotPoint {
    /// Caller-defined key (a working-set slot or a node index).
    pub slot: usize,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl SlotPoint {
    /// Create a new SlotPoint.
    pub fn new(slot: usize, position: Point) -> Self {
        Self {
            slot,
            x: position.x,
            y: position.y,
        }
    }
}

impl RTreeObject for SlotPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for SlotPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.x == point[0] && self.y == point[1]
    }
}

/// Spatial index over a fixed set of positions.
///
/// Built in bulk from a snapshot of positions; rebuild it after positions
/// change rather than updating in place.
pub struct SpatialIndex {
    tree: RTree<SlotPoint>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk load an index from (slot, position) pairs.
    pub fn from_points(points: impl IntoIterator<Item = (usize, Point)>) -> Self {
        let points: Vec<_> = points
            .into_iter()
            .map(|(slot, position)| SlotPoint::new(slot, position))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Find the nearest slot within a maximum distance.
    pub fn nearest_within(&self, center: Point, max_distance: f64) -> Option<usize> {
        let query = [center.x, center.y];
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&query)
            .filter(|point| point.distance_2(&query) <= max_distance_sq)
            .map(|point| point.slot)
    }

    /// Slots whose squared distance to `center` is at most `radius_sq`,
    /// sorted ascending.
    pub fn within_distance_2(&self, center: Point, radius_sq: f64) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .tree
            .locate_within_distance([center.x, center.y], radius_sq)
            .map(|point| point.slot)
            .collect();
        slots.sort_unstable();
        slots
    }

    /// Get the number of points in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
