//! Edge type and related structures.
//!
//! Each layout edge has:
//! - A stable unique identifier
//! - A fixed ideal displacement (target length and angle)
//! - A memoized actual displacement, derived from its endpoints' positions

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::sync::OnceLock;

use petgraph::stable_graph::EdgeIndex;

use crate::geometry::Vector;

/// Stable edge identifier.
///
/// This ID remains valid even after other edges are removed from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Create a new EdgeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> EdgeIndex {
        EdgeIndex::new(self.0 as usize)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({})", self.0)
    }
}

impl From<u32> for EdgeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EdgeId> for u32 {
    #[inline]
    fn from(id: EdgeId) -> Self {
        id.0
    }
}

impl From<EdgeIndex> for EdgeId {
    #[inline]
    fn from(index: EdgeIndex) -> Self {
        Self(index.index() as u32)
    }
}

/// Geometry state of a directed edge.
///
/// The actual displacement is either cached (clean) or absent (dirty). New
/// edges start dirty so the first read derives fresh geometry. The cache is a
/// `OnceLock`, so workers reading a dirty edge concurrently race only to store
/// the same value.
#[derive(Debug)]
pub struct LayoutEdge {
    ideal: Vector,
    actual: OnceLock<Vector>,
}

impl LayoutEdge {
    pub fn new(ideal: Vector) -> Self {
        Self {
            ideal,
            actual: OnceLock::new(),
        }
    }

    /// The fixed target displacement from source to target.
    #[inline]
    pub fn ideal(&self) -> &Vector {
        &self.ideal
    }

    #[inline]
    pub fn ideal_angle(&self) -> f64 {
        self.ideal.angle()
    }

    #[inline]
    pub fn ideal_length(&self) -> f64 {
        self.ideal.magnitude()
    }

    /// Whether the next read must recompute the actual displacement.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.actual.get().is_none()
    }

    #[inline]
    pub(crate) fn invalidate(&mut self) {
        self.actual.take();
    }

    #[inline]
    pub(crate) fn actual_or_init(&self, compute: impl FnOnce() -> Vector) -> &Vector {
        self.actual.get_or_init(compute)
    }
}

impl Clone for LayoutEdge {
    /// Clones start dirty; they may end up attached to different endpoints.
    fn clone(&self) -> Self {
        Self::new(self.ideal.clone())
    }
}

/// Fold `ideal - actual` into `(-π, π]`.
pub fn angle_delta(ideal: f64, actual: f64) -> f64 {
    let mut delta = ideal - actual;
    if delta > PI {
        delta -= TAU;
    } else if delta <= -PI {
        delta += TAU;
    }

    debug_assert!(delta > -PI && delta <= PI, "angle delta {delta} out of range");
    delta
}
