//! Node type and related structures.
//!
//! Each layout node has:
//! - A stable unique identifier (survives graph mutations)
//! - A fixed mass
//! - Its current position and the position it held before the last write

use std::fmt;

use petgraph::stable_graph::NodeIndex;

use crate::error::{LayoutError, Result};
use crate::geometry::Point;

/// Stable node identifier.
///
/// This ID remains valid even after other nodes are removed from the graph.
/// It wraps a u32 for efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
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
    pub(crate) fn index(self) -> NodeIndex {
        NodeIndex::new(self.0 as usize)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl From<NodeIndex> for NodeId {
    #[inline]
    fn from(index: NodeIndex) -> Self {
        Self(index.index() as u32)
    }
}

/// Simulation state of a single node.
///
/// Positions are written through [`LayoutGraph::set_position`], which also
/// invalidates the geometry cached on every incident edge.
///
/// [`LayoutGraph::set_position`]: super::LayoutGraph::set_position
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    mass: f64,
    position: Point,
    previous_position: Point,
}

impl LayoutNode {
    pub const DEFAULT_MASS: f64 = 1.0;

    /// A node with the default mass, resting at `position`.
    pub fn new(position: Point) -> Self {
        Self {
            mass: Self::DEFAULT_MASS,
            position,
            previous_position: position,
        }
    }

    /// A node with an explicit mass. The mass must be positive and finite.
    pub fn with_mass(position: Point, mass: f64) -> Result<Self> {
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(LayoutError::InvalidMass(mass));
        }
        Ok(Self {
            mass,
            ..Self::new(position)
        })
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    /// The position held immediately before the most recent write.
    #[inline]
    pub fn previous_position(&self) -> Point {
        self.previous_position
    }

    /// Record a write. History is updated unconditionally; returns whether
    /// the position actually changed.
    pub(crate) fn move_to(&mut self, position: Point) -> bool {
        self.previous_position = self.position;
        if position == self.position {
            return false;
        }
        self.position = position;
        true
    }
}

impl Default for LayoutNode {
    fn default() -> Self {
        Self::new(Point::ZERO)
    }
}
