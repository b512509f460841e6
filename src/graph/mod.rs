//! Graph data structures and operations.
//!
//! This module provides the layout graph using petgraph's StableGraph for
//! stable node/edge indices. Nodes carry mass and position history; edges
//! carry ideal geometry and memoize their actual geometry until an endpoint
//! moves.

mod edge;
mod node;
mod topology;
mod traversal;

pub use edge::{EdgeId, LayoutEdge, angle_delta};
pub use node::{LayoutNode, NodeId};
pub use topology::{EdgeGeometry, LayoutGraph, LayoutSnapshot, NodeSnapshot};
