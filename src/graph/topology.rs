//! LayoutGraph - graph substrate for the layout engine.
//!
//! The LayoutGraph stores topology using petgraph's StableGraph, with each
//! node carrying its simulation state and each edge its ideal and memoized
//! actual geometry. All position writes go through this type so that every
//! incident edge is invalidated when a node moves.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use super::edge::{EdgeId, LayoutEdge, angle_delta};
use super::node::{LayoutNode, NodeId};
use crate::error::{LayoutError, Result};
use crate::geometry::{Point, Vector};
use crate::spatial::SpatialIndex;

/// Position of one node, as reported by [`LayoutGraph::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

/// Positions of every node in the graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub nodes: Vec<NodeSnapshot>,
}

/// Directed graph of layout nodes and edges.
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    pub(super) graph: StableGraph<LayoutNode, LayoutEdge, Directed>,
}

impl LayoutGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
        }
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, edge_capacity),
        }
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node with the default mass at the specified position.
    pub fn add_node(&mut self, position: Point) -> NodeId {
        self.graph.add_node(LayoutNode::new(position)).into()
    }

    /// Add a node with an explicit mass.
    pub fn add_node_with_mass(&mut self, position: Point, mass: f64) -> Result<NodeId> {
        let node = LayoutNode::with_mass(position, mass)?;
        Ok(self.graph.add_node(node).into())
    }

    /// Remove a node and its incident edges.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        self.graph.remove_node(id.index()).is_some()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.graph.contains_node(id.index())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node(&self, id: NodeId) -> Option<&LayoutNode> {
        self.graph.node_weight(id.index())
    }

    /// Ids of every node, in index order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(NodeId::from)
    }

    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.node(id).map(LayoutNode::position)
    }

    pub fn previous_position(&self, id: NodeId) -> Option<Point> {
        self.node(id).map(LayoutNode::previous_position)
    }

    /// Write a node's position.
    ///
    /// The old position always becomes the previous position. Incident edges
    /// are invalidated only if the position actually changed.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> Result<()> {
        if !self.contains_node(id) {
            return Err(LayoutError::NodeNotFound(id));
        }
        self.move_node(id.index(), position);
        Ok(())
    }

    pub(crate) fn move_node(&mut self, index: NodeIndex, position: Point) {
        let Some(node) = self.graph.node_weight_mut(index) else {
            return;
        };
        if !node.move_to(position) {
            return;
        }

        let mut incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        incident.extend(
            self.graph
                .edges_directed(index, Direction::Incoming)
                .map(|e| e.id()),
        );
        for edge in incident {
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                weight.invalidate();
            }
        }
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add an edge whose ideal displacement is the endpoints' current offset.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId> {
        let from = self.position(source).ok_or(LayoutError::NodeNotFound(source))?;
        let to = self.position(target).ok_or(LayoutError::NodeNotFound(target))?;
        self.add_edge_with_ideal(source, target, Point::delta(from, to))
    }

    /// Add an edge with an explicit ideal displacement.
    pub fn add_edge_with_ideal(
        &mut self,
        source: NodeId,
        target: NodeId,
        ideal: Vector,
    ) -> Result<EdgeId> {
        if !self.contains_node(source) {
            return Err(LayoutError::NodeNotFound(source));
        }
        if !self.contains_node(target) {
            return Err(LayoutError::NodeNotFound(target));
        }
        let index = self
            .graph
            .add_edge(source.index(), target.index(), LayoutEdge::new(ideal));
        Ok(index.into())
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        self.graph.remove_edge(id.index()).is_some()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Read-only geometry view of an edge.
    pub fn edge(&self, id: EdgeId) -> Option<EdgeGeometry<'_>> {
        self.geometry(id.index())
    }

    pub(crate) fn geometry(&self, index: EdgeIndex) -> Option<EdgeGeometry<'_>> {
        let edge = self.graph.edge_weight(index)?;
        let (source, target) = self.graph.edge_endpoints(index)?;
        Some(EdgeGeometry {
            graph: self,
            index,
            edge,
            source,
            target,
        })
    }

    pub fn endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.graph
            .edge_endpoints(id.index())
            .map(|(s, t)| (s.into(), t.into()))
    }

    /// The edge leading from `from` to `to`, if one exists.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.find_edge_index(from.index(), to.index()).map(EdgeId::from)
    }

    pub(crate) fn find_edge_index(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(from, to)
    }

    pub fn incoming_edges(&self, id: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges_directed(id.index(), Direction::Incoming)
            .map(EdgeId::from)
    }

    pub fn outgoing_edges(&self, id: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges_directed(id.index(), Direction::Outgoing)
            .map(EdgeId::from)
    }

    pub(crate) fn edges_directed(
        &self,
        index: NodeIndex,
        direction: Direction,
    ) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges_directed(index, direction).map(|e| e.id())
    }

    pub(crate) fn node_at(&self, index: NodeIndex) -> &LayoutNode {
        &self.graph[index]
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// The node closest to `point`, if any lies within `max_distance`.
    pub fn nearest_node(&self, point: Point, max_distance: f64) -> Option<NodeId> {
        let index = SpatialIndex::from_points(
            self.graph
                .node_indices()
                .map(|i| (i.index(), self.graph[i].position())),
        );
        index
            .nearest_within(point, max_distance)
            .map(|slot| NodeId(slot as u32))
    }

    /// Bounding box of all nodes as (min, max), or None if empty.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let mut positions = self.graph.node_weights().map(LayoutNode::position);
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }

    /// Current position of every node.
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            nodes: self
                .graph
                .node_indices()
                .map(|i| {
                    let p = self.graph[i].position();
                    NodeSnapshot {
                        id: i.index() as u32,
                        x: p.x,
                        y: p.y,
                    }
                })
                .collect(),
        }
    }
}

/// Read-only view of one edge's geometry.
///
/// `angle` and `length` read the memoized actual displacement, computing it
/// from the endpoints' current positions first if the edge is dirty.
#[derive(Clone, Copy)]
pub struct EdgeGeometry<'g> {
    graph: &'g LayoutGraph,
    index: EdgeIndex,
    edge: &'g LayoutEdge,
    source: NodeIndex,
    target: NodeIndex,
}

impl<'g> EdgeGeometry<'g> {
    pub fn id(&self) -> EdgeId {
        self.index.into()
    }

    pub fn source(&self) -> NodeId {
        self.source.into()
    }

    pub fn target(&self) -> NodeId {
        self.target.into()
    }

    pub(crate) fn source_index(&self) -> NodeIndex {
        self.source
    }

    pub(crate) fn target_index(&self) -> NodeIndex {
        self.target
    }

    pub fn is_dirty(&self) -> bool {
        self.edge.is_dirty()
    }

    /// Actual displacement from source to target.
    pub fn actual(&self) -> &'g Vector {
        let graph = self.graph;
        let (source, target) = (self.source, self.target);
        self.edge.actual_or_init(|| {
            Point::delta(
                graph.node_at(source).position(),
                graph.node_at(target).position(),
            )
        })
    }

    pub fn ideal(&self) -> &'g Vector {
        self.edge.ideal()
    }

    /// Actual angle from source towards target.
    pub fn angle(&self) -> f64 {
        self.actual().angle()
    }

    /// Actual length from source to target.
    pub fn length(&self) -> f64 {
        self.actual().magnitude()
    }

    pub fn ideal_angle(&self) -> f64 {
        self.edge.ideal_angle()
    }

    pub fn ideal_length(&self) -> f64 {
        self.edge.ideal_length()
    }

    /// `ideal_angle - angle`, folded into `(-π, π]`.
    pub fn angle_delta(&self) -> f64 {
        angle_delta(self.ideal_angle(), self.angle())
    }

    /// `ideal_length - length`.
    pub fn length_delta(&self) -> f64 {
        self.ideal_length() - self.length()
    }
}
