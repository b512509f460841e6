use std::collections::VecDeque;

use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{VisitMap, Visitable};

use super::{LayoutGraph, NodeId};

impl LayoutGraph {
    /// Breadth-first walk from `start`, following edges in both directions.
    /// Every connected node is returned exactly once, in visit order.
    /// Returns an empty list if `start` is not in the graph.
    pub fn reachable_from(&self, start: NodeId) -> Vec<NodeId> {
        self.reachable_indices(start.index())
            .into_iter()
            .map(NodeId::from)
            .collect()
    }

    pub(crate) fn reachable_indices(&self, start: NodeIndex) -> Vec<NodeIndex> {
        if !self.graph.contains_node(start) {
            return Vec::new();
        }

        let mut discovered = self.graph.visit_map();
        let mut queue = VecDeque::new();
        let mut order = Vec::new();

        discovered.visit(start);
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for neighbor in self.graph.neighbors_undirected(node) {
                if discovered.visit(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        order
    }
}
