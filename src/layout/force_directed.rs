//! Angle-constrained force-directed layout.
//!
//! Simulates the nodes reachable from a start node as point masses:
//!
//! 1. **Forces:** every node is repelled by nearby nodes (see
//!    [`repulsion_magnitude`]) and pulled by spring and torque forces from its
//!    *incoming* edges. Each edge acts only on its target endpoint.
//! 2. **Integration:** the first tick uses a single explicit step from rest;
//!    every later tick uses damped Verlet integration with a fixed time step.
//! 3. **Commit:** new positions are computed in parallel against a consistent
//!    snapshot, then written back sequentially once every worker is done.
//!
//! Angle constraints are additionally enforced on demand by a separate,
//! non-physical relaxation pass (see `enforce_constraints`).
//!
//! [`repulsion_magnitude`]: super::forces::repulsion_magnitude

use std::borrow::{Borrow, BorrowMut};
use std::collections::HashSet;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::LayoutConfig;
use super::forces::{edge_spring_force, edge_torque_force, node_node_force};
use crate::error::{LayoutError, Result};
use crate::geometry::{Point, PointAccumulator, VectorAccumulator};
use crate::graph::{EdgeId, LayoutGraph, NodeId};
use crate::spatial::SpatialIndex;

/// Outcome of [`ForceLayout::run_until_stable`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Ticks performed by this call.
    pub ticks: usize,
    /// Energy indicator returned by the last tick.
    pub energy: f64,
    /// Whether the energy dropped below the requested tolerance.
    pub converged: bool,
}

/// Force-directed layout over the nodes reachable from a start node.
///
/// `G` is either an owned [`LayoutGraph`] or a mutable borrow of one; the
/// graph's topology must not change while the layout holds it.
pub struct ForceLayout<G = LayoutGraph> {
    pub(super) graph: G,
    pub(super) config: LayoutConfig,
    /// Working set, in traversal order.
    pub(super) nodes: Vec<NodeIndex>,
    /// One representative per undirected connection.
    pub(super) constraints: Vec<EdgeIndex>,
    new_positions: Vec<Point>,
    accels: Vec<f64>,
    first_step: bool,
}

impl<G: BorrowMut<LayoutGraph>> ForceLayout<G> {
    /// Build a layout with the default configuration.
    ///
    /// Assumes the graph already has reasonable initial positions.
    pub fn new(graph: G, start: NodeId) -> Result<Self> {
        Self::with_config(graph, start, LayoutConfig::default())
    }

    pub fn with_config(graph: G, start: NodeId, config: LayoutConfig) -> Result<Self> {
        config.validate()?;

        let topology: &LayoutGraph = graph.borrow();
        if topology.node_count() == 0 {
            return Err(LayoutError::EmptyGraph);
        }
        if !topology.contains_node(start) {
            return Err(LayoutError::NodeNotFound(start));
        }

        let nodes = topology.reachable_indices(start.index());

        let mut seen = HashSet::new();
        let mut constraints = Vec::new();
        for &node in &nodes {
            for edge in topology.edges_directed(node, Direction::Outgoing) {
                let Some(geometry) = topology.geometry(edge) else {
                    continue;
                };
                let reverse =
                    topology.find_edge_index(geometry.target_index(), geometry.source_index());
                if seen.contains(&edge) || reverse.is_some_and(|r| seen.contains(&r)) {
                    continue;
                }
                seen.insert(edge);
                constraints.push(edge);
            }
        }

        debug!(
            start = start.raw(),
            nodes = nodes.len(),
            constraints = constraints.len(),
            "force layout initialized"
        );

        Ok(Self {
            new_positions: vec![Point::ZERO; nodes.len()],
            accels: vec![0.0; nodes.len()],
            graph,
            config,
            nodes,
            constraints,
            first_step: true,
        })
    }

    /// Number of constraints found by the layout.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Number of nodes in the working set.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|&n| NodeId::from(n))
    }

    pub fn constraints(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.constraints.iter().map(|&e| EdgeId::from(e))
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Whether the next tick will use the explicit first-step integrator.
    pub fn is_first_step(&self) -> bool {
        self.first_step
    }

    pub fn graph(&self) -> &LayoutGraph {
        self.graph.borrow()
    }

    /// Move a node between ticks, e.g. while the user drags it.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> Result<()> {
        self.graph.borrow_mut().set_position(id, position)
    }

    /// Release the graph.
    pub fn into_graph(self) -> G {
        self.graph
    }

    /// Perform one tick of the simulation.
    ///
    /// Returns the sum of per-node acceleration magnitudes. It is not time or
    /// mass biased, which makes it a usable indicator of how much energy is
    /// left in the system, although only a rough, per-node approximation of
    /// it. Callers usually step until it is small or a time budget runs out.
    pub fn step(&mut self) -> f64 {
        let graph: &LayoutGraph = self.graph.borrow();
        let config = &self.config;
        let nodes = &self.nodes;
        let first_step = self.first_step;
        let dt_sq = config.timestep_squared();
        let reach_sq = 4.0 * config.k * config.k;

        let neighborhood = SpatialIndex::from_points(
            nodes
                .iter()
                .enumerate()
                .map(|(slot, &n)| (slot, graph.node_at(n).position())),
        );

        // Workers read committed positions only and write their own slot.
        self.new_positions
            .par_iter_mut()
            .zip(self.accels.par_iter_mut())
            .enumerate()
            .for_each(|(i, (next, accel))| {
                let index = nodes[i];
                let node = graph.node_at(index);

                let mut force = VectorAccumulator::new();
                // everything outside 2K contributes exactly zero
                for j in neighborhood.within_distance_2(node.position(), reach_sq) {
                    if j == i {
                        continue;
                    }
                    force.add(&node_node_force(graph, index, nodes[j], config.k));
                }
                for edge in graph.edges_directed(index, Direction::Incoming) {
                    if let Some(edge) = graph.geometry(edge) {
                        force.add(&edge_spring_force(&edge, config));
                        force.add(&edge_torque_force(&edge, config));
                    }
                }

                let acceleration = force.to_vector() / node.mass();
                *accel = acceleration.magnitude();

                *next = if first_step {
                    // explicit step from rest
                    let mut p = PointAccumulator::from_point(node.position());
                    p.add_vector(&(1.5 * &acceleration * dt_sq));
                    p.to_point()
                } else {
                    // Verlet, constant time step
                    let mut p = PointAccumulator::new();
                    p.add_point((1.0 + config.damping) * node.position())
                        .subtract_point(config.damping * node.previous_position())
                        .add_vector(&(&acceleration * dt_sq));
                    p.to_point()
                };
            });

        let graph: &mut LayoutGraph = self.graph.borrow_mut();
        let mut total_accel = 0.0;
        for (i, &index) in self.nodes.iter().enumerate() {
            graph.move_node(index, self.new_positions[i]);
            total_accel += self.accels[i];
        }

        self.first_step = false;
        trace!(energy = total_accel, "layout tick");
        total_accel
    }

    /// Step until the energy indicator drops below `tolerance`, or until
    /// `max_ticks` ticks have run.
    pub fn run_until_stable(&mut self, max_ticks: usize, tolerance: f64) -> RunSummary {
        let mut summary = RunSummary {
            ticks: 0,
            energy: f64::INFINITY,
            converged: false,
        };
        while summary.ticks < max_ticks {
            summary.energy = self.step();
            summary.ticks += 1;
            if summary.energy < tolerance {
                summary.converged = true;
                break;
            }
        }
        debug!(
            ticks = summary.ticks,
            energy = summary.energy,
            converged = summary.converged,
            "layout run finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector;
    use crate::layout::forces::repulsion_magnitude;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn two_node_spring() -> (LayoutGraph, NodeId, NodeId, EdgeId) {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(1.0, 0.0));
        let e = graph
            .add_edge_with_ideal(a, b, Vector::from_rectangular(2.0, 0.0))
            .unwrap();
        (graph, a, b, e)
    }

    #[test]
    fn test_construction_errors() {
        let mut empty = LayoutGraph::new();
        assert_eq!(
            ForceLayout::new(&mut empty, NodeId(0)).err(),
            Some(LayoutError::EmptyGraph)
        );

        let mut graph = LayoutGraph::new();
        graph.add_node(Point::ZERO);
        assert_eq!(
            ForceLayout::new(&mut graph, NodeId(5)).err(),
            Some(LayoutError::NodeNotFound(NodeId(5)))
        );

        let config = LayoutConfig {
            damping: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            ForceLayout::with_config(&mut graph, NodeId(0), config).err(),
            Some(LayoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_working_set_is_reachable_subgraph() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(0.5, 0.0));
        let stray = graph.add_node(Point::new(0.2, 0.2));
        graph.add_edge(a, b).unwrap();

        let mut layout = ForceLayout::new(&mut graph, a).unwrap();
        assert_eq!(layout.num_nodes(), 2);
        assert!(!layout.nodes().any(|n| n == stray));

        for _ in 0..5 {
            layout.step();
        }
        assert_eq!(layout.graph().position(stray), Some(Point::new(0.2, 0.2)));
    }

    #[test]
    fn test_reverse_edges_count_as_one_constraint() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(1.0, 0.0));
        let c = graph.add_node(Point::new(1.0, 1.0));
        let ab = graph.add_edge(a, b).unwrap();
        let ba = graph.add_edge(b, a).unwrap();
        graph.add_edge(b, c).unwrap();

        let layout = ForceLayout::new(&mut graph, a).unwrap();
        assert_eq!(layout.num_constraints(), 2);

        let constraints: Vec<_> = layout.constraints().collect();
        assert!(constraints.contains(&ab) ^ constraints.contains(&ba));
    }

    #[test]
    fn test_first_step_is_explicit_then_verlet() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(5.0, 0.0));
        let c = graph.add_node(Point::new(1.0, 0.0));
        // b only links a and c into one working set; it is out of their reach
        graph.add_edge(c, b).unwrap();
        graph.add_edge(b, a).unwrap();

        let config = LayoutConfig {
            spring_strength: 0.0,
            torque_strength: 0.0,
            ..Default::default()
        };
        let mut layout = ForceLayout::with_config(&mut graph, a, config).unwrap();
        assert!(layout.is_first_step());

        // a and c are 1 apart: unit repulsion each, pointing away from each other
        let energy = layout.step();
        assert!(!layout.is_first_step());
        assert!(close(energy, 2.0, 1e-12));

        let graph = layout.graph();
        let pa = graph.position(a).unwrap();
        let pc = graph.position(c).unwrap();
        assert!(close(pa.x, -0.015, 1e-12));
        assert!(close(pc.x, 1.015, 1e-12));
        assert!(pa.y.abs() < 1e-12);
        assert_eq!(graph.previous_position(a), Some(Point::new(0.0, 0.0)));

        // Verlet: 1.9 x - 0.9 x_prev + a dt^2, with the falloff at d = 1.03
        layout.step();
        let falloff = repulsion_magnitude(1.03 * 1.03, 1.0);
        let expected = 1.9 * -0.015 - falloff * 0.01;
        let pa = layout.graph().position(a).unwrap();
        assert!(close(pa.x, expected, 1e-12), "{} vs {}", pa.x, expected);
        assert_eq!(
            layout.graph().previous_position(a).map(|p| close(p.x, -0.015, 1e-12)),
            Some(true)
        );
    }

    #[test]
    fn test_edge_forces_act_on_target_only() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(5.0, 0.0));
        graph
            .add_edge_with_ideal(a, b, Vector::from_rectangular(1.0, 0.0))
            .unwrap();

        let mut layout = ForceLayout::new(&mut graph, a).unwrap();
        let energy = layout.step();

        // spring: 5 * (1 - 5) on b only
        assert!(close(energy, 20.0, 1e-9));
        assert_eq!(layout.graph().position(a), Some(Point::new(0.0, 0.0)));
        let pb = layout.graph().position(b).unwrap();
        assert!(close(pb.x, 5.0 - 1.5 * 20.0 * 0.01, 1e-9));
    }

    #[test]
    fn test_mass_scales_acceleration() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node_with_mass(Point::new(5.0, 0.0), 4.0).unwrap();
        graph
            .add_edge_with_ideal(a, b, Vector::from_rectangular(1.0, 0.0))
            .unwrap();

        let mut layout = ForceLayout::new(&mut graph, a).unwrap();
        assert!(close(layout.step(), 5.0, 1e-9));
    }

    #[test]
    fn test_two_node_spring_converges() {
        let (mut graph, _, _, e) = two_node_spring();
        let mut layout = ForceLayout::new(&mut graph, NodeId(0)).unwrap();

        let first = layout.step();
        assert!(close(first, 7.0, 1e-9));

        let mut last = first;
        for _ in 0..299 {
            last = layout.step();
        }

        let length = layout.graph().edge(e).unwrap().length();
        assert!(close(length, 2.0, 1e-3), "length {length}");
        assert!(last < 1e-3, "energy {last}");
        assert!(last < first);
    }

    #[test]
    fn test_run_until_stable() {
        let (graph, _, _, e) = two_node_spring();
        let mut layout = ForceLayout::new(graph, NodeId(0)).unwrap();

        let summary = layout.run_until_stable(1000, 1e-6);
        assert!(summary.converged);
        assert!(summary.ticks < 1000);
        assert!(summary.energy < 1e-6);

        let graph = layout.into_graph();
        assert!(close(graph.edge(e).unwrap().length(), 2.0, 1e-4));
    }

    #[test]
    fn test_run_until_stable_respects_tick_budget() {
        let (graph, _, _, _) = two_node_spring();
        let mut layout = ForceLayout::new(graph, NodeId(0)).unwrap();

        let summary = layout.run_until_stable(3, 0.0);
        assert_eq!(summary.ticks, 3);
        assert!(!summary.converged);
    }

    #[test]
    fn test_single_node_is_at_rest() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(2.0, 3.0));
        let mut layout = ForceLayout::new(&mut graph, a).unwrap();

        let summary = layout.run_until_stable(10, 1e-9);
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.energy, 0.0);
        assert_eq!(layout.graph().position(a), Some(Point::new(2.0, 3.0)));
    }

    /// Exhaustive, single-threaded tick used as a reference for `step`.
    fn reference_step(graph: &mut LayoutGraph, nodes: &[NodeIndex], first: bool) -> f64 {
        let config = LayoutConfig::default();
        let dt_sq = config.timestep_squared();
        let mut next = Vec::new();
        let mut total = 0.0;
        for (i, &index) in nodes.iter().enumerate() {
            let node = graph.node_at(index).clone();
            let mut force = VectorAccumulator::new();
            for (j, &other) in nodes.iter().enumerate() {
                if i != j {
                    force.add(&node_node_force(graph, index, other, config.k));
                }
            }
            for edge in graph.edges_directed(index, Direction::Incoming) {
                let edge = graph.geometry(edge).unwrap();
                force.add(&edge_spring_force(&edge, &config));
                force.add(&edge_torque_force(&edge, &config));
            }
            let acceleration = force.to_vector() / node.mass();
            total += acceleration.magnitude();
            next.push(if first {
                node.position() + &(1.5 * &acceleration * dt_sq)
            } else {
                (1.0 + config.damping) * node.position() - config.damping * node.previous_position()
                    + &(&acceleration * dt_sq)
            });
        }
        for (&index, p) in nodes.iter().zip(next) {
            graph.move_node(index, p);
        }
        total
    }

    #[test]
    fn test_parallel_step_matches_exhaustive_reference() {
        let mut graph = LayoutGraph::new();
        let mut ids = Vec::new();
        for row in 0..5 {
            for col in 0..5 {
                let jitter = ((row * 7 + col * 3) % 5) as f64 * 0.05;
                ids.push(graph.add_node(Point::new(col as f64 * 0.8 + jitter, row as f64 * 0.7)));
            }
        }
        for row in 0..5 {
            for col in 0..5 {
                let here = ids[row * 5 + col];
                if col + 1 < 5 {
                    let right = ids[row * 5 + col + 1];
                    graph
                        .add_edge_with_ideal(here, right, Vector::from_polar(1.0, 0.1))
                        .unwrap();
                }
                if row + 1 < 5 {
                    graph.add_edge(here, ids[(row + 1) * 5 + col]).unwrap();
                }
            }
        }

        let mut reference = graph.clone();
        let mut layout = ForceLayout::new(&mut graph, ids[12]).unwrap();
        let nodes = layout.nodes.clone();
        assert_eq!(nodes.len(), 25);

        for tick in 0..10 {
            let expected = reference_step(&mut reference, &nodes, tick == 0);
            let energy = layout.step();
            assert!(close(energy, expected, 1e-9), "tick {tick}: {energy} vs {expected}");
            for &id in &ids {
                let p = layout.graph().position(id).unwrap();
                let q = reference.position(id).unwrap();
                assert!(close(p.x, q.x, 1e-9) && close(p.y, q.y, 1e-9), "tick {tick}: {id}");
            }
        }
    }
}
