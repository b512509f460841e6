//! Force law for the force-directed layout.
//!
//! - node/node repulsion, piecewise in squared distance and zero beyond `2K`
//! - edge spring force along the edge, toward its ideal length
//! - edge torque perpendicular to the edge, toward its ideal angle

use std::f64::consts::FRAC_PI_2;

use petgraph::stable_graph::NodeIndex;

use super::LayoutConfig;
use crate::geometry::Vector;
use crate::graph::{EdgeGeometry, LayoutGraph};

/// Repulsion magnitude at squared distance `distance_sq`.
///
/// Continuous at `K²` and `4K²`. Coincident points and points at `2K` or
/// beyond produce no force.
pub fn repulsion_magnitude(distance_sq: f64, k: f64) -> f64 {
    let k_sq = k * k;
    if distance_sq >= 4.0 * k_sq {
        0.0
    } else if distance_sq > k_sq {
        // linear falloff to zero at 2K
        (-distance_sq.sqrt() / k + 2.0).min(k)
    } else if distance_sq > 0.0 {
        (k_sq / distance_sq).min(k)
    } else {
        0.0
    }
}

/// Repulsive force on `a` from `b`, pointing from `b` toward `a`.
///
/// When an edge leads from `b` to `a` its cached angle gives the direction,
/// otherwise the raw angle between the two positions does.
pub(crate) fn node_node_force(
    graph: &LayoutGraph,
    a: NodeIndex,
    b: NodeIndex,
    k: f64,
) -> Vector {
    let pa = graph.node_at(a).position();
    let pb = graph.node_at(b).position();

    let magnitude = repulsion_magnitude(pa.distance_squared(pb), k);
    if magnitude == 0.0 {
        return Vector::zero();
    }

    let angle = match graph
        .find_edge_index(b, a)
        .and_then(|edge| graph.geometry(edge))
    {
        Some(edge) => edge.angle(),
        None => Vector::angle_between(pb, pa),
    };
    Vector::from_polar(magnitude, angle)
}

/// Spring force along the edge's current angle, toward its ideal length.
pub fn edge_spring_force(edge: &EdgeGeometry<'_>, config: &LayoutConfig) -> Vector {
    let force = config.spring_strength * edge.length_delta() / config.k;
    Vector::from_polar(force, edge.angle())
}

/// Torque force perpendicular to the edge, toward its ideal angle.
pub fn edge_torque_force(edge: &EdgeGeometry<'_>, config: &LayoutConfig) -> Vector {
    let force = config.torque_strength * edge.angle_delta() / config.k;
    Vector::from_polar(force, edge.angle() + FRAC_PI_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_repulsion_is_continuous_at_breakpoints() {
        for k in [0.5, 1.0, 2.0] {
            let k_sq = k * k;

            let inner = repulsion_magnitude(k_sq, k);
            let outer = repulsion_magnitude(k_sq * (1.0 + 1e-12), k);
            assert!((inner - outer).abs() < 1e-9, "K={k}: {inner} vs {outer}");

            let edge = repulsion_magnitude(4.0 * k_sq, k);
            let near_edge = repulsion_magnitude(4.0 * k_sq * (1.0 - 1e-12), k);
            assert_eq!(edge, 0.0);
            assert!(near_edge.abs() < 1e-9, "K={k}: {near_edge}");
        }
    }

    #[test]
    fn test_repulsion_zero_cases() {
        assert_eq!(repulsion_magnitude(0.0, 1.0), 0.0);
        assert_eq!(repulsion_magnitude(4.0, 1.0), 0.0);
        assert_eq!(repulsion_magnitude(100.0, 1.0), 0.0);
    }

    #[test]
    fn test_repulsion_shape() {
        // capped at K for very close points
        assert_eq!(repulsion_magnitude(0.01, 1.0), 1.0);
        assert_eq!(repulsion_magnitude(1.0, 1.0), 1.0);
        assert!((repulsion_magnitude(2.25, 1.0) - 0.5).abs() < EPS);
        // decreasing across the falloff region
        let mut last = f64::INFINITY;
        for i in 1..20 {
            let d = 1.0 + i as f64 / 20.0;
            let m = repulsion_magnitude(d * d, 1.0);
            assert!(m < last);
            last = m;
        }
    }

    #[test]
    fn test_node_node_force_uses_raw_angle_without_edge() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(0.0, 1.5));

        let force = node_node_force(&graph, a.index(), b.index(), 1.0);
        assert!((force.magnitude() - 0.5).abs() < EPS);
        assert!((force.angle() - 3.0 * PI / 2.0).abs() < EPS);
    }

    #[test]
    fn test_node_node_force_prefers_edge_angle() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(1.0, 0.0));
        let b = graph.add_node(Point::new(0.0, 0.0));
        graph.add_edge(b, a).unwrap();

        let on_a = node_node_force(&graph, a.index(), b.index(), 1.0);
        assert!((on_a.x() - 1.0).abs() < EPS);
        assert!(on_a.y().abs() < EPS);

        // no edge from a to b: falls back to the raw angle
        let on_b = node_node_force(&graph, b.index(), a.index(), 1.0);
        assert!((on_b.x() + 1.0).abs() < EPS);
    }

    #[test]
    fn test_node_node_force_out_of_range_and_coincident() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(2.0, 0.0));
        let c = graph.add_node(Point::new(0.0, 0.0));

        assert!(node_node_force(&graph, a.index(), b.index(), 1.0).is_zero());
        assert!(node_node_force(&graph, a.index(), c.index(), 1.0).is_zero());
    }

    #[test]
    fn test_spring_pushes_target_toward_ideal_length() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(1.0, 0.0));
        let e = graph
            .add_edge_with_ideal(a, b, Vector::from_rectangular(2.0, 0.0))
            .unwrap();
        let config = LayoutConfig::default();

        let stretch = edge_spring_force(&graph.edge(e).unwrap(), &config);
        assert!((stretch.x() - 5.0).abs() < EPS);

        graph.set_position(b, Point::new(3.0, 0.0)).unwrap();
        let shrink = edge_spring_force(&graph.edge(e).unwrap(), &config);
        assert!((shrink.x() + 5.0).abs() < EPS);
        assert!(shrink.y().abs() < EPS);
    }

    #[test]
    fn test_torque_turns_edge_toward_ideal_angle() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(1.0, 0.0));
        // ideal points up-right; the target should be pushed up
        let e = graph
            .add_edge_with_ideal(a, b, Vector::from_polar(1.0, 0.1))
            .unwrap();
        let config = LayoutConfig::default();

        let torque = edge_torque_force(&graph.edge(e).unwrap(), &config);
        assert!((torque.y() - 1.0).abs() < 1e-9);
        assert!(torque.x().abs() < 1e-9);

        let aligned = graph
            .add_edge_with_ideal(a, b, Vector::from_rectangular(5.0, 0.0))
            .unwrap();
        assert!(edge_torque_force(&graph.edge(aligned).unwrap(), &config).is_zero());
    }
}
