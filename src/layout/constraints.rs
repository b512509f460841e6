//! Direct relaxation of angle constraints.
//!
//! Unlike the force simulation this is not physical: each constraint whose
//! angle error is small enough rotates its edge onto the ideal angle in one
//! move, displacing both endpoints equally and in opposite directions.

use std::borrow::BorrowMut;
use std::f64::consts::FRAC_PI_2;

use tracing::{debug, error};

use super::ForceLayout;
use crate::geometry::Vector;
use crate::graph::{EdgeId, LayoutGraph};

impl<G: BorrowMut<LayoutGraph>> ForceLayout<G> {
    /// Snap every constraint within `max_correction_angle` of its ideal angle
    /// onto that angle, `repetitions` times over.
    ///
    /// Constraints are relaxed one after another, so a correction can
    /// partially undo an earlier one that shares a node; repeating the pass
    /// converges on structures where the constraints agree.
    pub fn enforce_constraints(&mut self, repetitions: usize) {
        let max_angle = self.config.max_correction_angle;
        let graph: &mut LayoutGraph = self.graph.borrow_mut();

        let mut corrected = 0usize;
        for _ in 0..repetitions {
            for &edge in &self.constraints {
                let Some(geometry) = graph.geometry(edge) else {
                    continue;
                };
                let before = geometry.angle_delta();
                if before == 0.0 || before.abs() > max_angle {
                    continue;
                }

                // half the perpendicular offset between actual and ideal
                let amount = (geometry.length() * before.sin() / 2.0).abs();
                let angle = geometry.ideal_angle() - before.signum() * FRAC_PI_2;
                let (source, target) = (geometry.source_index(), geometry.target_index());
                let source_to = graph.node_at(source).position() + Vector::from_polar(amount, angle);
                let target_to =
                    graph.node_at(target).position() + Vector::from_polar(-amount, angle);

                graph.move_node(source, source_to);
                graph.move_node(target, target_to);
                corrected += 1;

                let after = graph
                    .geometry(edge)
                    .map_or(before, |geometry| geometry.angle_delta());
                let improved = after.abs() <= before.abs();
                if !improved {
                    error!(
                        edge = %EdgeId::from(edge),
                        before,
                        after,
                        "constraint correction increased the angle error"
                    );
                }
                debug_assert!(improved, "correction on {edge:?}: {before} -> {after}");
            }
        }

        debug!(repetitions, corrected, "constraints enforced");
    }
}
