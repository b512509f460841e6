//! Force-directed layout with angle constraints.
//!
//! The layout operates on the connected component around a start node and
//! moves nodes in place on a [`LayoutGraph`](crate::graph::LayoutGraph):
//! `step` advances the simulation one tick and `enforce_constraints` snaps
//! near-satisfied edges onto their ideal angles.

mod config;
mod constraints;
mod force_directed;
mod forces;

pub use config::LayoutConfig;
pub use force_directed::{ForceLayout, RunSummary};
pub use forces::{edge_spring_force, edge_torque_force, repulsion_magnitude};
