//! Spatial indexing for O(log n) neighbor queries.
//!
//! This module provides an R-tree based spatial index used to find
//! repulsion candidates during a layout tick and to hit-test nodes.

mod rtree;

pub use rtree::SpatialIndex;
