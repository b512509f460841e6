//! Geometry kernel for the layout engine.
//!
//! - `Point`: an immutable 2-D location
//! - `Vector`: an immutable 2-D displacement whose polar form (magnitude and
//!   angle) is computed lazily and cached on first read
//! - accumulators: mutable scratch types used inside the force summation loop

mod accum;
mod point;
mod vector;

pub(crate) use accum::{PointAccumulator, VectorAccumulator};
pub use point::Point;
pub use vector::Vector;
