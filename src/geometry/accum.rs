//! Mutable accumulators for the per-node force loop.
//!
//! Summing dozens of forces through the immutable `Vector` would build a new
//! value per term. These accumulators add in place and convert once at the
//! end. Each one belongs to a single worker for a single node.

use super::{Point, Vector};

/// In-place sum of vectors.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct VectorAccumulator {
    x: f64,
    y: f64,
}

impl VectorAccumulator {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add(&mut self, v: &Vector) -> &mut Self {
        self.x += v.x();
        self.y += v.y();
        self
    }

    #[inline]
    pub(crate) fn to_vector(self) -> Vector {
        Vector::from_rectangular(self.x, self.y)
    }
}

/// In-place point arithmetic, used to assemble the next integrator position.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PointAccumulator {
    x: f64,
    y: f64,
}

impl PointAccumulator {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn from_point(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }

    #[inline]
    pub(crate) fn add_vector(&mut self, v: &Vector) -> &mut Self {
        self.x += v.x();
        self.y += v.y();
        self
    }

    #[inline]
    pub(crate) fn add_point(&mut self, p: Point) -> &mut Self {
        self.x += p.x;
        self.y += p.y;
        self
    }

    #[inline]
    pub(crate) fn subtract_point(&mut self, p: Point) -> &mut Self {
        self.x -= p.x;
        self.y -= p.y;
        self
    }

    #[inline]
    pub(crate) fn to_point(self) -> Point {
        Point::new(self.x, self.y)
    }
}
