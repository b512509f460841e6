//! Immutable 2-D location.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::Vector;

/// A location in layout space, in arbitrary caller units.
///
/// Equality is exact-value: two points are equal only if both coordinates
/// compare equal as `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// The origin of the coordinate system.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether this point is the origin.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// The displacement leading from `from` to `to`.
    ///
    /// Returns the zero vector when both points coincide.
    pub fn delta(from: Point, to: Point) -> Vector {
        Vector::from_rectangular(to.x - from.x, to.y - from.y)
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl From<(f64, f64)> for Point {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Add<&Vector> for Point {
    type Output = Point;

    fn add(self, rhs: &Vector) -> Point {
        if rhs.is_zero() {
            return self;
        }
        Point::new(self.x + rhs.x(), self.y + rhs.y())
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Vector) -> Point {
        self + &rhs
    }
}

impl Add<Point> for Vector {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        rhs + &self
    }
}

impl Sub<&Vector> for Point {
    type Output = Point;

    fn sub(self, rhs: &Vector) -> Point {
        if rhs.is_zero() {
            return self;
        }
        Point::new(self.x - rhs.x(), self.y - rhs.y())
    }
}

impl Sub<Vector> for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Vector) -> Point {
        self - &rhs
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        if rhs.is_zero() {
            return self;
        }
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, s: f64) -> Point {
        if s == 0.0 {
            return Point::ZERO;
        }
        Point::new(self.x * s, self.y * s)
    }
}

impl Mul<Point> for f64 {
    type Output = Point;

    #[inline]
    fn mul(self, p: Point) -> Point {
        p * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_zero_point_is_stable() {
        assert_eq!(Point::ZERO, Point::new(0.0, 0.0));
        assert_eq!(Point::default(), Point::ZERO);
        assert!(Point::new(0.0, 0.0).is_zero());
        assert!(!Point::new(0.0, 1.0).is_zero());
    }

    #[test]
    fn test_delta_matches_atan2_and_distance() {
        let from = Point::new(1.0, 2.0);
        let to = Point::new(4.0, 6.0);
        let delta = Point::delta(from, to);

        assert_eq!(delta.x(), 3.0);
        assert_eq!(delta.y(), 4.0);
        assert_eq!(delta.magnitude(), 5.0);
        assert_eq!(delta.angle(), 4.0f64.atan2(3.0));
    }

    #[test]
    fn test_delta_negative_quadrant_wraps_angle() {
        let delta = Point::delta(Point::new(0.0, 0.0), Point::new(0.0, -2.0));
        assert!((delta.angle() - (PI + FRAC_PI_2)).abs() < 1e-12);
        assert_eq!(delta.magnitude(), 2.0);
    }

    #[test]
    fn test_delta_of_same_point_is_zero_vector() {
        let p = Point::new(3.5, -1.25);
        let delta = Point::delta(p, p);
        assert!(delta.is_zero());
        assert_eq!(delta, Vector::zero());
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(1.0, 2.0);
        let q = Point::new(0.5, -1.0);

        assert_eq!(p + q, Point::new(1.5, 1.0));
        assert_eq!(p - q, Point::new(0.5, 3.0));
        assert_eq!(p + Point::ZERO, p);
        assert_eq!(Point::ZERO + q, q);
        assert_eq!(p * 2.0, Point::new(2.0, 4.0));
        assert_eq!(3.0 * p, Point::new(3.0, 6.0));
        assert_eq!(p * 0.0, Point::ZERO);
    }

    #[test]
    fn test_point_vector_arithmetic() {
        let p = Point::new(1.0, 1.0);
        let v = Vector::from_rectangular(2.0, -3.0);

        assert_eq!(p + &v, Point::new(3.0, -2.0));
        assert_eq!(p - &v, Point::new(-1.0, 4.0));
        assert_eq!(v + p, Point::new(3.0, -2.0));
        assert_eq!(p + Vector::zero(), p);
    }

    #[test]
    fn test_distance_squared() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_squared(b), 25.0);
        assert_eq!(b.distance_squared(a), 25.0);
    }
}
