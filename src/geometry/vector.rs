//! Immutable 2-D displacement with a lazily cached polar form.
//!
//! A `Vector` stores its rectangular components eagerly. Magnitude and angle
//! are derived on first read and cached in lock-free slots, so the same
//! instance can be read from several layout workers at once: every worker
//! computes the same deterministic value and the last store wins.
//!
//! Invariants:
//! - `magnitude() >= 0`
//! - `angle()` lies in `[0, 2π)` for every non-degenerate vector

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

use super::Point;

const UNSET: u64 = f64::NAN.to_bits();

/// A cached `f64` slot. NaN marks "not computed yet".
struct LazyScalar(AtomicU64);

impl LazyScalar {
    const fn unset() -> Self {
        Self(AtomicU64::new(UNSET))
    }

    const fn known(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    fn peek(&self) -> Option<f64> {
        let value = f64::from_bits(self.0.load(Ordering::Relaxed));
        (!value.is_nan()).then_some(value)
    }

    #[inline]
    fn get_or_compute(&self, compute: impl FnOnce() -> f64) -> f64 {
        if let Some(value) = self.peek() {
            return value;
        }
        let value = compute();
        self.0.store(value.to_bits(), Ordering::Relaxed);
        value
    }
}

impl Clone for LazyScalar {
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.0.load(Ordering::Relaxed)))
    }
}

/// A displacement in layout space.
#[derive(Clone)]
pub struct Vector {
    x: f64,
    y: f64,
    magnitude: LazyScalar,
    angle: LazyScalar,
}

impl Vector {
    /// The vector of no length or direction.
    #[inline]
    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            magnitude: LazyScalar::known(0.0),
            angle: LazyScalar::known(0.0),
        }
    }

    /// Rectangular components only; the polar form is derived on demand.
    const fn lazy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            magnitude: LazyScalar::unset(),
            angle: LazyScalar::unset(),
        }
    }

    /// Rectangular components with a known polar form.
    ///
    /// A negative magnitude is flipped positive and the angle is turned by a
    /// quarter turn, keeping the cached angle inside `[0, 2π)`.
    fn with_polar(x: f64, y: f64, mut magnitude: f64, mut angle: f64) -> Self {
        if magnitude < 0.0 {
            if angle < FRAC_PI_2 {
                angle += FRAC_PI_2;
            } else {
                angle -= FRAC_PI_2;
            }
            magnitude = -magnitude;
        }

        Self {
            x,
            y,
            magnitude: LazyScalar::known(magnitude),
            angle: if (0.0..TAU).contains(&angle) {
                LazyScalar::known(angle)
            } else {
                LazyScalar::unset()
            },
        }
    }

    /// Create a vector from rectangular coordinates.
    pub fn from_rectangular(x: f64, y: f64) -> Self {
        if x == 0.0 && y == 0.0 {
            return Self::zero();
        }
        Self::lazy(x, y)
    }

    /// Create a vector from polar coordinates.
    ///
    /// The supplied magnitude and angle are cached directly only when the angle
    /// already lies in `[0, 2π)`; otherwise they are re-derived (and the angle
    /// re-normalized) from the rectangular components on first read.
    pub fn from_polar(magnitude: f64, angle: f64) -> Self {
        if magnitude == 0.0 {
            return Self::zero();
        }

        let x = angle.cos() * magnitude;
        let y = angle.sin() * magnitude;

        if !(0.0..TAU).contains(&angle) {
            Self::lazy(x, y)
        } else {
            Self::with_polar(x, y, magnitude, angle)
        }
    }

    /// The X component.
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// The Y component.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Whether both components are zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Length of the vector.
    pub fn magnitude(&self) -> f64 {
        let magnitude = self
            .magnitude
            .get_or_compute(|| (self.x * self.x + self.y * self.y).sqrt());
        debug_assert!(magnitude >= 0.0, "negative magnitude {magnitude}");
        magnitude
    }

    /// Angle of the vector in radians, in `[0, 2π)`.
    pub fn angle(&self) -> f64 {
        self.angle
            .get_or_compute(|| rectangular_angle(self.x, self.y))
    }

    /// Angle in radians of the line leading from `from` to `to`, in `[0, 2π)`.
    pub fn angle_between(from: Point, to: Point) -> f64 {
        rectangular_angle(to.x - from.x, to.y - from.y)
    }

    /// Scale by `s`, carrying the cached polar form along when there is one.
    fn scaled(&self, s: f64) -> Vector {
        if s == 0.0 || self.is_zero() {
            return Vector::zero();
        }

        match (self.magnitude.peek(), self.angle.peek()) {
            (Some(magnitude), Some(angle)) => {
                Vector::with_polar(self.x * s, self.y * s, magnitude * s, angle)
            }
            _ => Vector::lazy(self.x * s, self.y * s),
        }
    }
}

/// `atan2` folded into `[0, 2π)`.
fn rectangular_angle(x: f64, y: f64) -> f64 {
    let mut angle = y.atan2(x);
    if angle < 0.0 {
        angle += TAU;
    }
    // rounding can land exactly on 2π
    if angle == TAU {
        angle = 0.0;
    }

    debug_assert!((0.0..TAU).contains(&angle), "angle {angle} out of range");
    angle
}

impl Default for Vector {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl Add for &Vector {
    type Output = Vector;

    fn add(self, rhs: &Vector) -> Vector {
        if self.is_zero() {
            return rhs.clone();
        }
        if rhs.is_zero() {
            return self.clone();
        }
        Vector::from_rectangular(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    #[inline]
    fn add(self, rhs: Vector) -> Vector {
        &self + &rhs
    }
}

impl Sub for &Vector {
    type Output = Vector;

    fn sub(self, rhs: &Vector) -> Vector {
        if rhs.is_zero() {
            return self.clone();
        }
        if self.is_zero() {
            return -rhs;
        }
        Vector::from_rectangular(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Sub for Vector {
    type Output = Vector;

    #[inline]
    fn sub(self, rhs: Vector) -> Vector {
        &self - &rhs
    }
}

impl Neg for &Vector {
    type Output = Vector;

    #[inline]
    fn neg(self) -> Vector {
        self.scaled(-1.0)
    }
}

impl Neg for Vector {
    type Output = Vector;

    #[inline]
    fn neg(self) -> Vector {
        self.scaled(-1.0)
    }
}

impl Mul<f64> for &Vector {
    type Output = Vector;

    #[inline]
    fn mul(self, s: f64) -> Vector {
        self.scaled(s)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    #[inline]
    fn mul(self, s: f64) -> Vector {
        self.scaled(s)
    }
}

impl Mul<&Vector> for f64 {
    type Output = Vector;

    #[inline]
    fn mul(self, v: &Vector) -> Vector {
        v.scaled(self)
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;

    #[inline]
    fn mul(self, v: Vector) -> Vector {
        v.scaled(self)
    }
}

impl Div<f64> for &Vector {
    type Output = Vector;

    #[inline]
    fn div(self, s: f64) -> Vector {
        self.scaled(1.0 / s)
    }
}

impl Div<f64> for Vector {
    type Output = Vector;

    #[inline]
    fn div(self, s: f64) -> Vector {
        self.scaled(1.0 / s)
    }
}
