// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! 2D vectors and points over [`FixedPoint`].
//!
//! Products are accumulated in `i128` at the doubled `2^40` scale and only
//! rescaled once, so dot and cross products carry a single rounding step.
//! The `*_wide` helpers expose that doubled-scale value for exact sign and
//! magnitude comparisons.

use core::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::error::MathError;
use crate::fixed::FixedPoint;

/// Cross-product tolerance under which two unit vectors count as parallel.
///
/// Normalization rounds each component independently, so edge normals of
/// parallel edges with different lengths can differ by a few raw units.
pub const PARALLEL_TOLERANCE: FixedPoint = FixedPoint::from_raw(64);

/// Distance (in raw units) under which two points compare equal.
pub const POINT_TOLERANCE_RAW: i64 = 8;

const POINT_TOLERANCE_SQ: i128 = (POINT_TOLERANCE_RAW as i128) * (POINT_TOLERANCE_RAW as i128);

/// Magnitudes below `2^-10` normalize too coarsely to be trusted.
const MIN_NORMALIZE_RAW: i64 = 1 << 10;

/// Free vector (displacement, velocity, axis).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector {
    /// X component.
    pub x: FixedPoint,
    /// Y component (Y-up).
    pub y: FixedPoint,
}

impl Vector {
    /// The zero vector.
    pub const ZERO: Self = Self::new(FixedPoint::ZERO, FixedPoint::ZERO);

    /// Constructs a vector from its components.
    #[must_use]
    pub const fn new(x: FixedPoint, y: FixedPoint) -> Self {
        Self { x, y }
    }

    /// Constructs a vector from integer components.
    #[must_use]
    pub const fn from_ints(x: i64, y: i64) -> Self {
        Self::new(FixedPoint::from_int(x), FixedPoint::from_int(y))
    }

    /// Returns `true` when both components are exactly zero.
    pub fn is_zero(self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// Dot product at the doubled scale. `None` on `i128` overflow.
    pub fn dot_wide(self, other: Self) -> Option<i128> {
        (i128::from(self.x.raw()) * i128::from(other.x.raw()))
            .checked_add(i128::from(self.y.raw()) * i128::from(other.y.raw()))
    }

    /// Dot product, `None` if the result leaves the representable range.
    pub fn checked_dot(self, other: Self) -> Option<FixedPoint> {
        FixedPoint::from_wide(self.dot_wide(other)?)
    }

    /// Dot product, saturating.
    pub fn dot(self, other: Self) -> FixedPoint {
        FixedPoint::dot2(self.x, other.x, self.y, other.y).unwrap_or_else(|| {
            // Only the sign matters once the result has saturated.
            let positive = (self.x.signum() * other.x.signum()) + (self.y.signum() * other.y.signum()) >= 0;
            if positive {
                FixedPoint::MAX
            } else {
                FixedPoint::MIN
            }
        })
    }

    /// Z component of the 3D cross product at the doubled scale.
    /// `None` on `i128` overflow.
    pub fn cross_wide(self, other: Self) -> Option<i128> {
        (i128::from(self.x.raw()) * i128::from(other.y.raw()))
            .checked_sub(i128::from(self.y.raw()) * i128::from(other.x.raw()))
    }

    /// Z component of the 3D cross product, saturating.
    pub fn cross(self, other: Self) -> FixedPoint {
        match self.cross_wide(other) {
            Some(wide) => FixedPoint::from_wide_saturating(wide),
            None if (self.x.signum() * other.y.signum()) >= 0 => FixedPoint::MAX,
            None => FixedPoint::MIN,
        }
    }

    /// Left perpendicular `(-y, x)`.
    ///
    /// For an edge walked along a clockwise (Y-up) polygon this points out of
    /// the polygon.
    pub fn normal(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Squared magnitude at the doubled scale. `None` on overflow.
    pub fn magnitude_squared_wide(self) -> Option<i128> {
        self.dot_wide(self)
    }

    /// Euclidean length, or `None` when an intermediate overflows.
    ///
    /// Callers fall back to a degraded (usually zero) vector instead of
    /// failing the tick.
    pub fn try_magnitude(self) -> Option<FixedPoint> {
        FixedPoint::sqrt_wide(self.magnitude_squared_wide()?)
    }

    /// Unit vector with the same direction.
    pub fn normalize(self) -> Result<Self, MathError> {
        let magnitude = self.try_magnitude().ok_or(MathError::Overflow)?;
        if magnitude.raw() < MIN_NORMALIZE_RAW {
            return Err(MathError::DegenerateVector);
        }
        Ok(Self::new(self.x.try_div(magnitude)?, self.y.try_div(magnitude)?))
    }

    /// Returns `true` when the two vectors lie on the same line (either
    /// direction). Intended for unit vectors.
    pub fn is_parallel(self, other: Self) -> bool {
        self.cross_wide(other)
            .and_then(FixedPoint::from_wide)
            .is_some_and(|c| c.abs() <= PARALLEL_TOLERANCE)
    }

    /// Component-wise absolute value.
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Halves both components.
    pub fn half(self) -> Self {
        Self::new(self.x.half(), self.y.half())
    }

    /// Doubles both components, saturating.
    pub fn double(self) -> Self {
        Self::new(self.x.double(), self.y.double())
    }
}

impl Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vector {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<FixedPoint> for Vector {
    type Output = Self;

    fn mul(self, rhs: FixedPoint) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Location in the Y-up plane.
///
/// Equality is magnitude-based: two points are equal when the vector between
/// them is shorter than [`POINT_TOLERANCE_RAW`]. Points reached through
/// different arithmetic paths (clipping, averaging) then still compare equal.
/// Because that relation is not transitive, `Point` is neither `Eq` nor
/// `Hash`; use [`Point::exact_eq`] for the strict comparison.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// X coordinate.
    pub x: FixedPoint,
    /// Y coordinate (Y-up).
    pub y: FixedPoint,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self::new(FixedPoint::ZERO, FixedPoint::ZERO);

    /// Constructs a point from its coordinates.
    #[must_use]
    pub const fn new(x: FixedPoint, y: FixedPoint) -> Self {
        Self { x, y }
    }

    /// Constructs a point from integer coordinates.
    #[must_use]
    pub const fn from_ints(x: i64, y: i64) -> Self {
        Self::new(FixedPoint::from_int(x), FixedPoint::from_int(y))
    }

    /// Bitwise equality of the raw coordinates.
    pub fn exact_eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// The displacement from the origin to this point.
    pub fn to_vector(self) -> Vector {
        Vector::new(self.x, self.y)
    }

    /// Scalar projection of this point onto `axis`, saturating.
    pub fn project_onto(self, axis: Vector) -> FixedPoint {
        self.to_vector().dot(axis)
    }

    /// Scalar projection, `None` on overflow.
    pub fn checked_project_onto(self, axis: Vector) -> Option<FixedPoint> {
        self.to_vector().checked_dot(axis)
    }

    /// Point halfway between `self` and `other`.
    pub fn midpoint(self, other: Self) -> Self {
        let x = FixedPoint::from_raw(midpoint_raw(self.x.raw(), other.x.raw()));
        let y = FixedPoint::from_raw(midpoint_raw(self.y.raw(), other.y.raw()));
        Self::new(x, y)
    }

    /// Squared distance at the doubled scale. `None` on overflow.
    pub fn distance_squared_wide(self, other: Self) -> Option<i128> {
        let dx = i128::from(self.x.raw()) - i128::from(other.x.raw());
        let dy = i128::from(self.y.raw()) - i128::from(other.y.raw());
        dx.checked_mul(dx)?.checked_add(dy.checked_mul(dy)?)
    }

    /// Returns this point moved by `offset`.
    pub fn translated(self, offset: Vector) -> Self {
        self + offset
    }
}

fn midpoint_raw(a: i64, b: i64) -> i64 {
    // (a + b) / 2 without overflowing i64.
    ((i128::from(a) + i128::from(b)) >> 1) as i64
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.distance_squared_wide(*other)
            .is_some_and(|d| d <= POINT_TOLERANCE_SQ)
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Self) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Point {
    type Output = Self;

    fn add(self, rhs: Vector) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub<Vector> for Point {
    type Output = Self;

    fn sub(self, rhs: Vector) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_of_clockwise_edge_points_outward() {
        // Left edge of a clockwise unit square, walked upward.
        let edge = Point::from_ints(0, 1) - Point::from_ints(0, 0);
        assert_eq!(edge.normal(), Vector::from_ints(-1, 0));
    }

    #[test]
    fn normalize_rejects_zero_and_tiny_vectors() {
        assert_eq!(Vector::ZERO.normalize(), Err(MathError::DegenerateVector));
        let tiny = Vector::new(FixedPoint::from_raw(3), FixedPoint::ZERO);
        assert_eq!(tiny.normalize(), Err(MathError::DegenerateVector));
    }

    #[test]
    fn normalize_reports_overflow_for_huge_vectors() {
        let huge = Vector::new(FixedPoint::MAX, FixedPoint::MAX);
        assert_eq!(huge.try_magnitude(), None);
        assert_eq!(huge.normalize(), Err(MathError::Overflow));
    }

    #[test]
    fn antiparallel_vectors_are_parallel() {
        let a = Vector::from_ints(1, 0);
        assert!(a.is_parallel(-a));
        assert!(!a.is_parallel(Vector::from_ints(0, 1)));
    }

    #[test]
    fn point_equality_tolerates_rounding_noise() {
        let a = Point::from_ints(3, 4);
        let b = a + Vector::new(FixedPoint::from_raw(2), FixedPoint::from_raw(-3));
        assert_eq!(a, b);
        assert!(!a.exact_eq(&b));
        let far = a + Vector::new(FixedPoint::from_raw(64), FixedPoint::ZERO);
        assert_ne!(a, far);
    }
}
