// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use strata_math::{FixedPoint, Point, Vector};

/// Axis-aligned bounding box.
///
/// Invariants:
/// - `min` components are less than or equal to `max` components.
/// - Coordinates are fixed-point, Y-up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    min: Point,
    max: Point,
}

impl BoundingBox {
    /// Constructs a box from its minimum and maximum corners.
    ///
    /// # Panics
    /// Panics if any component of `min` is greater than its counterpart in `max`.
    #[must_use]
    pub fn new(min: Point, max: Point) -> Self {
        assert!(min.x <= max.x && min.y <= max.y, "invalid bounding box: min > max");
        Self { min, max }
    }

    /// Returns the minimum corner.
    #[must_use]
    pub fn min(&self) -> Point {
        self.min
    }

    /// Returns the maximum corner.
    #[must_use]
    pub fn max(&self) -> Point {
        self.max
    }

    /// `max.x - min.x`.
    pub fn width(&self) -> FixedPoint {
        self.max.x - self.min.x
    }

    /// `max.y - min.y`.
    pub fn height(&self) -> FixedPoint {
        self.max.y - self.min.y
    }

    /// Returns `true` if this box overlaps another (inclusive on faces).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        // Inclusive so touching boxes still reach the narrow phase.
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// Returns the union of two boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Grows the box by `dx` on both horizontal sides and `dy` on both
    /// vertical sides. Negative margins are treated as zero.
    #[must_use]
    pub fn expanded(&self, dx: FixedPoint, dy: FixedPoint) -> Self {
        let delta = Vector::new(dx.max(FixedPoint::ZERO), dy.max(FixedPoint::ZERO));
        Self {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    /// Returns the box moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vector) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Builds the minimal box that contains all `points`, or `None` when the
    /// slice is empty.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        Some(Self { min, max })
    }
}
