// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Line segments on a projection axis (1D) and in the plane (2D).

use crate::error::MathError;
use crate::fixed::{div_round, FixedPoint};
use crate::vector::{Point, Vector};

/// Attempts made by [`LineSegment2D::normal`] to rescale a segment that is
/// too short (or too long) to normalize.
pub const NORMAL_RETRY_LIMIT: usize = 8;

/// Closed interval `[start, stop]` on a projection axis.
///
/// Invariant: `start <= stop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineSegment1D {
    start: FixedPoint,
    stop: FixedPoint,
}

impl LineSegment1D {
    /// Builds the interval spanned by `a` and `b` (in either order).
    #[must_use]
    pub fn new(a: FixedPoint, b: FixedPoint) -> Self {
        Self {
            start: a.min(b),
            stop: a.max(b),
        }
    }

    /// Lower bound.
    pub fn start(&self) -> FixedPoint {
        self.start
    }

    /// Upper bound.
    pub fn stop(&self) -> FixedPoint {
        self.stop
    }

    /// `stop - start`.
    pub fn length(&self) -> FixedPoint {
        self.stop - self.start
    }

    /// Returns the interval shifted by `offset`.
    pub fn translated(&self, offset: FixedPoint) -> Self {
        Self {
            start: self.start + offset,
            stop: self.stop + offset,
        }
    }

    /// Inclusive overlap test, widened by `tolerance` on both ends.
    ///
    /// The tolerance snaps intervals that end up a few raw units apart after
    /// time-of-impact rounding, which would otherwise read as a miss.
    pub fn overlaps(&self, other: &Self, tolerance: FixedPoint) -> bool {
        self.start <= other.stop + tolerance && other.start <= self.stop + tolerance
    }

    /// Exact length of the shared part of the two intervals.
    pub fn overlap_length(&self, other: &Self) -> FixedPoint {
        if self.stop < other.start {
            // disjoint, self on the left
            FixedPoint::ZERO
        } else if other.stop < self.start {
            // disjoint, self on the right
            FixedPoint::ZERO
        } else if self.stop == other.start {
            // touching at self's upper end
            FixedPoint::ZERO
        } else if other.stop == self.start {
            // touching at self's lower end
            FixedPoint::ZERO
        } else if self.start == other.start && self.stop == other.stop {
            self.length()
        } else if self.start >= other.start && self.stop <= other.stop {
            // self nested in other
            self.length()
        } else if other.start >= self.start && other.stop <= self.stop {
            // other nested in self
            other.length()
        } else if self.start < other.start {
            // partial, self sticks out on the left
            self.stop - other.start
        } else {
            // partial, self sticks out on the right
            other.stop - self.start
        }
    }

    /// Distance one interval has to move to clear the other.
    ///
    /// Equals [`Self::overlap_length`] for partial overlaps. When one interval
    /// is nested inside the other, the shorter way out is added.
    pub fn separation_depth(&self, other: &Self) -> FixedPoint {
        let overlap = self.overlap_length(other);
        if overlap.is_zero() {
            return overlap;
        }
        let nested_in_other = self.start >= other.start && self.stop <= other.stop;
        let other_nested = other.start >= self.start && other.stop <= self.stop;
        if nested_in_other {
            overlap + (self.start - other.start).min(other.stop - self.stop)
        } else if other_nested {
            overlap + (other.start - self.start).min(self.stop - other.stop)
        } else {
            overlap
        }
    }
}

/// Result of intersecting two 2D segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegmentIntersection {
    /// The segments share no point.
    Disjoint,
    /// The segments cross or touch at a single point.
    Point(Point),
    /// The segments lie on one line and share at least one point.
    ///
    /// Also reported when the exact computation would overflow, so callers
    /// that reject intersections stay on the safe side.
    Collinear,
}

impl SegmentIntersection {
    /// Returns `true` unless the segments are disjoint.
    pub fn intersects(&self) -> bool {
        !matches!(self, Self::Disjoint)
    }
}

/// Segment between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment2D {
    /// First endpoint.
    pub start: Point,
    /// Second endpoint.
    pub end: Point,
}

impl LineSegment2D {
    /// Constructs a segment.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// `end - start`.
    pub fn direction(&self) -> Vector {
        self.end - self.start
    }

    /// Midpoint of the segment.
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Squared length at the doubled scale.
    pub fn length_squared_wide(&self) -> Option<i128> {
        self.direction().magnitude_squared_wide()
    }

    /// Outward unit normal, assuming the segment is an edge of a clockwise
    /// (Y-up) polygon.
    ///
    /// The direction is doubled while it is too short to normalize and halved
    /// while its magnitude overflows, at most [`NORMAL_RETRY_LIMIT`] times.
    /// Scaling preserves the direction, so the normal is unaffected.
    pub fn normal(&self) -> Option<Vector> {
        let mut dir = self.direction();
        if dir.is_zero() {
            return None;
        }
        for _ in 0..NORMAL_RETRY_LIMIT {
            match dir.normalize() {
                Ok(unit) => return Some(unit.normal()),
                Err(MathError::Overflow) => dir = dir.half(),
                Err(_) => dir = dir.double(),
            }
        }
        None
    }

    /// Returns `true` when `point` lies on the segment (endpoints included).
    pub fn contains_point(&self, point: Point) -> bool {
        let dir = self.direction();
        let rel = point - self.start;
        match (dir.cross_wide(rel), dir.dot_wide(rel), dir.magnitude_squared_wide()) {
            (Some(0), Some(along), Some(len_sq)) => along >= 0 && along <= len_sq,
            _ => false,
        }
    }

    /// Exact intersection of two segments (endpoints included).
    pub fn intersect(&self, other: &Self) -> SegmentIntersection {
        let r = self.direction();
        let s = other.direction();
        let qp = other.start - self.start;

        let (Some(rxs), Some(qpxr), Some(qpxs)) =
            (r.cross_wide(s), qp.cross_wide(r), qp.cross_wide(s))
        else {
            return SegmentIntersection::Collinear;
        };

        if rxs == 0 {
            if qpxr != 0 {
                // parallel, on different lines
                return SegmentIntersection::Disjoint;
            }
            return collinear_overlap(r, s, qp);
        }

        // t = qp×s / r×s on self, u = qp×r / r×s on other, both in [0, 1].
        let (t_num, u_num, den) = if rxs < 0 {
            (-qpxs, -qpxr, -rxs)
        } else {
            (qpxs, qpxr, rxs)
        };
        if t_num < 0 || t_num > den || u_num < 0 || u_num > den {
            return SegmentIntersection::Disjoint;
        }

        let offset_x = i128::from(r.x.raw()).checked_mul(t_num);
        let offset_y = i128::from(r.y.raw()).checked_mul(t_num);
        let (Some(offset_x), Some(offset_y)) = (offset_x, offset_y) else {
            return SegmentIntersection::Collinear;
        };
        let x = i128::from(self.start.x.raw()) + div_round(offset_x, den);
        let y = i128::from(self.start.y.raw()) + div_round(offset_y, den);
        match (i64::try_from(x), i64::try_from(y)) {
            (Ok(x), Ok(y)) => SegmentIntersection::Point(Point::new(
                FixedPoint::from_raw(x),
                FixedPoint::from_raw(y),
            )),
            _ => SegmentIntersection::Collinear,
        }
    }
}

fn collinear_overlap(r: Vector, s: Vector, qp: Vector) -> SegmentIntersection {
    // Project the other segment onto self's direction: self spans [0, r·r].
    let (Some(len_sq), Some(t0), Some(s_dot_r)) =
        (r.magnitude_squared_wide(), qp.dot_wide(r), s.dot_wide(r))
    else {
        return SegmentIntersection::Collinear;
    };
    if len_sq == 0 {
        // self is a single point lying on other's line
        let (Some(other_len), Some(back)) = (s.magnitude_squared_wide(), (-qp).dot_wide(s)) else {
            return SegmentIntersection::Collinear;
        };
        return if back >= 0 && back <= other_len {
            SegmentIntersection::Collinear
        } else {
            SegmentIntersection::Disjoint
        };
    }
    let Some(t1) = t0.checked_add(s_dot_r) else {
        return SegmentIntersection::Collinear;
    };
    let (lo, hi) = (t0.min(t1), t0.max(t1));
    if hi < 0 || lo > len_sq {
        SegmentIntersection::Disjoint
    } else {
        SegmentIntersection::Collinear
    }
}
