// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Convex decomposition of clockwise simple polygons.
//!
//! Large rings are first cut along axis-aligned lines through the bounding
//! box, preferring the most balanced cut. Small rings are split along
//! diagonals from reflex vertices, keeping the split with the fewest pieces.

use std::collections::BTreeMap;

use strata_math::{FixedPoint, LineSegment2D, Point};
use tracing::{debug, trace};

use crate::aabb::BoundingBox;
use crate::area::signed_area_doubled_wide;
use crate::convex::validate_ring;
use crate::error::GeomError;

/// Rings with at least this many vertices try an axis-line split first.
pub const LINE_SPLIT_THRESHOLD: usize = 9;

/// Largest number of equal divisions tried per axis.
pub const MAX_LINE_DIVISIONS: i64 = 8;

/// Bound on nested line splits before falling back to diagonals.
pub const MAX_SPLIT_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Cut along `x = c`.
    Vertical,
    /// Cut along `y = c`.
    Horizontal,
}

impl Axis {
    fn coord(self, p: Point) -> FixedPoint {
        match self {
            Self::Vertical => p.x,
            Self::Horizontal => p.y,
        }
    }

    fn other(self, p: Point) -> FixedPoint {
        match self {
            Self::Vertical => p.y,
            Self::Horizontal => p.x,
        }
    }

    fn point(self, along: FixedPoint, across: FixedPoint) -> Point {
        match self {
            Self::Vertical => Point::new(along, across),
            Self::Horizontal => Point::new(across, along),
        }
    }
}

/// Decomposes a clockwise ring into clockwise convex rings.
pub(crate) fn decompose_clockwise(ring: &[Point]) -> Result<Vec<Vec<Point>>, GeomError> {
    decompose_ring(ring.to_vec(), 0)
}

fn decompose_ring(ring: Vec<Point>, depth: usize) -> Result<Vec<Vec<Point>>, GeomError> {
    if ring.len() >= LINE_SPLIT_THRESHOLD && depth < MAX_SPLIT_DEPTH {
        if let Some((low, high)) = best_line_split(&ring) {
            let mut pieces = decompose_ring(low, depth + 1)?;
            pieces.extend(decompose_ring(high, depth + 1)?);
            return Ok(pieces);
        }
        trace!(vertices = ring.len(), "no usable line split");
    }
    DiagonalSplitter::new(&ring).decompose()
}

// ---------------------------------------------------------------------------
// Axis-line splitting
// ---------------------------------------------------------------------------

fn best_line_split(ring: &[Point]) -> Option<(Vec<Point>, Vec<Point>)> {
    let bounds = BoundingBox::from_points(ring)?;
    let mut best: Option<(usize, Vec<Point>, Vec<Point>)> = None;

    for axis in [Axis::Vertical, Axis::Horizontal] {
        let lo = axis.coord(bounds.min());
        let extent = axis.coord(bounds.max()) - lo;
        for divisions in 2..=MAX_LINE_DIVISIONS {
            for i in 1..divisions {
                let Some(step) = extent.mul_div(FixedPoint::from_int(i), FixedPoint::from_int(divisions))
                else {
                    continue;
                };
                let at = lo + step;
                let Some((low, high)) = split_along(ring, axis, at) else {
                    continue;
                };
                let imbalance = low.len().abs_diff(high.len());
                if best.as_ref().is_none_or(|(current, _, _)| imbalance < *current) {
                    trace!(?axis, divisions, i, imbalance, "line split candidate");
                    best = Some((imbalance, low, high));
                }
            }
        }
    }

    best.map(|(imbalance, low, high)| {
        debug!(
            imbalance,
            low = low.len(),
            high = high.len(),
            "splitting polygon along axis line"
        );
        (low, high)
    })
}

/// Cuts `ring` along the axis line at `at`. `None` when the cut is unusable.
fn split_along(ring: &[Point], axis: Axis, at: FixedPoint) -> Option<(Vec<Point>, Vec<Point>)> {
    let n = ring.len();
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        if axis.coord(a) == at && axis.coord(b) == at {
            // An edge lying on the cut line.
            return None;
        }
    }

    let through_vertex = ring.iter().any(|p| axis.coord(*p) == at);
    if through_vertex {
        let below = crossings(ring, axis, at - FixedPoint::EPSILON);
        let above = crossings(ring, axis, at + FixedPoint::EPSILON);
        if below != 2 || above != 2 {
            return None;
        }
    } else if crossings(ring, axis, at) != 2 {
        return None;
    }

    let low = clip(ring, axis, at, false)?;
    let high = clip(ring, axis, at, true)?;
    if is_valid_piece(&low) && is_valid_piece(&high) {
        Some((low, high))
    } else {
        None
    }
}

/// Number of edges crossing the line, counted with a half-open rule so a
/// shared vertex is counted once.
fn crossings(ring: &[Point], axis: Axis, at: FixedPoint) -> usize {
    let n = ring.len();
    (0..n)
        .filter(|&i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            (axis.coord(a) > at) != (axis.coord(b) > at)
        })
        .count()
}

/// Keeps the part of `ring` on one side of the line (points on the line are
/// kept on both sides).
fn clip(ring: &[Point], axis: Axis, at: FixedPoint, keep_high: bool) -> Option<Vec<Point>> {
    let inside = |p: Point| {
        if keep_high {
            axis.coord(p) >= at
        } else {
            axis.coord(p) <= at
        }
    };
    let strictly_outside = |p: Point| !inside(p);

    let n = ring.len();
    let mut out: Vec<Point> = Vec::with_capacity(n + 2);
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        if inside(a) {
            push_distinct(&mut out, a);
        }
        let crosses = (inside(a) && strictly_outside(b) && axis.coord(a) != at)
            || (strictly_outside(a) && inside(b) && axis.coord(b) != at);
        if crosses {
            push_distinct(&mut out, line_crossing(a, b, axis, at)?);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    Some(out)
}

fn line_crossing(a: Point, b: Point, axis: Axis, at: FixedPoint) -> Option<Point> {
    let span = axis.coord(b) - axis.coord(a);
    let rise = axis.other(b) - axis.other(a);
    let across = axis.other(a) + rise.mul_div(at - axis.coord(a), span)?;
    Some(axis.point(at, across))
}

fn push_distinct(out: &mut Vec<Point>, p: Point) {
    if out.last() != Some(&p) {
        out.push(p);
    }
}

fn is_valid_piece(ring: &[Point]) -> bool {
    validate_ring(ring).is_ok() && signed_area_doubled_wide(ring).is_some_and(|a| a < 0)
}

// ---------------------------------------------------------------------------
// Reflex-diagonal splitting
// ---------------------------------------------------------------------------

/// Fewest-pieces diagonal decomposition over index rings into `points`.
///
/// Sub-rings are memoized by their index list, so repeated sub-problems
/// reached through different diagonals are solved once.
struct DiagonalSplitter<'a> {
    points: &'a [Point],
    memo: BTreeMap<Vec<usize>, Vec<Vec<usize>>>,
}

impl<'a> DiagonalSplitter<'a> {
    fn new(points: &'a [Point]) -> Self {
        Self {
            points,
            memo: BTreeMap::new(),
        }
    }

    fn decompose(mut self) -> Result<Vec<Vec<Point>>, GeomError> {
        let ring: Vec<usize> = (0..self.points.len()).collect();
        let pieces = self.solve(&ring)?;
        Ok(pieces
            .into_iter()
            .map(|piece| piece.into_iter().map(|i| self.points[i]).collect())
            .collect())
    }

    fn solve(&mut self, ring: &[usize]) -> Result<Vec<Vec<usize>>, GeomError> {
        if let Some(hit) = self.memo.get(ring) {
            return Ok(hit.clone());
        }
        let result = self.solve_uncached(ring)?;
        self.memo.insert(ring.to_vec(), result.clone());
        Ok(result)
    }

    fn solve_uncached(&mut self, ring: &[usize]) -> Result<Vec<Vec<usize>>, GeomError> {
        let m = ring.len();
        let reflex: Vec<usize> = (0..m).filter(|&k| self.is_reflex(ring, k)).collect();
        if m <= 3 || reflex.is_empty() {
            return Ok(vec![ring.to_vec()]);
        }

        let mut best: Option<Vec<Vec<usize>>> = None;
        'search: for &k in &reflex {
            for j in 0..m {
                if j == k || j == (k + 1) % m || (j + 1) % m == k {
                    continue;
                }
                if !self.is_usable_diagonal(ring, k, j) {
                    continue;
                }
                let (first, second) = split_ring(ring, k, j);
                let mut pieces = self.solve(&first)?;
                pieces.extend(self.solve(&second)?);
                if best.as_ref().is_none_or(|b| pieces.len() < b.len()) {
                    best = Some(pieces);
                    // A concave ring never takes fewer than two pieces.
                    if best.as_ref().is_some_and(|b| b.len() == 2) {
                        break 'search;
                    }
                }
            }
        }

        best.ok_or(GeomError::Undecomposable { vertices: m })
    }

    fn at(&self, ring: &[usize], k: usize) -> Point {
        self.points[ring[k % ring.len()]]
    }

    /// Clockwise ring: a right turn is convex, a left turn (positive cross)
    /// is reflex.
    fn is_reflex(&self, ring: &[usize], k: usize) -> bool {
        let m = ring.len();
        let prev = self.at(ring, k + m - 1);
        let cur = self.at(ring, k);
        let next = self.at(ring, k + 1);
        (cur - prev).cross_wide(next - cur).is_some_and(|c| c > 0)
    }

    fn is_usable_diagonal(&self, ring: &[usize], k: usize, j: usize) -> bool {
        let m = ring.len();
        let diagonal = LineSegment2D::new(self.at(ring, k), self.at(ring, j));
        for e in 0..m {
            let e_next = (e + 1) % m;
            if e == k || e_next == k || e == j || e_next == j {
                continue;
            }
            let edge = LineSegment2D::new(self.at(ring, e), self.at(ring, e_next));
            if diagonal.intersect(&edge).intersects() {
                return false;
            }
        }
        contains_point(self.points, ring, diagonal.midpoint())
    }
}

/// The two sub-rings on either side of diagonal `k`–`j`.
fn split_ring(ring: &[usize], k: usize, j: usize) -> (Vec<usize>, Vec<usize>) {
    let m = ring.len();
    let walk = |from: usize, to: usize| {
        let mut out = Vec::with_capacity(m);
        let mut i = from;
        loop {
            out.push(ring[i]);
            if i == to {
                break;
            }
            i = (i + 1) % m;
        }
        out
    };
    (walk(k, j), walk(j, k))
}

/// Horizontal-ray parity test.
///
/// A ray through a vertex is counted once when the ring passes through the
/// ray there and zero or two times when it only touches it.
fn contains_point(points: &[Point], ring: &[usize], p: Point) -> bool {
    let m = ring.len();
    let mut inside = false;
    for e in 0..m {
        let a = points[ring[e]];
        let b = points[ring[(e + 1) % m]];
        if (a.y > p.y) == (b.y > p.y) {
            continue;
        }
        // Crossing x lies right of p iff (p.y - a.y)(b.x - a.x) vs (p.x - a.x)(b.y - a.y).
        let dy = i128::from(b.y.raw()) - i128::from(a.y.raw());
        let lhs = (i128::from(p.y.raw()) - i128::from(a.y.raw()))
            .checked_mul(i128::from(b.x.raw()) - i128::from(a.x.raw()));
        let rhs = (i128::from(p.x.raw()) - i128::from(a.x.raw())).checked_mul(dy);
        let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
            continue;
        };
        let right_of_p = if dy > 0 { lhs > rhs } else { lhs < rhs };
        if right_of_p {
            inside = !inside;
        }
    }
    inside
}
