// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signed area and winding of vertex rings.

use strata_math::{FixedPoint, Point};

/// Vertex order of a polygon ring in the Y-up frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    /// Clockwise (negative signed area).
    Clockwise,
    /// Counter-clockwise (positive signed area).
    CounterClockwise,
}

/// Twice the signed (shoelace) area of `points`, at the doubled `2^40` scale.
///
/// Positive for counter-clockwise rings. `None` if the accumulation
/// overflows `i128`.
pub fn signed_area_doubled_wide(points: &[Point]) -> Option<i128> {
    let n = points.len();
    let mut sum: i128 = 0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % n];
        sum = sum.checked_add(a.to_vector().cross_wide(b.to_vector())?)?;
    }
    Some(sum)
}

/// Signed area of `points` (positive for counter-clockwise rings).
pub fn signed_area(points: &[Point]) -> Option<FixedPoint> {
    FixedPoint::from_wide(signed_area_doubled_wide(points)? >> 1)
}

/// Winding of a ring, or `None` when it encloses no area.
pub fn winding_of(points: &[Point]) -> Option<Winding> {
    match signed_area_doubled_wide(points)? {
        0 => None,
        a if a > 0 => Some(Winding::CounterClockwise),
        _ => Some(Winding::Clockwise),
    }
}
