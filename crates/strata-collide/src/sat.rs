// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Separating-axis helpers and the minimum translation vector.

use strata_geom::PlacedPolygon;
use strata_math::{FixedPoint, Vector};
use tracing::trace;

/// Unit normals of `a`, followed by those of `b` not parallel to any of
/// `a`'s. Each pattern already stores its own normals deduplicated.
pub(crate) fn unique_axes<'p>(
    a: &PlacedPolygon<'p>,
    b: &PlacedPolygon<'p>,
) -> impl Iterator<Item = Vector> + 'p {
    let first = a.normals();
    first.iter().copied().chain(
        b.normals()
            .iter()
            .copied()
            .filter(move |n| !first.iter().any(|m| m.is_parallel(*n))),
    )
}

/// Smallest displacement of `moving` that separates it from `stationary`.
///
/// `None` when some axis separates the two polygons. Touching polygons get a
/// push of one whole unit so contact does not persist. Axes whose projection
/// overflows are skipped.
pub fn minimum_translation_vector(
    stationary: &PlacedPolygon<'_>,
    moving: &PlacedPolygon<'_>,
) -> Option<Vector> {
    let mut best: Option<(FixedPoint, Vector)> = None;
    for axis in unique_axes(stationary, moving) {
        let (Some(s), Some(m)) = (stationary.project(axis), moving.project(axis)) else {
            trace!(?axis, "projection overflowed, axis skipped");
            continue;
        };
        if !s.overlaps(&m, FixedPoint::ZERO) {
            return None;
        }
        let mut depth = m.separation_depth(&s);
        if depth.is_zero() {
            depth = FixedPoint::ONE;
        }
        if best.is_none_or(|(smallest, _)| depth < smallest) {
            best = Some((depth, axis));
        }
    }
    let (depth, mut axis) = best?;
    let towards_stationary = stationary.centroid() - moving.centroid();
    if axis.dot_wide(towards_stationary).is_some_and(|d| d > 0) {
        axis = -axis;
    }
    Some(axis * depth)
}
