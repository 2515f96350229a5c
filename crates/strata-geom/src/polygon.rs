// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Authored, possibly concave polygons.

use strata_math::{FixedPoint, Point, Vector};
use tracing::debug;

use crate::area::{signed_area, winding_of, Winding};
use crate::convex::{validate_ring, ConvexPolygonPattern};
use crate::decompose::decompose_clockwise;
use crate::error::GeomError;

/// Simple polygon as authored from art, tagged with its winding.
///
/// Never collided against directly: call
/// [`PolygonPattern::decompose_into_convex_polygons`] at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonPattern {
    vertices: Vec<Point>,
    winding: Winding,
    original_height: FixedPoint,
}

impl PolygonPattern {
    /// Validates an authored ring given in the Y-up pattern frame.
    ///
    /// # Errors
    /// [`GeomError::TooFewVertices`], [`GeomError::DuplicateVertex`],
    /// [`GeomError::NonPositiveHeight`] or [`GeomError::Degenerate`] (zero
    /// signed area).
    pub fn new(vertices: Vec<Point>, original_height: FixedPoint) -> Result<Self, GeomError> {
        validate_ring(&vertices)?;
        if original_height <= FixedPoint::ZERO {
            return Err(GeomError::NonPositiveHeight);
        }
        let winding = winding_of(&vertices).ok_or(GeomError::Degenerate)?;
        Ok(Self {
            vertices,
            winding,
            original_height,
        })
    }

    /// Builds a pattern from Y-down art coordinates, flipping each vertex to
    /// `y' = original_height - y`.
    ///
    /// # Errors
    /// Same as [`PolygonPattern::new`].
    pub fn from_screen_vertices(
        vertices: &[Point],
        original_height: FixedPoint,
    ) -> Result<Self, GeomError> {
        let flipped = vertices
            .iter()
            .map(|p| Point::new(p.x, original_height - p.y))
            .collect();
        Self::new(flipped, original_height)
    }

    /// Translation that puts the pattern's art at `screen_origin` (the art's
    /// top-left pixel, Y-down) inside a Y-up room of height `room_height`.
    pub fn placement(&self, screen_origin: Point, room_height: FixedPoint) -> Vector {
        Vector::new(
            screen_origin.x,
            room_height - screen_origin.y - self.original_height,
        )
    }

    /// Vertices as authored.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Winding derived from the signed area.
    pub fn winding(&self) -> Winding {
        self.winding
    }

    /// Height of the source art.
    pub fn original_height(&self) -> FixedPoint {
        self.original_height
    }

    /// Signed area (positive for counter-clockwise rings).
    pub fn signed_area(&self) -> Option<FixedPoint> {
        signed_area(&self.vertices)
    }

    /// Splits the polygon into convex patterns covering the same area.
    ///
    /// Counter-clockwise rings are reversed first, so both windings of one
    /// outline yield the same pieces.
    ///
    /// # Errors
    /// [`GeomError::Undecomposable`] when a concave ring has no usable
    /// diagonal (self-intersecting input), or any construction error of a
    /// resulting piece.
    pub fn decompose_into_convex_polygons(&self) -> Result<Vec<ConvexPolygonPattern>, GeomError> {
        if self.winding == Winding::CounterClockwise {
            let mut reversed = self.clone();
            reversed.vertices.reverse();
            reversed.winding = Winding::Clockwise;
            return reversed.decompose_into_convex_polygons();
        }

        let rings = decompose_clockwise(&self.vertices)?;
        debug!(
            vertices = self.vertices.len(),
            pieces = rings.len(),
            "decomposed polygon"
        );
        rings.into_iter().map(ConvexPolygonPattern::new).collect()
    }
}
