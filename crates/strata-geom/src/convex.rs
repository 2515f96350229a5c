// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Convex polygon patterns and their placed instances.
//!
//! A [`ConvexPolygonPattern`] is authored once and never changes. Placed
//! instances are [`ConvexPolygon`] values: a [`PatternId`] into a
//! [`PatternTable`] plus a translation. Resolving an instance against its
//! table yields a [`PlacedPolygon`] view that applies the translation lazily,
//! so a tick never copies vertex data.

use strata_math::{FixedPoint, LineSegment1D, LineSegment2D, Point, Vector};
use tracing::trace;

use crate::aabb::BoundingBox;
use crate::area::signed_area_doubled_wide;
use crate::error::GeomError;

/// Immutable clockwise convex vertex ring with cached derived data.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolygonPattern {
    vertices: Vec<Point>,
    bounds: BoundingBox,
    centroid: Point,
    normals: Vec<Vector>,
}

impl ConvexPolygonPattern {
    /// Validates `vertices` and caches bounds, centroid and unique normals.
    ///
    /// Counter-clockwise input is reversed so the stored ring is clockwise.
    ///
    /// # Errors
    /// [`GeomError::TooFewVertices`] for fewer than three vertices,
    /// [`GeomError::DuplicateVertex`] when two vertices coincide and
    /// [`GeomError::Degenerate`] when the ring encloses no area.
    pub fn new(mut vertices: Vec<Point>) -> Result<Self, GeomError> {
        validate_ring(&vertices)?;
        let area = signed_area_doubled_wide(&vertices).ok_or(GeomError::Degenerate)?;
        if area == 0 {
            return Err(GeomError::Degenerate);
        }
        if area > 0 {
            vertices.reverse();
        }

        let bounds = BoundingBox::from_points(&vertices).ok_or(GeomError::TooFewVertices {
            count: vertices.len(),
        })?;
        let centroid = vertex_average(&vertices);
        let normals = unique_normals(&vertices);
        if normals.len() < 2 {
            return Err(GeomError::Degenerate);
        }
        Ok(Self {
            vertices,
            bounds,
            centroid,
            normals,
        })
    }

    /// Clockwise vertices in the pattern's local frame.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Local bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    /// Average of the vertices.
    pub fn centroid(&self) -> Point {
        self.centroid
    }

    /// Outward edge normals with parallel duplicates removed.
    pub fn normals(&self) -> &[Vector] {
        &self.normals
    }

    /// Edges in ring order, each from vertex `i` to vertex `i + 1`.
    pub fn edges(&self) -> impl Iterator<Item = LineSegment2D> + '_ {
        ring_edges(&self.vertices)
    }
}

/// Shared vertex checks: at least three vertices and no two alike.
pub(crate) fn validate_ring(vertices: &[Point]) -> Result<(), GeomError> {
    if vertices.len() < 3 {
        return Err(GeomError::TooFewVertices {
            count: vertices.len(),
        });
    }
    for (first, a) in vertices.iter().enumerate() {
        if let Some(offset) = vertices[first + 1..].iter().position(|b| a == b) {
            return Err(GeomError::DuplicateVertex {
                first,
                second: first + 1 + offset,
            });
        }
    }
    Ok(())
}

pub(crate) fn ring_edges(vertices: &[Point]) -> impl Iterator<Item = LineSegment2D> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| LineSegment2D::new(vertices[i], vertices[(i + 1) % n]))
}

fn vertex_average(vertices: &[Point]) -> Point {
    let n = vertices.len().max(1) as i128;
    let sx: i128 = vertices.iter().map(|p| i128::from(p.x.raw())).sum();
    let sy: i128 = vertices.iter().map(|p| i128::from(p.y.raw())).sum();
    // The mean of i64 values always fits back into i64.
    Point::new(
        FixedPoint::from_raw((sx / n) as i64),
        FixedPoint::from_raw((sy / n) as i64),
    )
}

fn unique_normals(vertices: &[Point]) -> Vec<Vector> {
    let mut normals: Vec<Vector> = Vec::with_capacity(vertices.len());
    for (index, edge) in ring_edges(vertices).enumerate() {
        let Some(normal) = edge.normal() else {
            trace!(index, "skipping edge without a usable normal");
            continue;
        };
        if normals.iter().any(|kept| kept.is_parallel(normal)) {
            continue;
        }
        normals.push(normal);
    }
    normals
}

/// Index of a pattern inside a [`PatternTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternId(u32);

impl PatternId {
    /// Position of the pattern in its table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owner of every convex pattern loaded for a room.
///
/// Built once at load time and then shared read-only (typically through an
/// `Arc`) by every level job.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: Vec<ConvexPolygonPattern>,
}

impl PatternTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `pattern` and returns its id.
    ///
    /// # Errors
    /// [`GeomError::TableFull`] once `u32::MAX` patterns are stored.
    pub fn insert(&mut self, pattern: ConvexPolygonPattern) -> Result<PatternId, GeomError> {
        let id = u32::try_from(self.patterns.len()).map_err(|_| GeomError::TableFull)?;
        self.patterns.push(pattern);
        Ok(PatternId(id))
    }

    /// Stores every pattern in order and returns their ids.
    ///
    /// # Errors
    /// See [`PatternTable::insert`].
    pub fn insert_all(
        &mut self,
        patterns: impl IntoIterator<Item = ConvexPolygonPattern>,
    ) -> Result<Vec<PatternId>, GeomError> {
        patterns.into_iter().map(|p| self.insert(p)).collect()
    }

    /// Looks a pattern up.
    pub fn get(&self, id: PatternId) -> Option<&ConvexPolygonPattern> {
        self.patterns.get(id.index())
    }

    /// Number of stored patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// `true` when no pattern is stored.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Resolves a placed instance into a view over its pattern.
    ///
    /// # Errors
    /// [`GeomError::UnknownPattern`] if the id is not in this table.
    pub fn resolve(&self, polygon: ConvexPolygon) -> Result<PlacedPolygon<'_>, GeomError> {
        self.get(polygon.pattern)
            .map(|pattern| PlacedPolygon::new(pattern, polygon.translation))
            .ok_or(GeomError::UnknownPattern(polygon.pattern))
    }
}

/// A pattern placed in the world: pattern handle plus translation.
///
/// Two instances are equal iff they reference the same pattern with the same
/// translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConvexPolygon {
    pattern: PatternId,
    translation: Vector,
}

impl ConvexPolygon {
    /// Places `pattern` at `translation`.
    pub const fn new(pattern: PatternId, translation: Vector) -> Self {
        Self {
            pattern,
            translation,
        }
    }

    /// The referenced pattern.
    pub fn pattern(&self) -> PatternId {
        self.pattern
    }

    /// Offset applied to every pattern vertex.
    pub fn translation(&self) -> Vector {
        self.translation
    }

    /// Same pattern, moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vector) -> Self {
        Self::new(self.pattern, self.translation + offset)
    }
}

/// Borrowed view of a pattern at a translation.
#[derive(Debug, Clone, Copy)]
pub struct PlacedPolygon<'a> {
    pattern: &'a ConvexPolygonPattern,
    translation: Vector,
}

impl<'a> PlacedPolygon<'a> {
    /// Views `pattern` moved by `translation`.
    pub fn new(pattern: &'a ConvexPolygonPattern, translation: Vector) -> Self {
        Self {
            pattern,
            translation,
        }
    }

    /// Underlying pattern.
    pub fn pattern(&self) -> &'a ConvexPolygonPattern {
        self.pattern
    }

    /// Current translation.
    pub fn translation(&self) -> Vector {
        self.translation
    }

    /// The same view moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vector) -> Self {
        Self::new(self.pattern, self.translation + offset)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.pattern.vertices.len()
    }

    /// Translated vertex `index`.
    ///
    /// # Panics
    /// Panics if `index >= vertex_count()`.
    pub fn vertex(&self, index: usize) -> Point {
        self.pattern.vertices[index] + self.translation
    }

    /// Translated vertices in clockwise order.
    pub fn vertices(&self) -> impl Iterator<Item = Point> + 'a {
        let offset = self.translation;
        self.pattern.vertices.iter().map(move |&p| p + offset)
    }

    /// Translated edges in ring order.
    pub fn edges(&self) -> impl Iterator<Item = LineSegment2D> + 'a {
        let offset = self.translation;
        self.pattern
            .edges()
            .map(move |e| LineSegment2D::new(e.start + offset, e.end + offset))
    }

    /// Translated bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        self.pattern.bounds.translated(self.translation)
    }

    /// Translated centroid.
    pub fn centroid(&self) -> Point {
        self.pattern.centroid + self.translation
    }

    /// Unique outward normals (translation invariant).
    pub fn normals(&self) -> &'a [Vector] {
        &self.pattern.normals
    }

    /// Interval covered by the polygon on `axis`, or `None` if a projection
    /// overflows.
    pub fn project(&self, axis: Vector) -> Option<LineSegment1D> {
        let mut lo = FixedPoint::MAX;
        let mut hi = FixedPoint::MIN;
        for vertex in self.vertices() {
            let d = vertex.checked_project_onto(axis)?;
            lo = lo.min(d);
            hi = hi.max(d);
        }
        Some(LineSegment1D::new(lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: i64) -> Vec<Point> {
        vec![
            Point::from_ints(0, 0),
            Point::from_ints(0, size),
            Point::from_ints(size, size),
            Point::from_ints(size, 0),
        ]
    }

    #[test]
    fn rejects_bad_rings() {
        assert_eq!(
            ConvexPolygonPattern::new(vec![Point::ORIGIN, Point::from_ints(1, 0)]),
            Err(GeomError::TooFewVertices { count: 2 })
        );
        let dup = vec![
            Point::from_ints(0, 0),
            Point::from_ints(0, 1),
            Point::from_ints(0, 0),
        ];
        assert_eq!(
            ConvexPolygonPattern::new(dup),
            Err(GeomError::DuplicateVertex { first: 0, second: 2 })
        );
        let line = vec![
            Point::from_ints(0, 0),
            Point::from_ints(1, 1),
            Point::from_ints(2, 2),
        ];
        assert_eq!(ConvexPolygonPattern::new(line), Err(GeomError::Degenerate));
    }

    #[test]
    fn counter_clockwise_input_is_stored_clockwise() {
        let mut ccw = square(2);
        ccw.reverse();
        let pattern = ConvexPolygonPattern::new(ccw).expect("valid square");
        assert!(signed_area_doubled_wide(pattern.vertices()).is_some_and(|a| a < 0));
    }

    #[test]
    fn square_keeps_two_unique_normals() {
        let pattern = ConvexPolygonPattern::new(square(1)).expect("valid square");
        assert_eq!(pattern.normals().len(), 2);
        assert_eq!(pattern.normals()[0], Vector::from_ints(-1, 0));
        assert_eq!(pattern.normals()[1], Vector::from_ints(0, 1));
        assert!(pattern.centroid().exact_eq(&Point::new(FixedPoint::HALF, FixedPoint::HALF)));
    }

    #[test]
    fn placed_view_translates_lazily() {
        let mut table = PatternTable::new();
        let id = table
            .insert(ConvexPolygonPattern::new(square(1)).expect("valid square"))
            .expect("room in table");
        let instance = ConvexPolygon::new(id, Vector::from_ints(5, -2));
        let placed = table.resolve(instance).expect("known id");
        assert!(placed.vertex(0).exact_eq(&Point::from_ints(5, -2)));
        assert!(placed.bounding_box().max().exact_eq(&Point::from_ints(6, -1)));
        let span = placed.project(Vector::from_ints(1, 0)).expect("no overflow");
        assert_eq!(span, LineSegment1D::new(FixedPoint::from_int(5), FixedPoint::from_int(6)));
        assert_eq!(instance, ConvexPolygon::new(id, Vector::from_ints(5, -2)));
        assert_ne!(instance, instance.translated(Vector::from_ints(0, 1)));
    }

    #[test]
    fn unknown_pattern_is_reported() {
        let table = PatternTable::new();
        let stray = ConvexPolygon::new(PatternId(3), Vector::ZERO);
        assert_eq!(
            table.resolve(stray).map(|p| p.vertex_count()),
            Err(GeomError::UnknownPattern(PatternId(3)))
        );
    }
}
