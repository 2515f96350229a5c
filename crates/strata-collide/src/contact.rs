// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Contact point estimation between two non-overlapping convex polygons.
//!
//! The reported point is an approximation: the midpoint between the closest
//! features of the two polygons, averaged over every exact tie.

use strata_geom::PlacedPolygon;
use strata_math::{FixedPoint, LineSegment2D, Point, FRAC_BITS};

/// Foot of the perpendicular from `point` onto `line`.
///
/// `None` when the foot falls outside the segment, when the segment has no
/// length, or when the parameter cannot be represented.
pub fn closest_point(line: &LineSegment2D, point: Point) -> Option<Point> {
    let len2 = line.length_squared_wide()?;
    if len2 == 0 {
        return None;
    }
    let dir = line.direction();
    let num = (point - line.start).dot_wide(dir)?;
    if num < 0 || num > len2 {
        return None;
    }
    // u = num / len2 in [0, 1], carried at Q43.20.
    let u = num.checked_mul(1_i128 << FRAC_BITS)? / len2;
    let u = FixedPoint::from_raw(i64::try_from(u).ok()?);
    Some(line.start + dir * u)
}

/// Running average of tied candidate points, kept as wide raw sums.
#[derive(Default)]
struct TieAverage {
    best: Option<i128>,
    sum_x: i128,
    sum_y: i128,
    count: i128,
}

impl TieAverage {
    fn offer(&mut self, distance: i128, point: Point) {
        match self.best {
            Some(best) if distance > best => return,
            Some(best) if distance == best => {}
            _ => {
                self.best = Some(distance);
                self.sum_x = 0;
                self.sum_y = 0;
                self.count = 0;
            }
        }
        self.sum_x += i128::from(point.x.raw());
        self.sum_y += i128::from(point.y.raw());
        self.count += 1;
    }

    fn average(&self) -> Option<Point> {
        if self.count == 0 {
            return None;
        }
        let x = i64::try_from(self.sum_x / self.count).ok()?;
        let y = i64::try_from(self.sum_y / self.count).ok()?;
        Some(Point::new(FixedPoint::from_raw(x), FixedPoint::from_raw(y)))
    }
}

fn offer_vertex_edge(ties: &mut TieAverage, vertices: &PlacedPolygon<'_>, edges: &PlacedPolygon<'_>) {
    for vertex in vertices.vertices() {
        for edge in edges.edges() {
            let Some(foot) = closest_point(&edge, vertex) else {
                continue;
            };
            if let Some(d2) = vertex.distance_squared_wide(foot) {
                ties.offer(d2, vertex.midpoint(foot));
            }
        }
    }
}

/// Estimated contact point of two polygons that are close but not
/// interpenetrating.
///
/// Looks for the closest vertex-to-edge pair in both directions; when no
/// vertex projects onto any edge of the other polygon the closest
/// vertex-to-vertex pair is used instead. All pairs at exactly the minimal
/// distance are averaged, and the result is the midpoint between the two
/// features.
pub fn collision_point_stationary(p1: &PlacedPolygon<'_>, p2: &PlacedPolygon<'_>) -> Point {
    let mut ties = TieAverage::default();
    offer_vertex_edge(&mut ties, p1, p2);
    offer_vertex_edge(&mut ties, p2, p1);
    if let Some(point) = ties.average() {
        return point;
    }

    let mut ties = TieAverage::default();
    for a in p1.vertices() {
        for b in p2.vertices() {
            if let Some(d2) = a.distance_squared_wide(b) {
                ties.offer(d2, a.midpoint(b));
            }
        }
    }
    // Only reachable when every distance overflowed.
    ties.average()
        .unwrap_or_else(|| p1.centroid().midpoint(p2.centroid()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_geom::ConvexPolygonPattern;
    use strata_math::Vector;

    fn unit_square() -> ConvexPolygonPattern {
        ConvexPolygonPattern::new(vec![
            Point::from_ints(0, 0),
            Point::from_ints(0, 1),
            Point::from_ints(1, 1),
            Point::from_ints(1, 0),
        ])
        .expect("square")
    }

    fn fixed(num: i64, den: i64) -> FixedPoint {
        FixedPoint::from_ratio(num, den).expect("nonzero den")
    }

    #[test]
    fn foot_inside_and_outside_the_segment() {
        let line = LineSegment2D::new(Point::from_ints(0, 0), Point::from_ints(4, 0));
        let foot = closest_point(&line, Point::from_ints(1, 3)).expect("inside");
        assert!(foot.exact_eq(&Point::from_ints(1, 0)));
        let end = closest_point(&line, Point::from_ints(4, -2)).expect("endpoint counts");
        assert!(end.exact_eq(&Point::from_ints(4, 0)));
        assert!(closest_point(&line, Point::from_ints(5, 1)).is_none());
        let dot = LineSegment2D::new(Point::from_ints(2, 2), Point::from_ints(2, 2));
        assert!(closest_point(&dot, Point::ORIGIN).is_none());
    }

    #[test]
    fn face_to_face_ties_average_to_the_middle_of_the_gap() {
        let square = unit_square();
        let a = PlacedPolygon::new(&square, Vector::ZERO);
        let b = PlacedPolygon::new(&square, Vector::new(fixed(5, 4), FixedPoint::ZERO));
        let contact = collision_point_stationary(&a, &b);
        assert!(contact.exact_eq(&Point::new(fixed(9, 8), FixedPoint::HALF)));
    }

    #[test]
    fn diagonal_corners_fall_back_to_vertex_pairs() {
        let square = unit_square();
        let a = PlacedPolygon::new(&square, Vector::ZERO);
        let b = PlacedPolygon::new(&square, Vector::from_ints(2, 2));
        let contact = collision_point_stationary(&a, &b);
        assert!(contact.exact_eq(&Point::new(fixed(3, 2), fixed(3, 2))));
    }
}
