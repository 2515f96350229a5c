// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
mod common;

use common::{at, fixed, rect, table};
use proptest::prelude::*;
use strata_collide::{minimum_translation_vector, CollideError, CollisionDetector, DetectorConfig};
use strata_geom::{PatternTable, PlacedPolygon};
use strata_math::{FixedPoint, LineSegment1D, Point, Vector};

fn detector() -> CollisionDetector {
    CollisionDetector::new(DetectorConfig::default())
}

#[test]
fn square_approaching_square_stops_one_step_short() {
    let (patterns, square, _) = table();
    let polygons = [
        at(square, FixedPoint::ZERO, FixedPoint::ZERO),
        at(square, FixedPoint::from_int(5), FixedPoint::ZERO),
    ];
    let velocities = [Vector::ZERO, Vector::from_ints(-1, 0)];
    let mut detector = detector();
    let list = detector
        .find_collisions(&patterns, &polygons, &velocities, 2, fixed(1, 4), false)
        .expect("within capacity");
    assert_eq!(list.len(), 1);
    let hit = list[0];
    assert_eq!((hit.first, hit.second), (0, 1));
    // Raw impact at t = 4 lands on a step boundary, so one more step is taken off.
    assert_eq!(hit.at_time, fixed(15, 4));
    assert!(hit.point.exact_eq(&Point::new(fixed(9, 8), FixedPoint::HALF)));
}

#[test]
fn list_drop_empties_the_buffer_for_the_next_pass() {
    let (patterns, square, _) = table();
    let polygons = [
        at(square, FixedPoint::ZERO, FixedPoint::ZERO),
        at(square, FixedPoint::from_int(2), FixedPoint::ZERO),
    ];
    let moving = [Vector::ZERO, Vector::from_ints(-2, 0)];
    let resting = [Vector::ZERO, Vector::ZERO];
    let mut detector = detector();
    {
        let list = detector
            .find_collisions(&patterns, &polygons, &moving, 2, fixed(1, 4), true)
            .expect("within capacity");
        assert_eq!(list.len(), 1);
        assert_eq!(list.earliest().map(|c| c.at_time), Some(fixed(1, 4)));
    }
    let list = detector
        .find_collisions(&patterns, &polygons, &resting, 2, fixed(1, 4), true)
        .expect("within capacity");
    assert!(list.is_empty());
}

#[test]
fn head_on_time_is_distance_over_closing_speed() {
    let square = rect(1, 1);
    let mut detector = detector();
    let a = PlacedPolygon::new(&square, Vector::ZERO);

    let b = PlacedPolygon::new(&square, Vector::from_ints(3, 0));
    let t = detector.collision_time(&a, Vector::from_ints(1, 0), &b, Vector::from_ints(-1, 0));
    assert_eq!(t, Some(FixedPoint::ONE));

    // d = 2, v = 3: t = 2/3 up to one raw unit of rounding.
    let t = detector
        .collision_time(&a, Vector::ZERO, &b, Vector::from_ints(-3, 0))
        .expect("converging");
    assert!((t - fixed(2, 3)).abs() <= FixedPoint::EPSILON);

    // Vertical approach.
    let c = PlacedPolygon::new(&square, Vector::from_ints(0, 5));
    let t = detector.collision_time(&a, Vector::ZERO, &c, Vector::from_ints(0, -2));
    assert_eq!(t, Some(FixedPoint::from_int(2)));
}

#[test]
fn touching_or_diverging_pairs_report_nothing() {
    let square = rect(1, 1);
    let mut detector = detector();
    let a = PlacedPolygon::new(&square, Vector::ZERO);
    let touching = PlacedPolygon::new(&square, Vector::from_ints(1, 0));
    assert_eq!(detector.collision_time(&a, Vector::ZERO, &touching, Vector::from_ints(-1, 0)), None);

    let apart = PlacedPolygon::new(&square, Vector::from_ints(3, 0));
    assert_eq!(detector.collision_time(&a, Vector::ZERO, &apart, Vector::from_ints(1, 0)), None);
    // Passes above without ever overlapping on y.
    let above = PlacedPolygon::new(&square, Vector::from_ints(3, 2));
    assert_eq!(detector.collision_time(&a, Vector::ZERO, &above, Vector::from_ints(-1, 0)), None);
    assert_eq!(detector.collision_time(&a, Vector::ZERO, &apart, Vector::ZERO), None);
}

#[test]
fn diagonal_sweep_needs_every_axis_to_agree() {
    let square = rect(1, 1);
    let mut detector = detector();
    let a = PlacedPolygon::new(&square, Vector::ZERO);
    // x gap 2 closes at t = 1, y gap 4 closes at t = 2: impact at t = 2.
    let b = PlacedPolygon::new(&square, Vector::from_ints(3, 5));
    let t = detector.collision_time(&a, Vector::ZERO, &b, Vector::from_ints(-2, -2));
    assert_eq!(t, Some(FixedPoint::from_int(2)));
}

#[test]
fn limit_time_drops_impacts_beyond_the_frame() {
    let (patterns, square, _) = table();
    let polygons = [
        at(square, FixedPoint::ZERO, FixedPoint::ZERO),
        at(square, FixedPoint::from_int(5), FixedPoint::ZERO),
    ];
    let velocities = [Vector::ZERO, Vector::from_ints(-1, 0)];
    let mut detector = detector();
    let list = detector
        .find_collisions(&patterns, &polygons, &velocities, 2, fixed(1, 4), true)
        .expect("within capacity");
    assert!(list.is_empty());
}

#[test]
fn far_from_origin_gives_the_same_answer() {
    let (patterns, square, _) = table();
    let far = FixedPoint::from_int(1 << 30);
    let near = [
        at(square, FixedPoint::ZERO, FixedPoint::ZERO),
        at(square, FixedPoint::from_int(2), FixedPoint::ZERO),
    ];
    let shifted = [
        at(square, far, far),
        at(square, far + FixedPoint::from_int(2), far),
    ];
    let velocities = [Vector::ZERO, Vector::from_ints(-2, 0)];
    let mut detector = detector();
    let a = detector
        .find_collisions(&patterns, &near, &velocities, 2, fixed(1, 8), true)
        .expect("within capacity")[0];
    let b = detector
        .find_collisions(&patterns, &shifted, &velocities, 2, fixed(1, 8), true)
        .expect("within capacity")[0];
    assert_eq!(a.at_time, b.at_time);
    assert!(b.point.exact_eq(&(a.point + Vector::new(far, far))));
}

#[test]
fn buffer_exhaustion_is_an_error() {
    let (patterns, square, _) = table();
    let polygons = [
        at(square, FixedPoint::ZERO, FixedPoint::ZERO),
        at(square, FixedPoint::from_int(2), FixedPoint::ZERO),
        at(square, FixedPoint::from_int(-2), FixedPoint::ZERO),
    ];
    let velocities = [Vector::ZERO, Vector::from_ints(-2, 0), Vector::from_ints(2, 0)];
    let mut detector = CollisionDetector::new(DetectorConfig {
        max_collisions: 1,
        ..DetectorConfig::default()
    });
    let err = detector
        .find_collisions(&patterns, &polygons, &velocities, 3, fixed(1, 4), true)
        .expect_err("two impacts, one slot");
    assert!(matches!(err, CollideError::CollisionCapacity { capacity: 1 }));
}

#[test]
fn count_past_the_inputs_is_rejected() {
    let (patterns, square, _) = table();
    let polygons = [at(square, FixedPoint::ZERO, FixedPoint::ZERO)];
    let mut detector = detector();
    let err = detector
        .find_collisions(&patterns, &polygons, &[Vector::ZERO], 2, fixed(1, 4), true)
        .expect_err("count too large");
    assert!(matches!(err, CollideError::CountOutOfRange { count: 2, .. }));

    let unknown = PatternTable::new();
    let lone = detector
        .find_collisions(&unknown, &polygons, &[Vector::from_ints(1, 0)], 1, fixed(1, 4), true)
        .map(|list| list.len());
    // A single polygon forms no pair, so the table is never consulted.
    assert!(matches!(lone, Ok(0)));

    let pair = [polygons[0], polygons[0].translated(Vector::from_ints(2, 0))];
    let err = detector
        .find_collisions(&unknown, &pair, &[Vector::ZERO, Vector::from_ints(-2, 0)], 2, fixed(1, 4), true)
        .expect_err("pattern not in table");
    assert!(matches!(err, CollideError::Geom(_)));
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

    #[test]
    fn clipped_times_are_step_multiples_strictly_below_raw(
        gap_sixteenths in 1_i64..16,
        speed in 1_i64..=3,
        step_den in prop::sample::select(vec![2_i64, 4, 8, 16]),
    ) {
        let (patterns, square, _) = table();
        let start = FixedPoint::ONE + fixed(gap_sixteenths, 16);
        let polygons = [
            at(square, FixedPoint::ZERO, FixedPoint::ZERO),
            at(square, start, FixedPoint::ZERO),
        ];
        let velocities = [Vector::ZERO, Vector::from_ints(-speed, 0)];
        let step = fixed(1, step_den);
        let mut detector = detector();
        let raw = {
            let square = rect(1, 1);
            let a = PlacedPolygon::new(&square, Vector::ZERO);
            let b = PlacedPolygon::new(&square, Vector::new(start, FixedPoint::ZERO));
            detector.collision_time(&a, Vector::ZERO, &b, velocities[1]).expect("converging")
        };
        let list = detector
            .find_collisions(&patterns, &polygons, &velocities, 2, step, true)
            .expect("within capacity");
        prop_assert_eq!(list.len(), 1);
        let at_time = list[0].at_time;
        prop_assert!(at_time < raw);
        prop_assert!(raw - at_time <= step);
        prop_assert_eq!(at_time.raw() % step.raw(), 0);
        prop_assert!(at_time >= FixedPoint::ZERO);
    }

    #[test]
    fn mtv_separates_overlapping_boxes(
        (w1, h1, w2, h2) in (1_i64..6, 1_i64..6, 1_i64..6, 1_i64..6),
        (x, y) in (-6_i64..6, -6_i64..6),
    ) {
        let (s_pat, m_pat) = (rect(w1, h1), rect(w2, h2));
        let stationary = PlacedPolygon::new(&s_pat, Vector::ZERO);
        let moving = PlacedPolygon::new(&m_pat, Vector::from_ints(x, y));
        let x_overlap = |m: &PlacedPolygon<'_>| {
            LineSegment1D::new(FixedPoint::ZERO, FixedPoint::from_int(w1))
                .overlap_length(&LineSegment1D::new(m.bounding_box().min().x, m.bounding_box().max().x))
        };
        let y_overlap = |m: &PlacedPolygon<'_>| {
            LineSegment1D::new(FixedPoint::ZERO, FixedPoint::from_int(h1))
                .overlap_length(&LineSegment1D::new(m.bounding_box().min().y, m.bounding_box().max().y))
        };
        match minimum_translation_vector(&stationary, &moving) {
            None => {
                let separated_x = x > w1 || x + w2 < 0;
                let separated_y = y > h1 || y + h2 < 0;
                prop_assert!(separated_x || separated_y);
            }
            Some(push) => {
                let moved = moving.translated(push);
                prop_assert!(x_overlap(&moved).is_zero() || y_overlap(&moved).is_zero());
                prop_assert!(minimum_translation_vector(&stationary, &moved.translated(push)).is_none());
            }
        }
    }
}
