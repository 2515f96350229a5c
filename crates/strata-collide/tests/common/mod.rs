// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use strata_collide::{Body, CollisionWorld, Contact};
use strata_geom::{ConvexPolygon, ConvexPolygonPattern, PatternId, PatternTable};
use strata_math::{FixedPoint, Point, Vector};

pub fn fixed(num: i64, den: i64) -> FixedPoint {
    FixedPoint::from_ratio(num, den).expect("nonzero den")
}

pub fn rect(w: i64, h: i64) -> ConvexPolygonPattern {
    ConvexPolygonPattern::new(vec![
        Point::from_ints(0, 0),
        Point::from_ints(0, h),
        Point::from_ints(w, h),
        Point::from_ints(w, 0),
    ])
    .expect("rectangle")
}

/// Table holding a unit square (id 0) and a 10x1 wall (id 1).
pub fn table() -> (PatternTable, PatternId, PatternId) {
    let mut table = PatternTable::new();
    let square = table.insert(rect(1, 1)).expect("room");
    let wall = table.insert(rect(10, 1)).expect("room");
    (table, square, wall)
}

pub fn at(pattern: PatternId, x: FixedPoint, y: FixedPoint) -> ConvexPolygon {
    ConvexPolygon::new(pattern, Vector::new(x, y))
}

/// Minimal game world: bodies in a vector plus a log of callbacks.
#[derive(Debug, Default)]
pub struct TestWorld {
    pub bodies: Vec<Body>,
    pub contacts: Vec<Contact>,
    pub pushes: Vec<(usize, usize, Vector)>,
    /// Stop both bodies on impact (otherwise velocities are left alone).
    pub stop_on_hit: bool,
}

impl TestWorld {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self {
            bodies,
            stop_on_hit: true,
            ..Self::default()
        }
    }
}

impl CollisionWorld for TestWorld {
    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn body(&self, index: usize) -> Body {
        self.bodies[index]
    }

    fn on_collision(&mut self, contact: &Contact) {
        self.contacts.push(*contact);
        if self.stop_on_hit {
            self.bodies[contact.this].velocity = Vector::ZERO;
        }
    }

    fn on_pushed_apart(&mut self, this: usize, other: usize, push: Vector) {
        self.pushes.push((this, other, push));
        let body = &mut self.bodies[this];
        body.polygon = body.polygon.translated(push);
    }
}
