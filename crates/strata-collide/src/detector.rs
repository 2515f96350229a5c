// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Continuous (swept) SAT collision detection.
//!
//! Each pair is treated in the frame of its first polygon: the second moves
//! with the relative velocity. Every separating axis yields the instant its
//! two projections start touching; the earliest of those instants at which
//! *all* axes overlap is the time of impact.

use strata_geom::{BoundingBox, ConvexPolygon, PatternTable, PlacedPolygon};
use strata_math::{FixedPoint, Vector};
use tracing::{debug, trace, warn};

use crate::collision::{Collision, CollisionList};
use crate::config::DetectorConfig;
use crate::contact::collision_point_stationary;
use crate::error::CollideError;
use crate::sat::unique_axes;

/// Swept collision detector with preallocated scratch buffers.
///
/// One detector belongs to one level pass; it is not shared across jobs.
#[derive(Debug)]
pub struct CollisionDetector {
    config: DetectorConfig,
    times: Vec<FixedPoint>,
    collisions: Vec<Collision>,
}

impl CollisionDetector {
    /// Allocates the collision buffer (`max_collisions`) and the time
    /// scratch (two candidates per pattern vertex of a pair).
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            times: Vec::with_capacity(config.max_pattern_vertices.saturating_mul(2)),
            collisions: Vec::with_capacity(config.max_collisions),
        }
    }

    /// The sizes this detector was built with.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Finds every collision among the first `count` polygons during one
    /// frame of motion.
    ///
    /// Pairs where neither polygon moves are skipped. With `limit_time`,
    /// pairs whose motion-padded bounding boxes do not meet are rejected
    /// early and impacts later than one frame are dropped. Each time of impact
    /// is clipped down to a multiple of `time_step`, one step short of the raw
    /// time when it lands exactly on a multiple, so bodies stop just before
    /// contact. A zero `time_step` disables clipping.
    ///
    /// # Errors
    /// [`CollideError::CountOutOfRange`] when `count` exceeds either slice,
    /// [`CollideError::Geom`] for an unknown pattern id and
    /// [`CollideError::CollisionCapacity`] when the buffer overflows.
    pub fn find_collisions(
        &mut self,
        patterns: &PatternTable,
        polygons: &[ConvexPolygon],
        velocities: &[Vector],
        count: usize,
        time_step: FixedPoint,
        limit_time: bool,
    ) -> Result<CollisionList<'_>, CollideError> {
        self.collisions.clear();
        if count > polygons.len() || count > velocities.len() {
            return Err(CollideError::CountOutOfRange {
                count,
                polygons: polygons.len(),
                velocities: velocities.len(),
            });
        }

        for first in 0..count {
            for second in first + 1..count {
                let (v1, v2) = (velocities[first], velocities[second]);
                if v1.is_zero() && v2.is_zero() {
                    continue;
                }
                let p1 = patterns.resolve(polygons[first])?;
                let p2 = patterns.resolve(polygons[second])?;
                if limit_time && !motion_bounds(&p1, v1).overlaps(&motion_bounds(&p2, v2)) {
                    continue;
                }

                let offset = recenter_offset(&p1.bounding_box(), &p2.bounding_box());
                let c1 = p1.translated(offset);
                let c2 = p2.translated(offset);
                let Some(raw_time) = self.collision_time(&c1, v1, &c2, v2) else {
                    continue;
                };
                if limit_time && raw_time > FixedPoint::ONE {
                    continue;
                }
                let at_time = clip_time(raw_time, time_step);
                let point = collision_point_stationary(
                    &c1.translated(v1 * at_time),
                    &c2.translated(v2 * at_time),
                ) - offset;

                if self.collisions.len() >= self.config.max_collisions {
                    warn!(capacity = self.config.max_collisions, "collision buffer exhausted");
                    self.collisions.clear();
                    return Err(CollideError::CollisionCapacity {
                        capacity: self.config.max_collisions,
                    });
                }
                debug!(first, second, %raw_time, %at_time, "collision found");
                self.collisions.push(Collision {
                    first,
                    second,
                    point,
                    at_time,
                });
            }
        }
        Ok(CollisionList::new(&mut self.collisions))
    }

    /// Time of impact of `p2` moving at `v2` against `p1` moving at `v1`,
    /// in frames.
    ///
    /// `None` when the polygons already overlap or touch, when they never
    /// converge, or when no candidate instant has every axis overlapping.
    pub fn collision_time(
        &mut self,
        p1: &PlacedPolygon<'_>,
        v1: Vector,
        p2: &PlacedPolygon<'_>,
        v2: Vector,
    ) -> Option<FixedPoint> {
        let relative = v2 - v1;
        if relative.is_zero() {
            return None;
        }
        self.times.clear();
        for axis in unique_axes(p1, p2) {
            let (Some(s1), Some(s2)) = (p1.project(axis), p2.project(axis)) else {
                trace!(?axis, "projection overflowed, axis skipped");
                continue;
            };
            let speed = relative.dot(axis);
            let (gap, closing) = if s2.stop() < s1.start() {
                (s1.start() - s2.stop(), speed)
            } else if s2.start() > s1.stop() {
                (s2.start() - s1.stop(), -speed)
            } else {
                continue;
            };
            if closing <= FixedPoint::ZERO {
                // Separated on this axis and never closing: no impact at all.
                return None;
            }
            match gap.try_div(closing) {
                Ok(t) => self.times.push(t),
                Err(_) => trace!(?axis, "degenerate closing speed, axis skipped"),
            }
        }

        self.times.sort_unstable();
        let tolerance = self.config.overlap_tolerance;
        self.times.iter().copied().find(|&t| {
            let moved = p2.translated(relative * t);
            unique_axes(p1, &moved).all(|axis| match (p1.project(axis), moved.project(axis)) {
                (Some(a), Some(b)) => a.overlaps(&b, tolerance),
                _ => true,
            })
        })
    }
}

/// Bounding box padded by `2|v| + 1` per axis.
fn motion_bounds(polygon: &PlacedPolygon<'_>, velocity: Vector) -> BoundingBox {
    let pad = |c: FixedPoint| c.abs().double() + FixedPoint::ONE;
    polygon
        .bounding_box()
        .expanded(pad(velocity.x), pad(velocity.y))
}

/// Shift that brings the pair near the origin: per axis, the negated
/// bounding coordinate of larger magnitude.
fn recenter_offset(a: &BoundingBox, b: &BoundingBox) -> Vector {
    let pick = |p: FixedPoint, q: FixedPoint| if q.abs() > p.abs() { -q } else { -p };
    Vector::new(pick(a.min().x, b.min().x), pick(a.min().y, b.min().y))
}

/// Rounds `raw` down to a multiple of `step`, strictly below `raw` and never
/// negative. A zero step leaves the time unchanged.
fn clip_time(raw: FixedPoint, step: FixedPoint) -> FixedPoint {
    let Some(steps) = raw.floor_steps(step) else {
        return raw;
    };
    let mut clipped = step.mul_int(steps);
    if clipped == raw {
        clipped -= step;
    }
    clipped.max(FixedPoint::ZERO)
}
