// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sequential collision resolution for one depth level.
//!
//! The resolver repeatedly asks the detector for the earliest unresolved
//! collision, reports it to the world and records the pair. Reactions may
//! change velocities or positions, so the candidate buffers are rebuilt from
//! the world on every iteration.

use strata_geom::{ConvexPolygon, PatternTable};
use strata_math::{FixedPoint, Point, Vector};
use tracing::{debug, trace, warn};

use crate::config::{DetectorConfig, ResolveConfig};
use crate::detector::CollisionDetector;
use crate::error::CollideError;
use crate::sat::minimum_translation_vector;

/// A body as the world presents it for one resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    /// Placed convex shape.
    pub polygon: ConvexPolygon,
    /// Displacement over one frame.
    pub velocity: Vector,
}

/// One side of a resolved collision, as delivered to
/// [`CollisionWorld::on_collision`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Body receiving the callback.
    pub this: usize,
    /// The body it hit.
    pub other: usize,
    /// Estimated contact point.
    pub point: Point,
    /// Clipped time of impact, in frames.
    pub at_time: FixedPoint,
    /// Shape of `this` at detection time.
    pub this_polygon: ConvexPolygon,
    /// Shape of `other` at detection time.
    pub other_polygon: ConvexPolygon,
}

impl Contact {
    /// The same contact seen from the other body.
    pub fn flipped(&self) -> Self {
        Self {
            this: self.other,
            other: self.this,
            point: self.point,
            at_time: self.at_time,
            this_polygon: self.other_polygon,
            other_polygon: self.this_polygon,
        }
    }
}

/// The game-side view of one level.
///
/// Bodies are addressed by dense indices valid for the duration of one
/// [`LevelResolver::resolve`] call. Reactions are free to change any body;
/// the resolver re-reads them before every detection step.
pub trait CollisionWorld {
    /// Number of bodies in the level.
    fn body_count(&self) -> usize;
    /// Current shape and velocity of body `index` (`index < body_count()`).
    fn body(&self, index: usize) -> Body;
    /// Called once per side for every resolved collision.
    fn on_collision(&mut self, contact: &Contact);
    /// Called when the push-apart sweep separates `this` from `other`; the
    /// world applies `push` to `this`.
    fn on_pushed_apart(&mut self, this: usize, other: usize, push: Vector);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PairEntry {
    first: usize,
    second: usize,
    count: u32,
}

/// Pairs resolved during the current pass, with per-pair counts.
///
/// A pair reaching the cap is treated as settled for the tick so bodies that
/// keep bouncing cannot stall the pass.
#[derive(Debug, Clone)]
pub struct ResolvedPairs {
    entries: Vec<PairEntry>,
    capacity: usize,
    cap_per_pair: u32,
}

impl ResolvedPairs {
    /// Preallocates room for `capacity` distinct pairs.
    pub fn new(capacity: usize, cap_per_pair: u32) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            cap_per_pair,
        }
    }

    fn key(a: usize, b: usize) -> (usize, usize) {
        (a.min(b), a.max(b))
    }

    /// Times the pair was resolved this pass.
    pub fn count(&self, a: usize, b: usize) -> u32 {
        let (first, second) = Self::key(a, b);
        self.entries
            .iter()
            .find(|e| e.first == first && e.second == second)
            .map_or(0, |e| e.count)
    }

    /// `true` once the pair reached the per-pair cap.
    pub fn is_settled(&self, a: usize, b: usize) -> bool {
        self.count(a, b) >= self.cap_per_pair
    }

    /// Records one more resolution of the pair and returns its new count.
    ///
    /// # Errors
    /// [`CollideError::PairCapacity`] when a new pair does not fit.
    pub fn record(&mut self, a: usize, b: usize) -> Result<u32, CollideError> {
        let (first, second) = Self::key(a, b);
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.first == first && e.second == second)
        {
            entry.count += 1;
            return Ok(entry.count);
        }
        if self.entries.len() >= self.capacity {
            warn!(capacity = self.capacity, "resolved-pair table exhausted");
            return Err(CollideError::PairCapacity {
                capacity: self.capacity,
            });
        }
        self.entries.push(PairEntry {
            first,
            second,
            count: 1,
        });
        Ok(1)
    }

    /// Distinct pairs recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every pair, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Outcome of one [`LevelResolver::resolve`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    /// Separations applied by the push-apart sweep.
    pub pushes: usize,
    /// Collisions delivered to the world.
    pub collisions: usize,
    /// Detection passes run, including the final empty one.
    pub iterations: usize,
}

/// Owns everything one level pass needs: detector, candidate buffers and the
/// resolved-pair table. Nothing is allocated after construction.
#[derive(Debug)]
pub struct LevelResolver {
    config: ResolveConfig,
    detector: CollisionDetector,
    polygons: Vec<ConvexPolygon>,
    velocities: Vec<Vector>,
    resolved: ResolvedPairs,
}

impl LevelResolver {
    /// Sizes all buffers from the two configs.
    pub fn new(config: ResolveConfig, detector: DetectorConfig) -> Self {
        Self {
            config,
            detector: CollisionDetector::new(detector),
            polygons: Vec::with_capacity(config.max_bodies),
            velocities: Vec::with_capacity(config.max_bodies),
            resolved: ResolvedPairs::new(config.max_resolved_pairs, config.max_resolutions_per_pair),
        }
    }

    /// Pairs recorded by the last pass.
    pub fn resolved_pairs(&self) -> &ResolvedPairs {
        &self.resolved
    }

    /// Runs the push-apart sweep (when enabled) and then resolves collisions
    /// earliest-first until none remain that are not settled.
    ///
    /// # Errors
    /// Capacity errors ([`CollideError::BodyCapacity`],
    /// [`CollideError::PairCapacity`], [`CollideError::CollisionCapacity`])
    /// and unknown pattern ids.
    pub fn resolve<W>(
        &mut self,
        patterns: &PatternTable,
        world: &mut W,
        time_step: FixedPoint,
    ) -> Result<PassReport, CollideError>
    where
        W: CollisionWorld + ?Sized,
    {
        self.resolved.clear();
        let mut report = PassReport::default();
        if self.config.push_apart {
            report.pushes = self.push_apart(patterns, world)?;
        }

        loop {
            let count = self.rebuild(world)?;
            report.iterations += 1;
            let chosen = {
                let list = self.detector.find_collisions(
                    patterns,
                    &self.polygons,
                    &self.velocities,
                    count,
                    time_step,
                    true,
                )?;
                list.iter()
                    .filter(|c| !self.resolved.is_settled(c.first, c.second))
                    .min_by_key(|c| c.order_key())
                    .copied()
            };
            let Some(collision) = chosen else {
                break;
            };
            let contact = Contact {
                this: collision.first,
                other: collision.second,
                point: collision.point,
                at_time: collision.at_time,
                this_polygon: self.polygons[collision.first],
                other_polygon: self.polygons[collision.second],
            };
            world.on_collision(&contact);
            world.on_collision(&contact.flipped());
            let times = self.resolved.record(collision.first, collision.second)?;
            report.collisions += 1;
            debug!(
                first = collision.first,
                second = collision.second,
                at_time = %collision.at_time,
                times,
                "collision resolved"
            );
        }
        Ok(report)
    }

    fn rebuild<W>(&mut self, world: &W) -> Result<usize, CollideError>
    where
        W: CollisionWorld + ?Sized,
    {
        let count = world.body_count();
        if count > self.config.max_bodies {
            warn!(count, capacity = self.config.max_bodies, "too many bodies in level");
            return Err(CollideError::BodyCapacity {
                count,
                capacity: self.config.max_bodies,
            });
        }
        self.polygons.clear();
        self.velocities.clear();
        for index in 0..count {
            let body = world.body(index);
            self.polygons.push(body.polygon);
            self.velocities.push(body.velocity);
        }
        Ok(count)
    }

    /// Separates overlapping pairs that involve a moving body. The moving
    /// side is pushed; when both move, the later index yields.
    fn push_apart<W>(&mut self, patterns: &PatternTable, world: &mut W) -> Result<usize, CollideError>
    where
        W: CollisionWorld + ?Sized,
    {
        let count = world.body_count();
        if count > self.config.max_bodies {
            return Err(CollideError::BodyCapacity {
                count,
                capacity: self.config.max_bodies,
            });
        }
        let mut pushes = 0;
        for first in 0..count {
            for second in first + 1..count {
                // Re-read: an earlier push may have moved either body.
                let (a, b) = (world.body(first), world.body(second));
                let (stationary, moving) = match (a.velocity.is_zero(), b.velocity.is_zero()) {
                    (true, true) => continue,
                    (false, true) => ((second, b), (first, a)),
                    _ => ((first, a), (second, b)),
                };
                let s = patterns.resolve(stationary.1.polygon)?;
                let m = patterns.resolve(moving.1.polygon)?;
                if !s.bounding_box().overlaps(&m.bounding_box()) {
                    continue;
                }
                let Some(push) = minimum_translation_vector(&s, &m) else {
                    continue;
                };
                trace!(this = moving.0, other = stationary.0, ?push, "pushed apart");
                world.on_pushed_apart(moving.0, stationary.0, push);
                pushes += 1;
            }
        }
        Ok(pushes)
    }
}
