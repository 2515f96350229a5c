// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Seeded arena scenarios and their per-frame state digests.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use strata_collide::{Body, CollisionWorld, Contact, DepthLevel, EngineConfig, FrameCollider};
use strata_geom::{ConvexPolygon, ConvexPolygonPattern, PatternId, PatternTable, PolygonPattern};
use strata_jobs::JobSystem;
use strata_math::{FixedPoint, Point, Prng, Vector};
use tracing::{debug, info};

/// Interior size of every arena, in units.
const ROOM: i64 = 64;
/// Wall thickness.
const WALL: i64 = 2;
/// Movers are dropped on a grid of this pitch so none start overlapping.
const CELL: i64 = 8;
const GRID: i64 = 7;
/// Largest `bodies_per_level` a scenario accepts.
pub const MAX_MOVERS: usize = (GRID * GRID) as usize;
/// Walls come first in every arena's body list.
const WALLS: usize = 4;
/// Frame time step for clipping (1/16).
const TIME_STEP_RAW: i64 = 1 << 16;

/// Chevron authored in Y-down art space; it decomposes into two wedges.
const CHEVRON: [(i64, i64); 4] = [(0, 0), (4, 2), (0, 4), (1, 2)];
const CHEVRON_HEIGHT: i64 = 4;

/// A reproducible drill: same fields, same digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Seeds every level's generator.
    pub seed: u64,
    /// Moving bodies per level, at most [`MAX_MOVERS`].
    pub bodies_per_level: usize,
    /// Frames to simulate.
    pub frames: usize,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            bodies_per_level: 12,
            frames: 120,
        }
    }
}

/// Digests and totals of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// The scenario that produced this outcome.
    pub scenario: Scenario,
    /// Worker threads used.
    pub workers: usize,
    /// Hex blake3 digest of the full state after each frame.
    pub digests: Vec<String>,
    /// Collisions resolved over the run.
    pub collisions: usize,
    /// Push-apart separations over the run.
    pub pushes: usize,
}

impl RunOutcome {
    /// Digest after the last frame, if any frame ran.
    pub fn final_digest(&self) -> Option<&str> {
        self.digests.last().map(String::as_str)
    }

    /// First frame whose digest differs from `other`, including a length
    /// mismatch.
    pub fn first_divergence(&self, other: &Self) -> Option<usize> {
        self.digests
            .iter()
            .zip(&other.digests)
            .position(|(a, b)| a != b)
            .or_else(|| {
                (self.digests.len() != other.digests.len())
                    .then(|| self.digests.len().min(other.digests.len()))
            })
    }
}

/// Pattern ids shared by all four arenas.
#[derive(Debug, Clone)]
struct ArenaPatterns {
    floor: PatternId,
    side: PatternId,
    crate_box: PatternId,
    wedges: Vec<PatternId>,
    chevron: PolygonPattern,
}

fn rect(w: i64, h: i64) -> Result<ConvexPolygonPattern> {
    Ok(ConvexPolygonPattern::new(vec![
        Point::from_ints(0, 0),
        Point::from_ints(0, h),
        Point::from_ints(w, h),
        Point::from_ints(w, 0),
    ])?)
}

fn build_patterns() -> Result<(PatternTable, ArenaPatterns)> {
    let mut table = PatternTable::new();
    let floor = table.insert(rect(ROOM + 2 * WALL, WALL)?)?;
    let side = table.insert(rect(WALL, ROOM)?)?;
    let crate_box = table.insert(rect(2, 2)?)?;
    let outline: Vec<Point> = CHEVRON.iter().map(|&(x, y)| Point::from_ints(x, y)).collect();
    let chevron = PolygonPattern::from_screen_vertices(&outline, FixedPoint::from_int(CHEVRON_HEIGHT))
        .context("chevron outline")?;
    let pieces = chevron
        .decompose_into_convex_polygons()
        .context("decomposing chevron")?;
    let wedges = table.insert_all(pieces)?;
    debug!(wedges = wedges.len(), patterns = table.len(), "arena patterns built");
    Ok((
        table,
        ArenaPatterns {
            floor,
            side,
            crate_box,
            wedges,
            chevron,
        },
    ))
}

/// One level of the arena: four static walls followed by bouncing movers.
///
/// Owns its own generator, so levels running on different workers never
/// share random state.
#[derive(Debug, Clone)]
pub struct ArenaWorld {
    bodies: Vec<Body>,
    rng: Prng,
}

impl ArenaWorld {
    fn build(level: DepthLevel, scenario: &Scenario, patterns: &ArenaPatterns) -> Self {
        let level_seed = scenario.seed ^ (level.index() as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let mut rng = Prng::from_seed_u64(level_seed);
        let room = FixedPoint::from_int(ROOM);
        let wall = FixedPoint::from_int(WALL);
        let still = |pattern, x: FixedPoint, y: FixedPoint| Body {
            polygon: ConvexPolygon::new(pattern, Vector::new(x, y)),
            velocity: Vector::ZERO,
        };

        let mut bodies = Vec::with_capacity(WALLS + scenario.bodies_per_level);
        bodies.push(still(patterns.floor, -wall, -wall));
        bodies.push(still(patterns.floor, -wall, room));
        bodies.push(still(patterns.side, -wall, FixedPoint::ZERO));
        bodies.push(still(patterns.side, room, FixedPoint::ZERO));

        let speed = FixedPoint::from_int(2);
        for slot in 0..scenario.bodies_per_level as i64 {
            // Art-space (Y-down) top-left corner of the cell, plus jitter.
            let sx = 2 + CELL * (slot % GRID) + i64::from(rng.next_int(0, 2));
            let sy = 2 + CELL * (slot / GRID) + i64::from(rng.next_int(0, 2));
            let origin = Point::from_ints(sx, sy);
            let polygon = if patterns.wedges.is_empty() || rng.one_in(2) {
                ConvexPolygon::new(patterns.crate_box, Vector::from_ints(sx, ROOM - sy - 2))
            } else {
                let piece = patterns.wedges[rng.next_int(0, patterns.wedges.len() as i32 - 1) as usize];
                ConvexPolygon::new(piece, patterns.chevron.placement(origin, room))
            };
            let velocity = Vector::new(rng.next_fixed(-speed, speed), rng.next_fixed(-speed, speed));
            bodies.push(Body { polygon, velocity });
        }
        Self { bodies, rng }
    }

    /// Bodies in index order (walls first).
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Moves every body by its velocity for one whole frame.
    pub fn integrate(&mut self) {
        let start = WALLS.min(self.bodies.len());
        for body in &mut self.bodies[start..] {
            body.polygon = body.polygon.translated(body.velocity);
        }
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        hasher.update(&(self.bodies.len() as u64).to_le_bytes());
        for body in &self.bodies {
            let t = body.polygon.translation();
            hasher.update(&(body.polygon.pattern().index() as u64).to_le_bytes());
            for raw in [t.x, t.y, body.velocity.x, body.velocity.y].map(FixedPoint::raw) {
                hasher.update(&raw.to_le_bytes());
            }
        }
    }
}

impl CollisionWorld for ArenaWorld {
    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn body(&self, index: usize) -> Body {
        self.bodies[index]
    }

    fn on_collision(&mut self, contact: &Contact) {
        if contact.this < WALLS {
            return;
        }
        let body = &mut self.bodies[contact.this];
        body.velocity = -body.velocity;
        if self.rng.one_in(4) {
            body.velocity = body.velocity.half();
        }
    }

    fn on_pushed_apart(&mut self, this: usize, _other: usize, push: Vector) {
        let body = &mut self.bodies[this];
        body.polygon = body.polygon.translated(push);
    }
}

impl Scenario {
    /// Runs the scenario on a fresh job system built from `config`.
    ///
    /// # Errors
    /// Scenario validation, pattern construction, scheduling or capacity
    /// errors from the collision core.
    pub fn run(&self, config: &EngineConfig) -> Result<RunOutcome> {
        if self.bodies_per_level > MAX_MOVERS {
            bail!(
                "bodies_per_level {} exceeds the arena grid ({MAX_MOVERS})",
                self.bodies_per_level
            );
        }
        config.validate()?;
        let (table, ids) = build_patterns()?;
        let system = JobSystem::new(config.jobs)?;
        let workers = system.worker_count();
        let worlds = DepthLevel::ALL.map(|level| ArenaWorld::build(level, self, &ids));
        let collider = FrameCollider::new(system, Arc::new(table), config, worlds)?;
        let time_step = FixedPoint::from_raw(TIME_STEP_RAW);

        let mut outcome = RunOutcome {
            scenario: *self,
            workers,
            digests: Vec::with_capacity(self.frames),
            collisions: 0,
            pushes: 0,
        };
        for frame in 0..self.frames {
            let report = collider
                .run_frame(time_step)
                .with_context(|| format!("frame {frame}"))?;
            outcome.collisions += report.total_collisions();
            outcome.pushes += report.total_pushes();

            let mut hasher = blake3::Hasher::new();
            hasher.update(&(frame as u64).to_le_bytes());
            for level in DepthLevel::ALL {
                hasher.update(&(level.index() as u64).to_le_bytes());
                collider.with_level(level, |world| {
                    world.integrate();
                    world.hash_into(&mut hasher);
                })?;
            }
            outcome.digests.push(hex::encode(hasher.finalize().as_bytes()));
        }
        info!(
            seed = self.seed,
            frames = self.frames,
            workers,
            collisions = outcome.collisions,
            "scenario finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chevron_splits_into_two_wedges() {
        let (table, ids) = build_patterns().expect("authored shapes are valid");
        assert_eq!(ids.wedges.len(), 2);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn movers_start_inside_the_room() {
        let (table, ids) = build_patterns().expect("authored shapes are valid");
        let scenario = Scenario {
            bodies_per_level: MAX_MOVERS,
            ..Scenario::default()
        };
        let world = ArenaWorld::build(DepthLevel::Top, &scenario, &ids);
        assert_eq!(world.bodies().len(), WALLS + MAX_MOVERS);
        let room = FixedPoint::from_int(ROOM);
        for body in &world.bodies()[WALLS..] {
            let bounds = table.resolve(body.polygon).expect("known pattern").bounding_box();
            assert!(bounds.min().x > FixedPoint::ZERO && bounds.min().y > FixedPoint::ZERO);
            assert!(bounds.max().x < room && bounds.max().y < room);
        }
    }

    #[test]
    fn divergence_reports_first_differing_frame() {
        let mut a = RunOutcome {
            scenario: Scenario::default(),
            workers: 1,
            digests: vec!["aa".into(), "bb".into(), "cc".into()],
            collisions: 0,
            pushes: 0,
        };
        let mut b = a.clone();
        assert_eq!(a.first_divergence(&b), None);
        b.digests[1] = "xx".into();
        assert_eq!(a.first_divergence(&b), Some(1));
        a.digests.truncate(1);
        assert_eq!(a.first_divergence(&b), Some(1));
    }
}
