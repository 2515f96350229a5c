// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-frame fan-out: one resolver job per depth level.
//!
//! Each level owns a disjoint partition of the world, so the four passes run
//! concurrently on the job system without sharing scratch memory.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_geom::PatternTable;
use strata_jobs::{Job, JobHandle, JobSystem};
use strata_math::FixedPoint;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::CollideError;
use crate::resolve::{CollisionWorld, LevelResolver, PassReport};

/// Depth layer an entity lives on. Bodies on different levels never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthLevel {
    /// Ground layer.
    Floor,
    /// Regular actors.
    Middle,
    /// Raised platforms and flyers.
    Top,
    /// Overhead layer.
    Ceiling,
}

impl DepthLevel {
    /// Every level, in job submission order.
    pub const ALL: [Self; 4] = [Self::Floor, Self::Middle, Self::Top, Self::Ceiling];

    /// Dense index in `0..4`.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DepthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Floor => "floor",
            Self::Middle => "middle",
            Self::Top => "top",
            Self::Ceiling => "ceiling",
        };
        f.write_str(name)
    }
}

/// Scratch state of one level job: its resolver and world partition.
pub struct LevelPass<W> {
    level: DepthLevel,
    resolver: LevelResolver,
    world: W,
    patterns: Arc<PatternTable>,
    time_step: FixedPoint,
    outcome: Option<Result<PassReport, CollideError>>,
}

impl<W: CollisionWorld> LevelPass<W> {
    fn run(&mut self) {
        let outcome = self
            .resolver
            .resolve(&self.patterns, &mut self.world, self.time_step);
        debug!(level = %self.level, ok = outcome.is_ok(), "level pass finished");
        self.outcome = Some(outcome);
    }
}

/// Per-level results of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    levels: [PassReport; 4],
}

impl FrameReport {
    /// Report of one level.
    pub fn level(&self, level: DepthLevel) -> PassReport {
        self.levels[level.index()]
    }

    /// Collisions delivered across all levels.
    pub fn total_collisions(&self) -> usize {
        self.levels.iter().map(|r| r.collisions).sum()
    }

    /// Push-apart separations across all levels.
    pub fn total_pushes(&self) -> usize {
        self.levels.iter().map(|r| r.pushes).sum()
    }
}

/// Runs the four level passes of every frame on a shared [`JobSystem`].
///
/// Jobs are created once and resubmitted each frame through a single
/// completion token.
pub struct FrameCollider<W> {
    system: Arc<JobSystem>,
    jobs: [Job<LevelPass<W>>; 4],
}

impl<W> FrameCollider<W>
where
    W: CollisionWorld + Send + 'static,
{
    /// Creates one job per level, each owning `worlds[level.index()]`.
    ///
    /// # Errors
    /// [`CollideError::Jobs`] when the job arena is full.
    pub fn new(
        system: Arc<JobSystem>,
        patterns: Arc<PatternTable>,
        config: &EngineConfig,
        worlds: [W; 4],
    ) -> Result<Self, CollideError> {
        let [floor, middle, top, ceiling] = worlds;
        let make = |level: DepthLevel, world: W| {
            let pass = LevelPass {
                level,
                resolver: LevelResolver::new(config.resolve, config.detector),
                world,
                patterns: Arc::clone(&patterns),
                time_step: FixedPoint::ZERO,
                outcome: None,
            };
            system.create_job(pass, LevelPass::run)
        };
        let jobs = [
            make(DepthLevel::Floor, floor)?,
            make(DepthLevel::Middle, middle)?,
            make(DepthLevel::Top, top)?,
            make(DepthLevel::Ceiling, ceiling)?,
        ];
        Ok(Self { system, jobs })
    }

    /// Resolves every level for one frame and blocks until all are done.
    ///
    /// # Errors
    /// Scheduling failures, or the error of the first failing level in
    /// [`DepthLevel::ALL`] order.
    pub fn run_frame(&self, time_step: FixedPoint) -> Result<FrameReport, CollideError> {
        for job in &self.jobs {
            job.with_state(|pass| {
                pass.time_step = time_step;
                pass.outcome = None;
            })?;
        }
        let [a, b, c, d] = &self.jobs;
        let batch: [&dyn JobHandle; 4] = [a, b, c, d];
        self.system.run(&batch)?;

        let mut report = FrameReport::default();
        for level in DepthLevel::ALL {
            let outcome = self.jobs[level.index()].with_state(|pass| pass.outcome.take())?;
            report.levels[level.index()] = outcome.unwrap_or_else(|| Ok(PassReport::default()))?;
        }
        Ok(report)
    }

    /// Gives `f` the world of `level` between frames.
    ///
    /// # Errors
    /// [`CollideError::Jobs`] if called while a frame is running.
    pub fn with_level<R>(&self, level: DepthLevel, f: impl FnOnce(&mut W) -> R) -> Result<R, CollideError> {
        self.jobs[level.index()]
            .with_state(|pass| f(&mut pass.world))
            .map_err(CollideError::from)
    }
}

impl<W> fmt::Debug for FrameCollider<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCollider")
            .field("system", &self.system)
            .field("jobs", &self.jobs)
            .finish()
    }
}
