// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use strata_config::ConfigError;
use strata_geom::GeomError;
use strata_jobs::JobError;
use thiserror::Error;

/// Errors surfaced by the collision core.
///
/// Every variant is a sizing or authoring bug on the caller's side. Numeric
/// trouble inside a tick (overflowed projections, zero-length edges) never
/// shows up here: the affected axis or pair is skipped instead.
#[derive(Debug, Error)]
pub enum CollideError {
    /// More collisions in one pass than the detector buffer holds.
    #[error("collision buffer exhausted (capacity {capacity})")]
    CollisionCapacity {
        /// Preallocated collision slots.
        capacity: usize,
    },
    /// A level handed the resolver more bodies than it was sized for.
    #[error("level has {count} bodies, resolver holds {capacity}")]
    BodyCapacity {
        /// Bodies reported by the world.
        count: usize,
        /// Preallocated body slots.
        capacity: usize,
    },
    /// Too many distinct pairs resolved in one pass.
    #[error("resolved-pair table exhausted (capacity {capacity})")]
    PairCapacity {
        /// Preallocated pair slots.
        capacity: usize,
    },
    /// `count` exceeds one of the input slices.
    #[error("count {count} exceeds input ({polygons} polygons, {velocities} velocities)")]
    CountOutOfRange {
        /// Requested entry count.
        count: usize,
        /// Length of the polygon slice.
        polygons: usize,
        /// Length of the velocity slice.
        velocities: usize,
    },
    /// A config knob is out of range.
    #[error("invalid collision config: {0}")]
    InvalidConfig(&'static str),
    /// Geometry lookup failed (unknown pattern id).
    #[error(transparent)]
    Geom(#[from] GeomError),
    /// Scheduling a level pass failed.
    #[error(transparent)]
    Jobs(#[from] JobError),
    /// Loading or saving the engine config failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
