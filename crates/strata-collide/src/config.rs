// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tunable knobs for detection and resolution.

use serde::{Deserialize, Serialize};
use strata_config::{ConfigService, ConfigStore};
use strata_jobs::JobsConfig;
use strata_math::FixedPoint;
use tracing::debug;

use crate::error::CollideError;

/// Sizes and tolerances of a [`crate::CollisionDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Collisions one `find_collisions` call may report.
    pub max_collisions: usize,
    /// Slack applied when checking that every axis overlaps at a candidate
    /// time of impact. Serialized as a raw Q43.20 integer.
    pub overlap_tolerance: FixedPoint,
    /// Largest vertex count among the patterns in play. A pair yields at
    /// most twice this many candidate times, which sizes the time scratch.
    pub max_pattern_vertices: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_collisions: 64,
            overlap_tolerance: FixedPoint::from_raw(256),
            max_pattern_vertices: 16,
        }
    }
}

/// Sizes of a [`crate::LevelResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Bodies one level may hold.
    pub max_bodies: usize,
    /// Distinct pairs that may be resolved in one pass.
    pub max_resolved_pairs: usize,
    /// Resolutions of the same pair within one pass before it is treated as
    /// settled for the tick.
    pub max_resolutions_per_pair: u32,
    /// Run the push-apart sweep before resolving collisions.
    pub push_apart: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            max_bodies: 256,
            max_resolved_pairs: 128,
            max_resolutions_per_pair: 5,
            push_apart: true,
        }
    }
}

/// Everything the engine reads from config storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Detector sizing.
    pub detector: DetectorConfig,
    /// Resolver sizing.
    pub resolve: ResolveConfig,
    /// Worker pool sizing.
    pub jobs: JobsConfig,
}

impl EngineConfig {
    /// Storage key used by the harness and tools.
    pub const KEY: &'static str = "engine";

    /// Loads the config stored under `key`, falling back to defaults when the
    /// key is missing, then validates it.
    pub fn load<S: ConfigStore>(service: &ConfigService<S>, key: &str) -> Result<Self, CollideError> {
        let config = match service.load::<Self>(key)? {
            Some(config) => config,
            None => {
                debug!(key, "no stored engine config, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects zero-sized buffers.
    pub fn validate(&self) -> Result<(), CollideError> {
        if self.detector.max_collisions == 0 {
            return Err(CollideError::InvalidConfig("detector.max_collisions must be > 0"));
        }
        if self.detector.overlap_tolerance.is_negative() {
            return Err(CollideError::InvalidConfig("detector.overlap_tolerance must be >= 0"));
        }
        if self.detector.max_pattern_vertices < 3 {
            return Err(CollideError::InvalidConfig("detector.max_pattern_vertices must be >= 3"));
        }
        if self.resolve.max_bodies == 0 {
            return Err(CollideError::InvalidConfig("resolve.max_bodies must be > 0"));
        }
        if self.resolve.max_resolved_pairs == 0 {
            return Err(CollideError::InvalidConfig("resolve.max_resolved_pairs must be > 0"));
        }
        if self.resolve.max_resolutions_per_pair == 0 {
            return Err(CollideError::InvalidConfig(
                "resolve.max_resolutions_per_pair must be > 0",
            ));
        }
        self.jobs.validate()?;
        Ok(())
    }
}
