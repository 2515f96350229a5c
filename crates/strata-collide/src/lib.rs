// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! strata-collide: deterministic continuous collision detection.
//!
//! Given placed convex polygons and their per-frame displacements, the
//! [`CollisionDetector`] reports when each pair first touches during the
//! frame and roughly where. [`minimum_translation_vector`] separates pairs
//! that already overlap. A [`LevelResolver`] drives both for one depth level,
//! handing every impact to a game-supplied [`CollisionWorld`], and the
//! [`FrameCollider`] runs the four levels in parallel on `strata-jobs`.
//!
//! All arithmetic is fixed-point; identical inputs give identical outputs on
//! every platform.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod collision;
mod config;
mod contact;
mod detector;
mod error;
mod frame;
mod resolve;
mod sat;

pub use collision::{Collision, CollisionList};
pub use config::{DetectorConfig, EngineConfig, ResolveConfig};
pub use contact::{closest_point, collision_point_stationary};
pub use detector::CollisionDetector;
pub use error::CollideError;
pub use frame::{DepthLevel, FrameCollider, FrameReport, LevelPass};
pub use resolve::{Body, CollisionWorld, Contact, LevelResolver, PassReport, ResolvedPairs};
pub use sat::minimum_translation_vector;
