// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Strata determinism harness.
//!
//! Builds seeded four-level arenas, runs them through the parallel frame
//! collider and hashes the raw fixed-point state after every frame. Two runs
//! of the same scenario must produce identical digests no matter how many
//! workers the job system has.

pub mod drill;
pub mod scenario;

pub use scenario::{ArenaWorld, RunOutcome, Scenario};
