// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! strata-math: deterministic 2D math for the Strata collision core.
//!
//! Everything here is built on [`FixedPoint`], a Q43.20 scalar backed by
//! `i64`. There is no floating point anywhere in this crate, so identical
//! inputs produce bit-identical results on every platform and every run.
//!
//! Coordinates are Cartesian (Y-up). Converting from screen space (Y-down) is
//! the caller's job and happens at the boundary, never in here.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod error;
/// Q43.20 fixed-point scalar.
pub mod fixed;
/// Explicitly seeded deterministic PRNG.
pub mod prng;
/// 1D and 2D line segments.
pub mod segment;
/// Vectors and points.
pub mod vector;

pub use error::MathError;
pub use fixed::{FixedPoint, FRAC_BITS};
pub use prng::Prng;
pub use segment::{LineSegment1D, LineSegment2D, SegmentIntersection, NORMAL_RETRY_LIMIT};
pub use vector::{Point, Vector, PARALLEL_TOLERANCE, POINT_TOLERANCE_RAW};
