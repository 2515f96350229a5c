// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! strata-geom: polygon shapes for the Strata collision core.
//!
//! Authored outlines arrive as [`PolygonPattern`]s (possibly concave) and are
//! decomposed once at load time into [`ConvexPolygonPattern`]s. Patterns live
//! in a [`PatternTable`]; the per-tick world only carries cheap
//! [`ConvexPolygon`] handles (pattern id plus translation).
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod aabb;
mod area;
mod convex;
mod decompose;
mod error;
mod polygon;

pub use aabb::BoundingBox;
pub use area::{signed_area, signed_area_doubled_wide, winding_of, Winding};
pub use convex::{ConvexPolygon, ConvexPolygonPattern, PatternId, PatternTable, PlacedPolygon};
pub use decompose::{LINE_SPLIT_THRESHOLD, MAX_LINE_DIVISIONS, MAX_SPLIT_DEPTH};
pub use error::GeomError;
pub use polygon::PolygonPattern;
