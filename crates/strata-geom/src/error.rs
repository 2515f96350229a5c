// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type for polygon construction and decomposition.

use thiserror::Error;

use crate::convex::PatternId;

/// Invalid authored geometry, reported at load time.
///
/// These indicate bad art data and are never raised during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeomError {
    /// Fewer than three vertices were supplied.
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices {
        /// Number of vertices supplied.
        count: usize,
    },
    /// Two vertices coincide.
    #[error("duplicate vertices at indices {first} and {second}")]
    DuplicateVertex {
        /// Index of the first occurrence.
        first: usize,
        /// Index of the repeated vertex.
        second: usize,
    },
    /// The polygon encloses no area (all vertices collinear) or its area
    /// cannot be represented.
    #[error("polygon is degenerate")]
    Degenerate,
    /// The authored height was zero or negative.
    #[error("original height must be positive")]
    NonPositiveHeight,
    /// No diagonal could split a concave polygon. Only self-intersecting
    /// input gets here.
    #[error("polygon with {vertices} vertices could not be decomposed")]
    Undecomposable {
        /// Vertex count of the polygon that could not be split.
        vertices: usize,
    },
    /// A polygon referenced a pattern id missing from the table.
    #[error("unknown pattern {0:?}")]
    UnknownPattern(PatternId),
    /// The pattern table cannot hold more entries.
    #[error("pattern table is full")]
    TableFull,
}
