// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type for fixed-point and vector math.

use thiserror::Error;

/// Failures reported by fixed-point and vector operations.
///
/// Per-tick geometry code treats every variant as recoverable: the offending
/// axis or pair is skipped. Only load-time callers surface these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    /// The divisor was exactly zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Square root of a negative value.
    #[error("square root of a negative value")]
    NegativeSqrt,
    /// An intermediate value left the representable range.
    #[error("fixed-point overflow")]
    Overflow,
    /// The vector is too short to normalize reliably.
    #[error("vector magnitude too small to normalize")]
    DegenerateVector,
}
