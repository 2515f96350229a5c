// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Impact records and the scoped list a detector pass hands back.

use std::ops::Deref;

use strata_math::{FixedPoint, Point};

/// One pairwise impact found by [`crate::CollisionDetector::find_collisions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Lower index of the pair in the caller's per-tick buffers.
    pub first: usize,
    /// Higher index of the pair. Always `> first`.
    pub second: usize,
    /// Estimated contact point, in the caller's coordinates.
    pub point: Point,
    /// Fraction of the frame at which the pair touches (clipped to the time
    /// step). Values above one lie beyond this frame.
    pub at_time: FixedPoint,
}

impl Collision {
    /// Ordering key used to pick the earliest collision deterministically.
    pub fn order_key(&self) -> (FixedPoint, usize, usize) {
        (self.at_time, self.first, self.second)
    }
}

/// Collisions of one detector pass.
///
/// Borrows the detector's preallocated buffer; dropping the list empties the
/// buffer for the next pass without releasing its capacity.
#[derive(Debug)]
pub struct CollisionList<'a> {
    buffer: &'a mut Vec<Collision>,
}

impl<'a> CollisionList<'a> {
    pub(crate) fn new(buffer: &'a mut Vec<Collision>) -> Self {
        Self { buffer }
    }

    /// Earliest collision by `(at_time, first, second)`.
    pub fn earliest(&self) -> Option<Collision> {
        self.buffer.iter().copied().min_by_key(Collision::order_key)
    }
}

impl Deref for CollisionList<'_> {
    type Target = [Collision];

    fn deref(&self) -> &[Collision] {
        self.buffer
    }
}

impl Drop for CollisionList<'_> {
    fn drop(&mut self) {
        self.buffer.clear();
    }
}
