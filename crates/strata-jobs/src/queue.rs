// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounded lock-free MPMC ring of job indices.
//!
//! Each slot carries a sequence number that doubles as a generation counter:
//! a producer may only fill a slot whose sequence equals its ticket, and a
//! consumer may only drain a slot whose sequence is one past its ticket. A
//! stale read of a recycled slot therefore never matches and the operation
//! retries with a fresh ticket instead of missing or duplicating an entry.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

struct Slot {
    sequence: AtomicUsize,
    value: AtomicU32,
}

/// Fixed-capacity ready queue shared by submitters and workers.
pub(crate) struct JobQueue {
    slots: Box<[Slot]>,
    mask: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl JobQueue {
    /// Allocates a queue holding at least `capacity` entries (rounded up to a
    /// power of two).
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let slots = (0..capacity)
            .map(|i| Slot {
                sequence: AtomicUsize::new(i),
                value: AtomicU32::new(0),
            })
            .collect();
        Self {
            slots,
            mask: capacity - 1,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Appends `value`, or hands it back when every slot is occupied.
    pub(crate) fn push(&self, value: u32) -> Result<(), u32> {
        let mut pos = self.tail.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos) as isize;
            if diff == 0 {
                match self.tail.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        slot.value.store(value, Ordering::Relaxed);
                        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return Err(value);
            } else {
                pos = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Removes the oldest entry, `None` when nothing is published.
    pub(crate) fn pop(&self) -> Option<u32> {
        let mut pos = self.head.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos.wrapping_add(1)) as isize;
            if diff == 0 {
                match self.head.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = slot.value.load(Ordering::Relaxed);
                        slot.sequence
                            .store(pos.wrapping_add(self.mask).wrapping_add(1), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return None;
            } else {
                pos = self.head.load(Ordering::Relaxed);
            }
        }
    }

    /// `true` when no entry has been claimed by a producer but not yet
    /// consumed. May be stale by the time the caller acts on it.
    pub(crate) fn is_empty(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail == head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_and_bounded() {
        let q = JobQueue::with_capacity(3);
        assert_eq!(q.capacity(), 4);
        for v in 0..4 {
            assert_eq!(q.push(v), Ok(()));
        }
        assert_eq!(q.push(9), Err(9));
        assert_eq!(q.pop(), Some(0));
        assert_eq!(q.push(9), Ok(()));
        assert_eq!((q.pop(), q.pop(), q.pop(), q.pop()), (Some(1), Some(2), Some(3), Some(9)));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn concurrent_producers_and_consumers_see_each_value_once() {
        let q = Arc::new(JobQueue::with_capacity(64));
        let producers: Vec<_> = (0..4_u32)
            .map(|p| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    for i in 0..250 {
                        let mut v = p * 1000 + i;
                        while let Err(back) = q.push(v) {
                            v = back;
                            thread::yield_now();
                        }
                    }
                })
            })
            .collect();
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while seen.len() < 250 {
                        match q.pop() {
                            Some(v) => seen.push(v),
                            None => thread::yield_now(),
                        }
                    }
                    seen
                })
            })
            .collect();
        for p in producers {
            p.join().expect("producer");
        }
        let mut all = BTreeSet::new();
        for c in consumers {
            for v in c.join().expect("consumer") {
                assert!(all.insert(v), "value {v} popped twice");
            }
        }
        assert_eq!(all.len(), 1000);
    }
}
