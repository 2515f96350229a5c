// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pooled completion tokens.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crate::error::JobError;
use crate::system::{lock, Shared};

/// Largest batch one completion token can track.
pub const MAX_JOBS_PER_TOKEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum TokenState {
    Free = 0,
    /// Jobs attached, not yet enqueued.
    Claimed = 1,
    /// Jobs enqueued; workers check it after every job.
    InFlight = 2,
    /// Detached by the worker that saw it complete.
    Signalled = 3,
}

/// Packs a generation counter above the state byte.
///
/// Releasing a slot bumps the generation, so a worker holding a stale
/// snapshot of a recycled slot fails its detach swap instead of signalling
/// the new batch.
fn pack(generation: u64, state: TokenState) -> u64 {
    (generation << 8) | state as u64
}

fn generation_of(word: u64) -> u64 {
    word >> 8
}

fn state_of(word: u64) -> u8 {
    (word & 0xff) as u8
}

/// One entry of the fixed token pool.
pub(crate) struct TokenSlot {
    word: AtomicU64,
    len: AtomicUsize,
    jobs: [AtomicU32; MAX_JOBS_PER_TOKEN],
    done: Mutex<bool>,
    signal: Condvar,
}

impl TokenSlot {
    pub(crate) fn new() -> Self {
        Self {
            word: AtomicU64::new(pack(0, TokenState::Free)),
            len: AtomicUsize::new(0),
            jobs: std::array::from_fn(|_| AtomicU32::new(0)),
            done: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    pub(crate) fn try_claim(&self) -> bool {
        let word = self.word.load(Ordering::Acquire);
        state_of(word) == TokenState::Free as u8
            && self
                .word
                .compare_exchange(
                    word,
                    pack(generation_of(word), TokenState::Claimed),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
    }

    /// Current state word if the slot is in flight.
    pub(crate) fn in_flight_snapshot(&self) -> Option<u64> {
        let word = self.word.load(Ordering::Acquire);
        (state_of(word) == TokenState::InFlight as u8).then_some(word)
    }

    /// Records the batch. Only called while the slot is `Claimed`.
    pub(crate) fn set_jobs(&self, indices: &[u32]) {
        for (slot, &index) in self.jobs.iter().zip(indices) {
            slot.store(index, Ordering::Relaxed);
        }
        self.len.store(indices.len().min(MAX_JOBS_PER_TOKEN), Ordering::Relaxed);
    }

    pub(crate) fn job_indices(&self) -> impl Iterator<Item = u32> + '_ {
        let len = self.len.load(Ordering::Relaxed);
        self.jobs[..len].iter().map(|j| j.load(Ordering::Relaxed))
    }

    pub(crate) fn job_count(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Makes the slot visible to workers; the `Release` store publishes the
    /// job list written by [`TokenSlot::set_jobs`].
    pub(crate) fn publish(&self) {
        let generation = generation_of(self.word.load(Ordering::Acquire));
        self.word
            .store(pack(generation, TokenState::InFlight), Ordering::Release);
    }

    /// Wins the right to signal the batch seen in `snapshot`. At most one
    /// caller succeeds per generation.
    pub(crate) fn try_detach(&self, snapshot: u64) -> bool {
        self.word
            .compare_exchange(
                snapshot,
                pack(generation_of(snapshot), TokenState::Signalled),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn signal_done(&self) {
        let mut done = lock(&self.done);
        *done = true;
        self.signal.notify_all();
    }

    /// Blocks until [`TokenSlot::signal_done`] runs, then re-arms the flag.
    pub(crate) fn wait_done(&self) {
        let mut done = lock(&self.done);
        while !*done {
            done = self
                .signal
                .wait(done)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
        *done = false;
    }

    pub(crate) fn release(&self) {
        let next = generation_of(self.word.load(Ordering::Acquire)).wrapping_add(1) & (u64::MAX >> 8);
        self.len.store(0, Ordering::Relaxed);
        self.word.store(pack(next, TokenState::Free), Ordering::Release);
    }
}

/// Handle to a claimed batch of 1 to [`MAX_JOBS_PER_TOKEN`] jobs.
///
/// Nothing runs until [`CompletionToken::wait_for_completion`] is called.
/// Dropping an unwaited token puts its jobs back to idle and returns the
/// token to the pool.
#[must_use = "jobs only run once the token is waited on"]
pub struct CompletionToken {
    shared: Arc<Shared>,
    slot: usize,
    pending: bool,
}

impl CompletionToken {
    pub(crate) fn new(shared: Arc<Shared>, slot: usize) -> Self {
        Self {
            shared,
            slot,
            pending: true,
        }
    }

    /// Number of jobs in the batch.
    pub fn job_count(&self) -> usize {
        self.shared.token(self.slot).map_or(0, TokenSlot::job_count)
    }

    /// Enqueues the batch, wakes the workers and blocks until every job has
    /// finished. Jobs are idle again and the token is back in the pool when
    /// this returns.
    ///
    /// # Errors
    /// [`JobError::JobPanicked`] if a delegate panicked,
    /// [`JobError::QueueFull`] if the ready queue rejected a job and
    /// [`JobError::ShutDown`] if the system is shutting down.
    pub fn wait_for_completion(mut self) -> Result<(), JobError> {
        self.pending = false;
        self.shared.run_token(self.slot)
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        if self.pending {
            self.shared.abandon_token(self.slot);
        }
    }
}

impl std::fmt::Debug for CompletionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionToken")
            .field("slot", &self.slot)
            .field("jobs", &self.job_count())
            .finish_non_exhaustive()
    }
}
