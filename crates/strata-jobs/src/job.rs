// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reusable jobs: a delegate plus the scratch state it owns.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, TryLockError};

use crate::error::JobError;
use crate::system::Shared;

/// Lifecycle of a job.
///
/// `Idle → Queued → Running → Complete → Idle`. `Panicked` replaces
/// `Complete` when the delegate unwinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum JobStatus {
    /// Ready to be submitted.
    Idle = 0,
    /// Claimed by a batch, waiting in (or for) the ready queue.
    Queued = 1,
    /// A worker is executing the delegate.
    Running = 2,
    /// The delegate returned.
    Complete = 3,
    /// The delegate panicked.
    Panicked = 4,
    /// The caller holds the state through [`Job::with_state`].
    Borrowed = 5,
}

impl JobStatus {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Queued,
            2 => Self::Running,
            3 => Self::Complete,
            5 => Self::Borrowed,
            _ => Self::Panicked,
        }
    }

    /// `true` once the delegate has finished, normally or not.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Complete | Self::Panicked)
    }
}

/// Stable handle of a job inside one [`crate::JobSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId {
    pub(crate) system: u64,
    pub(crate) index: u32,
}

impl JobId {
    /// Slot of the job in its system's arena.
    pub fn index(self) -> u32 {
        self.index
    }
}

/// Anything that can be submitted through [`crate::JobSystem::start_jobs`].
///
/// Lets one batch mix jobs with different scratch-state types.
pub trait JobHandle {
    /// Identity of the job.
    fn job_id(&self) -> JobId;
}

/// Type-erased body run by the workers.
pub(crate) trait Runnable: Send + Sync {
    /// `false` when the state was held elsewhere and the delegate was skipped.
    fn run(&self) -> bool;
}

/// Scratch state plus delegate.
///
/// The status atomic already guarantees a single user at a time, so the
/// mutex is only ever `try_lock`ed and never blocks.
pub(crate) struct JobCell<S> {
    state: Mutex<S>,
    delegate: Box<dyn Fn(&mut S) + Send + Sync>,
}

impl<S> JobCell<S> {
    pub(crate) fn new(state: S, delegate: Box<dyn Fn(&mut S) + Send + Sync>) -> Self {
        Self {
            state: Mutex::new(state),
            delegate,
        }
    }

    /// Runs `f` on the state if no one else holds it. A poisoned lock (left
    /// by a panicking delegate) is recovered.
    fn try_with<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        match self.state.try_lock() {
            Ok(mut guard) => Some(f(&mut guard)),
            Err(TryLockError::Poisoned(poisoned)) => Some(f(&mut poisoned.into_inner())),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

impl<S: Send> Runnable for JobCell<S> {
    fn run(&self) -> bool {
        // Workers only run a job after winning the Queued -> Running swap.
        self.try_with(|state| (self.delegate)(state)).is_some()
    }
}

/// Per-slot bookkeeping kept in the system's job arena.
pub(crate) struct JobEntry {
    pub(crate) status: AtomicU8,
    pub(crate) body: Arc<dyn Runnable>,
}

impl JobEntry {
    pub(crate) fn new(body: Arc<dyn Runnable>) -> Self {
        Self {
            status: AtomicU8::new(JobStatus::Idle as u8),
            body,
        }
    }

    // SeqCst: a worker finishing one job and then reading its siblings must
    // not miss a sibling finished concurrently on another worker.
    pub(crate) fn status(&self) -> JobStatus {
        JobStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, status: JobStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    /// Atomically moves `from -> to`; `false` if the job was not in `from`.
    pub(crate) fn transition(&self, from: JobStatus, to: JobStatus) -> bool {
        self.status
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// A re-runnable delegate bound to its scratch state.
///
/// Created once with [`crate::JobSystem::create_job`] and submitted any
/// number of times. Between runs the caller can reach the state through
/// [`Job::with_state`].
pub struct Job<S> {
    id: JobId,
    cell: Arc<JobCell<S>>,
    shared: Arc<Shared>,
}

impl<S> Job<S> {
    pub(crate) fn new(id: JobId, cell: Arc<JobCell<S>>, shared: Arc<Shared>) -> Self {
        Self { id, cell, shared }
    }

    /// Identity of the job.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> JobStatus {
        self.shared
            .job_entry(self.id.index)
            .map_or(JobStatus::Idle, JobEntry::status)
    }

    /// Gives `f` exclusive access to the scratch state.
    ///
    /// # Errors
    /// [`JobError::JobBusy`] while the job is part of an unfinished batch.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, JobError> {
        let busy = JobError::JobBusy(self.id.index);
        let Some(entry) = self.shared.job_entry(self.id.index) else {
            return Err(busy);
        };
        if !entry.transition(JobStatus::Idle, JobStatus::Borrowed) {
            return Err(busy);
        }
        let _release = BorrowRelease(entry);
        self.cell.try_with(f).ok_or(busy)
    }
}

/// Puts a borrowed job back to idle, also when the closure unwinds.
struct BorrowRelease<'a>(&'a JobEntry);

impl Drop for BorrowRelease<'_> {
    fn drop(&mut self) {
        self.0.set(JobStatus::Idle);
    }
}

impl<S> JobHandle for Job<S> {
    fn job_id(&self) -> JobId {
        self.id
    }
}

impl<S> std::fmt::Debug for Job<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> JobCell<u32> {
        JobCell::new(0, Box::new(|n: &mut u32| *n += 1))
    }

    #[test]
    fn run_reports_whether_the_delegate_ran() {
        let cell = counter();
        assert!(cell.run());
        assert_eq!(cell.try_with(|n| *n), Some(1));
    }

    #[test]
    fn run_while_state_is_held_skips_the_delegate() {
        let cell = counter();
        let nested = cell.try_with(|_| cell.run());
        assert_eq!(nested, Some(false));
        assert_eq!(cell.try_with(|n| *n), Some(0));
    }
}
