// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type for the job system.

use thiserror::Error;

use crate::token::MAX_JOBS_PER_TOKEN;

/// Failures reported by [`crate::JobSystem`].
///
/// Capacity variants mean the pools were sized too small for the workload.
/// They are reported instead of spinning until a slot frees up.
#[derive(Debug, Error)]
pub enum JobError {
    /// A configured capacity or worker count is zero.
    #[error("invalid job system config: {0}")]
    InvalidConfig(&'static str),
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    /// Every job slot in the arena is taken.
    #[error("job arena is full ({capacity} jobs)")]
    JobArenaFull {
        /// Configured arena size.
        capacity: usize,
    },
    /// Every completion token is in use.
    #[error("completion token pool exhausted ({capacity} tokens)")]
    TokenPoolExhausted {
        /// Configured pool size.
        capacity: usize,
    },
    /// A batch with no jobs was submitted.
    #[error("cannot start an empty batch")]
    EmptyBatch,
    /// More jobs were submitted than one token can track.
    #[error("batch of {len} jobs exceeds the per-token limit of {max}", max = MAX_JOBS_PER_TOKEN)]
    BatchTooLarge {
        /// Submitted batch size.
        len: usize,
    },
    /// The job is queued or running (or listed twice in one batch).
    #[error("job {0} is not idle")]
    JobBusy(u32),
    /// The job belongs to a different job system.
    #[error("job {0} belongs to another job system")]
    ForeignJob(u32),
    /// The ready queue had no free slot.
    #[error("job queue is full ({capacity} slots)")]
    QueueFull {
        /// Queue capacity.
        capacity: usize,
    },
    /// A job delegate panicked; the batch still ran to completion.
    #[error("job {0} panicked")]
    JobPanicked(u32),
    /// The system was shut down before the batch could run.
    #[error("job system is shut down")]
    ShutDown,
}
