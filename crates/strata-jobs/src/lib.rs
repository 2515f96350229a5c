// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! strata-jobs: fixed thread pool for fanning out independent passes.
//!
//! A [`JobSystem`] owns a fixed set of named worker threads, an arena of
//! reusable [`Job`]s, a bounded lock-free ready queue and a pool of
//! [`CompletionToken`]s. The frame loop claims a token for up to
//! [`MAX_JOBS_PER_TOKEN`] idle jobs, waits on it, and gets the jobs back idle:
//!
//! ```
//! use strata_jobs::{JobHandle, JobSystem, JobsConfig};
//!
//! let system = JobSystem::new(JobsConfig::default())?;
//! let job = system.create_job(0_u32, |n| *n += 1)?;
//! system.start_jobs(&[&job as &dyn JobHandle])?.wait_for_completion()?;
//! assert_eq!(job.with_state(|n| *n)?, 1);
//! # Ok::<(), strata_jobs::JobError>(())
//! ```
//!
//! Submitting and waiting never allocate, and every pool reports
//! exhaustion as a [`JobError`] instead of spinning.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod config;
mod error;
mod job;
mod queue;
mod system;
mod token;

pub use config::JobsConfig;
pub use error::JobError;
pub use job::{Job, JobHandle, JobId, JobStatus};
pub use system::JobSystem;
pub use token::{CompletionToken, MAX_JOBS_PER_TOKEN};
