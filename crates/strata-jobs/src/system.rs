// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The worker pool and its shared arenas.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, trace, warn};

use crate::config::JobsConfig;
use crate::error::JobError;
use crate::job::{Job, JobCell, JobEntry, JobHandle, JobId, JobStatus, Runnable};
use crate::queue::JobQueue;
use crate::token::{CompletionToken, TokenSlot, MAX_JOBS_PER_TOKEN};

static NEXT_SYSTEM_ID: AtomicU64 = AtomicU64::new(1);

/// Locks `mutex`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State reachable from every worker, job handle and token.
pub(crate) struct Shared {
    id: u64,
    queue: JobQueue,
    jobs: Box<[OnceLock<JobEntry>]>,
    next_job: AtomicUsize,
    tokens: Box<[TokenSlot]>,
    shutdown: AtomicBool,
    // Park/wake only; never held while a job runs.
    park: Mutex<()>,
    wake: Condvar,
}

impl Shared {
    pub(crate) fn job_entry(&self, index: u32) -> Option<&JobEntry> {
        self.jobs.get(index as usize).and_then(OnceLock::get)
    }

    pub(crate) fn token(&self, slot: usize) -> Option<&TokenSlot> {
        self.tokens.get(slot)
    }

    fn claim_token(&self) -> Option<usize> {
        self.tokens.iter().position(TokenSlot::try_claim)
    }

    fn wake_workers(&self) {
        let _guard = lock(&self.park);
        self.wake.notify_all();
    }

    /// Runs one queued job. Losing the `Queued -> Running` swap means the
    /// job is not ours to run.
    fn execute(&self, index: u32) {
        let Some(entry) = self.job_entry(index) else {
            return;
        };
        if !entry.transition(JobStatus::Queued, JobStatus::Running) {
            return;
        }
        match catch_unwind(AssertUnwindSafe(|| entry.body.run())) {
            Ok(true) => entry.set(JobStatus::Complete),
            Ok(false) => {
                warn!(job = index, "job state was held elsewhere, delegate skipped");
                entry.set(JobStatus::Complete);
            }
            Err(_) => {
                warn!(job = index, "job delegate panicked");
                entry.set(JobStatus::Panicked);
            }
        }
    }

    /// Detaches and signals every in-flight token whose jobs all finished.
    fn signal_finished_tokens(&self) {
        for (slot, token) in self.tokens.iter().enumerate() {
            let Some(snapshot) = token.in_flight_snapshot() else {
                continue;
            };
            let finished = token
                .job_indices()
                .all(|i| self.job_entry(i).is_some_and(|e| e.status().is_finished()));
            if finished && token.try_detach(snapshot) {
                trace!(slot, "completion token signalled");
                token.signal_done();
            }
        }
    }

    pub(crate) fn run_token(&self, slot: usize) -> Result<(), JobError> {
        let Some(token) = self.token(slot) else {
            return Err(JobError::ShutDown);
        };
        if self.shutdown.load(Ordering::Acquire) {
            self.abandon_token(slot);
            return Err(JobError::ShutDown);
        }

        token.publish();
        let mut overflow = None;
        for index in token.job_indices() {
            if let Err(rejected) = self.queue.push(index) {
                warn!(job = rejected, capacity = self.queue.capacity(), "job queue full");
                // Nobody will run it; finish it here so the token can settle.
                if let Some(entry) = self.job_entry(rejected) {
                    entry.set(JobStatus::Complete);
                }
                overflow.get_or_insert(JobError::QueueFull {
                    capacity: self.queue.capacity(),
                });
            }
        }
        self.wake_workers();
        // Covers batches whose jobs were all rejected above.
        self.signal_finished_tokens();
        token.wait_done();

        let mut result = Ok(());
        for index in token.job_indices() {
            if let Some(entry) = self.job_entry(index) {
                if entry.status() == JobStatus::Panicked && result.is_ok() {
                    result = Err(JobError::JobPanicked(index));
                }
                entry.set(JobStatus::Idle);
            }
        }
        token.release();
        trace!(slot, "completion token returned to pool");
        match overflow {
            Some(err) => Err(err),
            None => result,
        }
    }

    pub(crate) fn abandon_token(&self, slot: usize) {
        let Some(token) = self.token(slot) else {
            return;
        };
        for index in token.job_indices() {
            if let Some(entry) = self.job_entry(index) {
                entry.set(JobStatus::Idle);
            }
        }
        token.release();
    }
}

fn worker_loop(shared: &Shared, worker: usize) {
    trace!(worker, "worker started");
    loop {
        if let Some(index) = shared.queue.pop() {
            shared.execute(index);
            shared.signal_finished_tokens();
            continue;
        }
        let guard = lock(&shared.park);
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }
        if shared.queue.is_empty() {
            let _guard = shared.wake.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }
    trace!(worker, "worker stopped");
}

/// Fixed pool of worker threads running reusable jobs.
///
/// Every arena (jobs, tokens, ready queue) is sized once from
/// [`JobsConfig`]; running out of any of them is an error, never a spin.
pub struct JobSystem {
    shared: Arc<Shared>,
    config: JobsConfig,
    workers: Vec<JoinHandle<()>>,
}

impl JobSystem {
    /// Allocates the arenas and spawns the workers.
    ///
    /// # Errors
    /// [`JobError::InvalidConfig`] for zero sizes, [`JobError::Spawn`] when
    /// the OS refuses a thread (workers already started are joined).
    pub fn new(config: JobsConfig) -> Result<Arc<Self>, JobError> {
        config.validate()?;
        let shared = Arc::new(Shared {
            id: NEXT_SYSTEM_ID.fetch_add(1, Ordering::Relaxed),
            queue: JobQueue::with_capacity(config.job_capacity),
            jobs: (0..config.job_capacity).map(|_| OnceLock::new()).collect(),
            next_job: AtomicUsize::new(0),
            tokens: (0..config.token_capacity).map(|_| TokenSlot::new()).collect(),
            shutdown: AtomicBool::new(false),
            park: Mutex::new(()),
            wake: Condvar::new(),
        });
        let mut system = Self {
            shared,
            config,
            workers: Vec::with_capacity(config.workers),
        };
        for worker in 0..config.workers {
            let shared = Arc::clone(&system.shared);
            let handle = thread::Builder::new()
                .name(format!("strata-job-{worker}"))
                .spawn(move || worker_loop(&shared, worker))?;
            system.workers.push(handle);
        }
        info!(
            workers = config.workers,
            job_capacity = config.job_capacity,
            token_capacity = config.token_capacity,
            "job system started"
        );
        Ok(Arc::new(system))
    }

    /// The sizes this system was built with.
    pub fn config(&self) -> &JobsConfig {
        &self.config
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Registers a delegate and the scratch state it will mutate.
    ///
    /// The job lives in the system's arena for the system's lifetime.
    ///
    /// # Errors
    /// [`JobError::JobArenaFull`] once `job_capacity` jobs exist.
    pub fn create_job<S, F>(&self, state: S, delegate: F) -> Result<Job<S>, JobError>
    where
        S: Send + 'static,
        F: Fn(&mut S) + Send + Sync + 'static,
    {
        let capacity = self.shared.jobs.len();
        let full = || JobError::JobArenaFull { capacity };
        let index = self
            .shared
            .next_job
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < capacity).then_some(n + 1)
            })
            .map_err(|_| full())?;
        let cell = Arc::new(JobCell::new(state, Box::new(delegate)));
        let body: Arc<dyn Runnable> = Arc::clone(&cell) as Arc<dyn Runnable>;
        self.shared.jobs[index]
            .set(JobEntry::new(body))
            .map_err(|_| full())?;
        let index = u32::try_from(index).map_err(|_| full())?;
        debug!(job = index, "job created");
        let id = JobId {
            system: self.shared.id,
            index,
        };
        Ok(Job::new(id, cell, Arc::clone(&self.shared)))
    }

    /// Claims a completion token for a batch of idle jobs.
    ///
    /// The jobs are marked queued immediately and run once the token is
    /// waited on. On error no job changes state.
    ///
    /// # Errors
    /// [`JobError::EmptyBatch`], [`JobError::BatchTooLarge`],
    /// [`JobError::ForeignJob`], [`JobError::JobBusy`] (also for a job listed
    /// twice) or [`JobError::TokenPoolExhausted`].
    pub fn start_jobs(&self, jobs: &[&dyn JobHandle]) -> Result<CompletionToken, JobError> {
        if jobs.is_empty() {
            return Err(JobError::EmptyBatch);
        }
        if jobs.len() > MAX_JOBS_PER_TOKEN {
            return Err(JobError::BatchTooLarge { len: jobs.len() });
        }

        let mut claimed = [0_u32; MAX_JOBS_PER_TOKEN];
        for (n, handle) in jobs.iter().enumerate() {
            let id = handle.job_id();
            let entry = self
                .shared
                .job_entry(id.index)
                .filter(|_| id.system == self.shared.id);
            let outcome = match entry {
                None => Err(JobError::ForeignJob(id.index)),
                Some(e) if !e.transition(JobStatus::Idle, JobStatus::Queued) => {
                    Err(JobError::JobBusy(id.index))
                }
                Some(_) => Ok(()),
            };
            if let Err(err) = outcome {
                self.rollback(&claimed[..n]);
                return Err(err);
            }
            claimed[n] = id.index;
        }
        let claimed = &claimed[..jobs.len()];

        let Some(slot) = self.shared.claim_token() else {
            self.rollback(claimed);
            warn!(capacity = self.shared.tokens.len(), "completion token pool exhausted");
            return Err(JobError::TokenPoolExhausted {
                capacity: self.shared.tokens.len(),
            });
        };
        if let Some(token) = self.shared.token(slot) {
            token.set_jobs(claimed);
        }
        trace!(slot, jobs = claimed.len(), "completion token claimed");
        Ok(CompletionToken::new(Arc::clone(&self.shared), slot))
    }

    /// Submits a batch and waits for it.
    ///
    /// # Errors
    /// Anything [`JobSystem::start_jobs`] or
    /// [`CompletionToken::wait_for_completion`] reports.
    pub fn run(&self, jobs: &[&dyn JobHandle]) -> Result<(), JobError> {
        self.start_jobs(jobs)?.wait_for_completion()
    }

    fn rollback(&self, claimed: &[u32]) {
        for &index in claimed {
            if let Some(entry) = self.shared.job_entry(index) {
                entry.set(JobStatus::Idle);
            }
        }
    }
}

impl Drop for JobSystem {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.wake_workers();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
        info!("job system stopped");
    }
}

impl std::fmt::Debug for JobSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSystem")
            .field("config", &self.config)
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}
