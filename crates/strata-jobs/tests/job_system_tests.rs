// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata_jobs::{Job, JobError, JobHandle, JobStatus, JobSystem, JobsConfig};

fn system(workers: usize, job_capacity: usize, token_capacity: usize) -> Arc<JobSystem> {
    JobSystem::new(JobsConfig {
        workers,
        job_capacity,
        token_capacity,
    })
    .expect("valid config")
}

fn counters(sys: &JobSystem, n: usize) -> Vec<Job<u32>> {
    (0..n)
        .map(|_| sys.create_job(0_u32, |c| *c += 1).expect("arena has room"))
        .collect()
}

fn handles<S>(jobs: &[Job<S>]) -> Vec<&dyn JobHandle> {
    jobs.iter().map(|j| j as &dyn JobHandle).collect()
}

#[test]
fn four_level_jobs_each_run_once_and_token_is_reusable() {
    let sys = system(4, 8, 1);
    let jobs = counters(&sys, 4);

    let token = sys.start_jobs(&handles(&jobs)).expect("token available");
    assert_eq!(token.job_count(), 4);
    token.wait_for_completion().expect("no panics");
    for job in &jobs {
        assert_eq!(job.status(), JobStatus::Idle);
        assert_eq!(job.with_state(|c| *c).expect("idle"), 1);
    }

    // The single pooled token is back and the same jobs run again.
    sys.run(&handles(&jobs)).expect("token recycled");
    for job in &jobs {
        assert_eq!(job.with_state(|c| *c).expect("idle"), 2);
    }
}

#[test]
fn repeated_frames_never_lose_a_job() {
    let sys = system(3, 4, 2);
    let jobs = counters(&sys, 4);
    let batch = handles(&jobs);
    for _ in 0..200 {
        sys.run(&batch).expect("frame completes");
    }
    for job in &jobs {
        assert_eq!(job.with_state(|c| *c).expect("idle"), 200);
    }
}

#[test]
fn exhausted_token_pool_is_an_error() {
    let sys = system(2, 4, 1);
    let jobs = counters(&sys, 2);
    let first = sys.start_jobs(&[&jobs[0] as &dyn JobHandle]).expect("one token");
    let second = sys.start_jobs(&[&jobs[1] as &dyn JobHandle]);
    assert!(matches!(second, Err(JobError::TokenPoolExhausted { capacity: 1 })));
    // The failed claim left job 1 untouched.
    assert_eq!(jobs[1].status(), JobStatus::Idle);

    // Dropping an unwaited token returns it and idles its job.
    drop(first);
    assert_eq!(jobs[0].status(), JobStatus::Idle);
    assert_eq!(jobs[0].with_state(|c| *c).expect("idle"), 0);
    sys.run(&handles(&jobs)).expect("token available again");
}

#[test]
fn job_arena_has_fixed_capacity() {
    let sys = system(1, 2, 1);
    let _jobs = counters(&sys, 2);
    let extra = sys.create_job((), |()| {});
    assert!(matches!(extra, Err(JobError::JobArenaFull { capacity: 2 })));
}

#[test]
fn malformed_batches_are_rejected() {
    let sys = system(2, 16, 2);
    let jobs = counters(&sys, 9);
    assert!(matches!(sys.start_jobs(&[]), Err(JobError::EmptyBatch)));
    assert!(matches!(
        sys.start_jobs(&handles(&jobs)),
        Err(JobError::BatchTooLarge { len: 9 })
    ));
    let twice = [&jobs[0] as &dyn JobHandle, &jobs[0] as &dyn JobHandle];
    assert!(matches!(sys.start_jobs(&twice), Err(JobError::JobBusy(_))));
    assert_eq!(jobs[0].status(), JobStatus::Idle);

    let other = system(1, 1, 1);
    let stranger = other.create_job(0_u32, |c| *c += 1).expect("arena has room");
    assert!(matches!(
        sys.start_jobs(&[&stranger as &dyn JobHandle]),
        Err(JobError::ForeignJob(_))
    ));
}

#[test]
fn queued_job_state_is_not_reachable() {
    let sys = system(1, 1, 1);
    let job = sys.create_job(0_u32, |c| *c += 1).expect("arena has room");
    let token = sys.start_jobs(&[&job as &dyn JobHandle]).expect("token");
    assert_eq!(job.status(), JobStatus::Queued);
    assert!(matches!(job.with_state(|c| *c), Err(JobError::JobBusy(_))));
    token.wait_for_completion().expect("no panics");
    assert_eq!(job.with_state(|c| *c).expect("idle"), 1);
}

#[test]
fn panicking_delegate_is_reported_and_job_stays_usable() {
    let sys = system(2, 4, 1);
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_in_job = Arc::clone(&ran);
    let fine = sys
        .create_job((), move |()| {
            ran_in_job.fetch_add(1, Ordering::SeqCst);
        })
        .expect("arena has room");
    let boom = sys
        .create_job(true, |explode| {
            if *explode {
                panic!("delegate failure");
            }
        })
        .expect("arena has room");

    let batch = [&fine as &dyn JobHandle, &boom as &dyn JobHandle];
    let result = sys.run(&batch);
    assert!(matches!(result, Err(JobError::JobPanicked(i)) if i == boom.id().index()));
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(boom.status(), JobStatus::Idle);

    boom.with_state(|explode| *explode = false).expect("idle");
    sys.run(&batch).expect("no panic this time");
    assert_eq!(ran.load(Ordering::SeqCst), 2);
}
