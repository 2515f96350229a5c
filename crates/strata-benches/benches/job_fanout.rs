// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
// criterion_group!/criterion_main! expand to undocumented functions that cannot
// carry #[allow] (attributes on macro invocations are ignored). Crate-level
// suppress is required for benchmark binaries using Criterion.
#![allow(missing_docs)]
//! Round-trip cost of one four-job batch: claim a token, enqueue, wake the
//! pool, wait, reset.
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_jobs::{JobHandle, JobSystem, JobsConfig};

fn bench_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("job_fanout");
    group
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(3));
    for &workers in &[1_usize, 2, 4] {
        let system = JobSystem::new(JobsConfig {
            workers,
            job_capacity: 4,
            token_capacity: 1,
        })
        .expect("valid config");
        let jobs: Vec<_> = (0..4)
            .map(|_| {
                system
                    .create_job(0_u64, |n: &mut u64| *n = n.wrapping_add(1))
                    .expect("arena sized for four")
            })
            .collect();
        let batch: Vec<&dyn JobHandle> = jobs.iter().map(|j| j as &dyn JobHandle).collect();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &batch, |b, batch| {
            b.iter(|| system.run(batch).expect("no panics"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fanout);
criterion_main!(benches);
