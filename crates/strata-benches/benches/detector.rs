// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
// criterion_group!/criterion_main! expand to undocumented functions that cannot
// carry #[allow] (attributes on macro invocations are ignored). Crate-level
// suppress is required for benchmark binaries using Criterion.
#![allow(missing_docs)]
//! Swept collision detection throughput.
//!
//! - `find_collisions/N`: all-pairs pass over N boxes on a grid, every other
//!   box moving toward its neighbour.
//! - `collision_time`: a single converging pair.
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use strata_collide::{CollisionDetector, DetectorConfig};
use strata_geom::{ConvexPolygon, ConvexPolygonPattern, PatternTable, PlacedPolygon};
use strata_math::{FixedPoint, Point, Vector};

fn square() -> ConvexPolygonPattern {
    ConvexPolygonPattern::new(vec![
        Point::from_ints(0, 0),
        Point::from_ints(0, 1),
        Point::from_ints(1, 1),
        Point::from_ints(1, 0),
    ])
    .expect("unit square")
}

/// N boxes on a 16-wide grid with spacing 2; odd boxes slide left by one.
fn grid(n: usize) -> (PatternTable, Vec<ConvexPolygon>, Vec<Vector>) {
    let mut table = PatternTable::new();
    let id = table.insert(square()).expect("room");
    let polygons = (0..n as i64)
        .map(|i| ConvexPolygon::new(id, Vector::from_ints(2 * (i % 16), 2 * (i / 16))))
        .collect();
    let velocities = (0..n)
        .map(|i| if i % 2 == 1 { Vector::from_ints(-1, 0) } else { Vector::ZERO })
        .collect();
    (table, polygons, velocities)
}

fn bench_find_collisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_collisions");
    let step = FixedPoint::from_ratio(1, 16).expect("nonzero");
    for &n in &[16_usize, 64, 128] {
        let (table, polygons, velocities) = grid(n);
        let mut detector = CollisionDetector::new(DetectorConfig {
            max_collisions: n,
            ..DetectorConfig::default()
        });
        group.throughput(Throughput::Elements((n * (n - 1) / 2) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let list = detector
                    .find_collisions(&table, &polygons, &velocities, n, step, true)
                    .expect("sized for n");
                criterion::black_box(list.len())
            });
        });
    }
    group.finish();
}

fn bench_collision_time(c: &mut Criterion) {
    let pattern = square();
    let a = PlacedPolygon::new(&pattern, Vector::ZERO);
    let b = PlacedPolygon::new(&pattern, Vector::from_ints(5, 3));
    let mut detector = CollisionDetector::new(DetectorConfig::default());
    c.bench_function("collision_time", |bench| {
        bench.iter(|| {
            criterion::black_box(detector.collision_time(
                &a,
                Vector::ZERO,
                &b,
                Vector::from_ints(-2, -1),
            ))
        });
    });
}

criterion_group!(benches, bench_find_collisions, bench_collision_time);
criterion_main!(benches);
