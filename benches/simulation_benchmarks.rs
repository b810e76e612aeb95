//! Simulation benchmarks with 95% confidence intervals.
//!
//! Reproducible performance measurements for the stepping driver, the
//! batch executor, and the rasterizer.
//!
//! Run with: cargo criterion
//! JSON output: cargo criterion --message-format json

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use goalsim::batch::BatchExecutor;
use goalsim::prelude::*;
use goalsim::render::{featurize_scene, render_scene};
use goalsim::scene::task::SpatialRelationship;
use goalsim::scene::{build_box, build_circle, Scene};

fn falling_ball_task(ball_x: f32) -> Task {
    let mut scene = Scene::new(256, 256);
    scene.bodies.push(build_box(0.0, 0.0, 200.0, 6.0, 0.0, false));
    scene.bodies.push(build_circle(ball_x, 120.0, 4.0, true));
    Task {
        scene,
        body_id1: 1,
        body_id2: 0,
        relationships: vec![SpatialRelationship::TouchingBriefly],
        phantom_shape: None,
        tier: String::new(),
    }
}

/// Stepping driver throughput at several step budgets.
fn bench_simulate_task(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate_task");
    group.sample_size(50);
    group.confidence_level(0.95);

    let task = falling_ball_task(100.0);
    for steps in [60usize, 240, 600].iter() {
        group.bench_with_input(BenchmarkId::new("steps", steps), steps, |b, &steps| {
            b.iter(|| black_box(simulate_task(&task, steps, 1).unwrap()));
        });
    }

    group.finish();
}

/// Batch executor scaling across worker counts.
fn bench_batch_executor(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_executor");
    group.sample_size(20);
    group.confidence_level(0.95);

    let tasks: Vec<Task> = (0..8)
        .map(|i| falling_ball_task(40.0 + 20.0 * i as f32))
        .collect();
    let executor = BatchExecutor::default();

    for workers in [1usize, 2, 4].iter() {
        group.bench_with_input(
            BenchmarkId::new("workers", workers),
            workers,
            |b, &workers| {
                b.iter(|| black_box(executor.run_threaded(&tasks, workers, 120, 1).unwrap()));
            },
        );
    }

    group.finish();
}

/// Rasterization and featurization of a settled scene.
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(100);
    group.confidence_level(0.95);

    let task = falling_ball_task(100.0);
    let scene = &task.scene;

    group.bench_function("render_scene", |b| {
        b.iter(|| black_box(render_scene(scene)));
    });
    group.bench_function("featurize_scene", |b| {
        b.iter(|| black_box(featurize_scene(scene)));
    });

    group.finish();
}

criterion_group!(benches, bench_simulate_task, bench_batch_executor, bench_render);
criterion_main!(benches);
