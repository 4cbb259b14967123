//! Benchmarks for dependency graph operations
//!
//! Run with: cargo bench -p tasklane-graph

#![allow(clippy::unwrap_used)]

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tasklane_graph::{Task, TaskCollection, TaskId};

fn task(n: u64, deps: impl IntoIterator<Item = u64>) -> Task {
    Task::new(TaskId::from(n), format!("task {n}"))
        .with_dependencies(deps.into_iter().map(TaskId::from))
}

/// Generate a wide collection with many tasks depending on task 1
fn generate_wide(task_count: u64) -> TaskCollection {
    let mut tasks = vec![task(1, [])];
    tasks.extend((2..=task_count + 1).map(|n| task(n, [1])));
    TaskCollection::new(tasks).unwrap()
}

/// Generate a linear chain where each task depends on the previous one
fn generate_deep(depth: u64) -> TaskCollection {
    let tasks = (1..=depth)
        .map(|n| task(n, (n > 1).then_some(n - 1)))
        .collect();
    TaskCollection::new(tasks).unwrap()
}

/// Generate a diamond (fan-out then fan-in) with `width` tasks per level
fn generate_diamond(width: u64, depth: u64) -> TaskCollection {
    let mut tasks = vec![task(1, [])];
    let mut prev_level = vec![1];
    let mut next_id = 2;

    for _ in 0..depth {
        let current_level: Vec<u64> = (next_id..next_id + width).collect();
        for &n in &current_level {
            tasks.push(task(n, prev_level.clone()));
        }
        next_id += width;
        prev_level = current_level;
    }

    tasks.push(task(next_id, prev_level));
    TaskCollection::new(tasks).unwrap()
}

/// A chain closed into one large cycle, with a dangling reference and a
/// duplicate on every tenth task
fn generate_corrupted(task_count: u64) -> TaskCollection {
    let tasks = (1..=task_count)
        .map(|n| {
            let mut deps = vec![if n == 1 { task_count } else { n - 1 }];
            if n % 10 == 0 {
                deps.push(task_count + n);
                deps.push(deps[0]);
            }
            task(n, deps)
        })
        .collect();
    TaskCollection::new(tasks).unwrap()
}

fn benchmark_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_dependencies");

    for count in [100, 500, 1000] {
        group.bench_with_input(BenchmarkId::new("wide", count), &count, |b, &count| {
            let tasks = generate_wide(count);
            b.iter(|| black_box(tasks.validate_dependencies()));
        });
        group.bench_with_input(BenchmarkId::new("deep", count), &count, |b, &count| {
            let tasks = generate_deep(count);
            b.iter(|| black_box(tasks.validate_dependencies()));
        });
    }

    group.finish();
}

fn benchmark_fix(c: &mut Criterion) {
    let mut group = c.benchmark_group("fix_dependencies");

    for count in [100, 500, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let tasks = generate_corrupted(count);
            b.iter_batched(
                || tasks.clone(),
                |mut tasks| black_box(tasks.fix_dependencies().unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_add_dependency(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_dependency");

    // Worst case for the cycle check: the new edge closes over the whole chain.
    for depth in [100, 1000, 5000] {
        group.bench_with_input(BenchmarkId::new("rejected", depth), &depth, |b, &depth| {
            let mut tasks = generate_deep(depth);
            let (first, last) = (TaskId::from(1_u64), TaskId::from(depth));
            b.iter(|| black_box(tasks.add_dependency(&first, &last).is_err()));
        });
    }

    group.finish();
}

fn benchmark_execution_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution_order");

    for (width, depth) in [(5, 5), (10, 5), (5, 10), (10, 10)] {
        let label = format!("w{width}_d{depth}");
        group.bench_with_input(
            BenchmarkId::from_parameter(&label),
            &(width, depth),
            |b, &(width, depth)| {
                let tasks = generate_diamond(width, depth);
                b.iter(|| black_box(tasks.execution_levels().unwrap()));
            },
        );
    }

    for depth in [100, 1000] {
        group.bench_with_input(BenchmarkId::new("deep", depth), &depth, |b, &depth| {
            let tasks = generate_deep(depth);
            b.iter(|| black_box(tasks.execution_order().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_validate,
    benchmark_fix,
    benchmark_add_dependency,
    benchmark_execution_order,
);

criterion_main!(benches);
