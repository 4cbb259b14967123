//! Property-based tests for dependency graph invariants.
//!
//! These tests verify the behavioral contracts of the graph manager:
//! - Successful edge insertions never produce a cycle
//! - Rejected insertions leave the collection untouched
//! - Repair restores every invariant and is idempotent
//! - Execution order respects all dependencies

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use std::collections::HashMap;
use tasklane_graph::{Error, Task, TaskCollection, TaskId};

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Generate an acyclic collection of `1..=max_tasks` tasks.
///
/// The strategy ensures no cycles by only allowing dependencies on tasks
/// with lower ids.
fn dag_strategy(max_tasks: u64) -> impl Strategy<Value = Vec<(u64, Vec<u64>)>> {
    (1..=max_tasks).prop_flat_map(|task_count| {
        let dep_strategies: Vec<_> = (1..=task_count)
            .map(|n| {
                if n == 1 {
                    Just(vec![]).boxed()
                } else {
                    proptest::collection::btree_set(1..n, 0..=(n - 1).min(3) as usize)
                        .prop_map(|deps| deps.into_iter().collect())
                        .boxed()
                }
            })
            .collect();

        dep_strategies.prop_map(|all_deps| {
            all_deps
                .into_iter()
                .enumerate()
                .map(|(i, deps)| (i as u64 + 1, deps))
                .collect()
        })
    })
}

/// Generate an arbitrary, possibly corrupted collection: cycles, self-loops,
/// duplicates and references to ids that do not exist (ids above the task
/// count).
fn corrupted_strategy(max_tasks: u64) -> impl Strategy<Value = Vec<(u64, Vec<u64>)>> {
    (1..=max_tasks).prop_flat_map(move |task_count| {
        proptest::collection::vec(
            proptest::collection::vec(1..=task_count + 2, 0..4),
            task_count as usize,
        )
        .prop_map(|all_deps| {
            all_deps
                .into_iter()
                .enumerate()
                .map(|(i, deps)| (i as u64 + 1, deps))
                .collect()
        })
    })
}

/// A sequence of candidate edges over ids `1..=max`.
fn edge_sequence(max: u64) -> impl Strategy<Value = Vec<(u64, u64)>> {
    proptest::collection::vec((1..=max, 1..=max), 0..40)
}

// =============================================================================
// Helper Functions
// =============================================================================

fn build(layout: &[(u64, Vec<u64>)]) -> TaskCollection {
    TaskCollection::new(
        layout
            .iter()
            .map(|(n, deps)| {
                Task::new(TaskId::from(*n), format!("task {n}"))
                    .with_dependencies(deps.iter().map(|d| TaskId::from(*d)))
            })
            .collect(),
    )
    .expect("generated ids are unique")
}

fn without_timestamps(collection: &TaskCollection) -> Vec<Task> {
    collection
        .tasks()
        .iter()
        .cloned()
        .map(|mut task| {
            task.updated_at = None;
            task
        })
        .collect()
}

// =============================================================================
// Property Tests: Edge insertion
// =============================================================================

proptest! {
    /// Contract: Any sequence of successful insertions keeps the graph acyclic.
    #[test]
    fn successful_additions_never_create_cycles(
        task_count in 1..12_u64,
        edges in edge_sequence(12),
    ) {
        let mut tasks = build(&(1..=task_count).map(|n| (n, vec![])).collect::<Vec<_>>());

        for (from, to) in edges {
            let _ = tasks.add_dependency(&TaskId::from(from), &TaskId::from(to));
        }

        let report = tasks.validate_dependencies();
        prop_assert!(report.is_clean(), "Report should be clean: {:?}", report);
    }

    /// Contract: A rejected insertion leaves the collection unchanged, and a
    /// cycle rejection happens exactly when the dependency already reaches
    /// the task.
    #[test]
    fn rejected_additions_do_not_mutate(
        layout in dag_strategy(10),
        from in 1..12_u64,
        to in 1..12_u64,
    ) {
        let mut tasks = build(&layout);
        let before = tasks.clone();
        let (from, to) = (TaskId::from(from), TaskId::from(to));
        let reaches = tasks.depends_on(&to, &from);

        match tasks.add_dependency(&from, &to) {
            Ok(()) => {
                prop_assert!(!reaches);
                prop_assert!(tasks.validate_dependencies().is_clean());
            }
            Err(err) => {
                prop_assert_eq!(&tasks, &before);
                if let Error::Cycle { path } = &err {
                    prop_assert!(reaches);
                    prop_assert_eq!(path.first(), Some(&from));
                    prop_assert_eq!(path.last(), Some(&from));
                    prop_assert_eq!(path.get(1), Some(&to));
                }
            }
        }
    }

    /// Contract: Adding then removing the same edge restores the collection,
    /// apart from modification timestamps.
    #[test]
    fn add_then_remove_round_trips(
        layout in dag_strategy(10),
        from in 1..=10_u64,
        to in 1..=10_u64,
    ) {
        let original = build(&layout);
        let mut tasks = original.clone();
        let (from, to) = (TaskId::from(from), TaskId::from(to));

        if tasks.add_dependency(&from, &to).is_ok() {
            tasks.remove_dependency(&from, &to).expect("edge was just added");
            prop_assert_eq!(without_timestamps(&tasks), without_timestamps(&original));
        }
    }
}

// =============================================================================
// Property Tests: Validation and repair
// =============================================================================

proptest! {
    /// Contract: Generated DAGs validate clean.
    #[test]
    fn dags_validate_clean(layout in dag_strategy(15)) {
        prop_assert!(build(&layout).validate_dependencies().is_clean());
    }

    /// Contract: After repair every invariant holds.
    #[test]
    fn repair_restores_invariants(layout in corrupted_strategy(12)) {
        let mut tasks = build(&layout);
        tasks.fix_dependencies().expect("repair converges");

        let report = tasks.validate_dependencies();
        prop_assert!(report.is_clean(), "Report should be clean: {:?}", report);

        for node in tasks.nodes() {
            for dep in node.dependencies {
                prop_assert!(tasks.contains(dep), "Dangling {} on {}", dep, node.id);
            }
        }
    }

    /// Contract: fix(fix(G)) == fix(G).
    #[test]
    fn repair_is_idempotent(layout in corrupted_strategy(12)) {
        let mut tasks = build(&layout);
        tasks.fix_dependencies().expect("first repair converges");
        let once = tasks.clone();

        let log = tasks.fix_dependencies().expect("second repair converges");
        prop_assert!(log.is_empty());
        prop_assert_eq!(tasks, once);
    }

    /// Contract: Repair is deterministic for the same input.
    #[test]
    fn repair_is_deterministic(layout in corrupted_strategy(10)) {
        let mut first = build(&layout);
        let mut second = build(&layout);

        let log1 = first.fix_dependencies().expect("repair converges");
        let log2 = second.fix_dependencies().expect("repair converges");

        prop_assert_eq!(log1, log2);
        prop_assert_eq!(without_timestamps(&first), without_timestamps(&second));
    }

    /// Contract: Repair only removes edges, never adds or reorders them.
    #[test]
    fn repair_only_removes(layout in corrupted_strategy(10)) {
        let before = build(&layout);
        let mut after = before.clone();
        let log = after.fix_dependencies().expect("repair converges");

        let mut removed_total = 0;
        for (old, new) in before.nodes().zip(after.nodes()) {
            let mut remaining = new.dependencies.iter().peekable();
            for dep in old.dependencies {
                if remaining.peek() == Some(&dep) {
                    remaining.next();
                } else {
                    removed_total += 1;
                }
            }
            prop_assert!(remaining.next().is_none(), "{} gained dependencies", new.id);
        }
        prop_assert_eq!(removed_total, log.removed.len());
    }
}

// =============================================================================
// Property Tests: Ordering
// =============================================================================

proptest! {
    /// Contract: Execution order respects all dependencies and includes every
    /// node.
    #[test]
    fn execution_order_respects_dependencies(layout in dag_strategy(15)) {
        let tasks = build(&layout);
        let order = tasks.execution_order().expect("DAG sorts");
        prop_assert_eq!(order.len(), layout.len());

        let position: HashMap<&TaskId, usize> =
            order.iter().enumerate().map(|(i, id)| (id, i)).collect();

        for node in tasks.nodes() {
            for dep in node.dependencies {
                prop_assert!(
                    position[dep] < position[&node.id],
                    "Dependency '{}' should come before '{}'",
                    dep,
                    node.id
                );
            }
        }
    }

    /// Contract: Nodes in the same execution level are independent.
    #[test]
    fn execution_levels_have_no_internal_dependencies(layout in dag_strategy(15)) {
        let tasks = build(&layout);
        let levels = tasks.execution_levels().expect("DAG levels");

        let mut level_of: HashMap<TaskId, usize> = HashMap::new();
        for (index, level) in levels.iter().enumerate() {
            for id in level {
                prop_assert!(level_of.insert(id.clone(), index).is_none());
            }
        }

        for node in tasks.nodes() {
            for dep in node.dependencies {
                prop_assert!(level_of[dep] < level_of[&node.id]);
            }
        }
    }
}
