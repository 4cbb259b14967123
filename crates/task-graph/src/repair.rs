//! Deterministic repair of invalid dependency graphs.

use crate::graph::DependencyGraph;
use crate::model::Slot;
use crate::{Error, Result, TaskCollection, TaskId};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// Why repair removed an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemovalReason {
    /// The dependency id did not resolve.
    Dangling,
    /// The node depended on itself.
    SelfLoop,
    /// The entry repeated an earlier one in the same list.
    Duplicate,
    /// The edge was dropped to break a cycle.
    CycleBreak,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dangling => "dangling",
            Self::SelfLoop => "self-loop",
            Self::Duplicate => "duplicate",
            Self::CycleBreak => "cycle-break",
        };
        f.write_str(s)
    }
}

/// An edge removed by repair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RemovedEdge {
    /// The dependent node.
    pub task: TaskId,
    /// The dependency that was dropped from its list.
    pub dependency: TaskId,
    /// Why it was dropped.
    pub reason: RemovalReason,
}

/// Change log returned by [`TaskCollection::fix_dependencies`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairLog {
    /// Removed edges in the order they were removed.
    pub removed: Vec<RemovedEdge>,
    /// Number of cycle-breaking passes that removed edges.
    pub cycle_passes: usize,
}

impl RepairLog {
    /// Whether repair changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    /// Number of removals with the given reason.
    #[must_use]
    pub fn count(&self, reason: RemovalReason) -> usize {
        self.removed.iter().filter(|edge| edge.reason == reason).count()
    }
}

impl TaskCollection {
    /// Repair the collection so that every dependency invariant holds.
    ///
    /// Applied in a fixed order:
    /// 1. drop dangling references
    /// 2. drop self-loops
    /// 3. drop repeated entries, keeping the first occurrence
    /// 4. break each detected cycle by removing the edge leaving its greatest
    ///    id, then re-detect and repeat until no cycle remains
    ///
    /// Running it on an already repaired collection changes nothing and
    /// returns an empty log. Owning tasks of modified lists get a fresh
    /// `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvableCycle`] if cycles remain after the pass
    /// budget (one more than the larger of node and edge count). The
    /// collection is left unchanged in that case.
    pub fn fix_dependencies(&mut self) -> Result<RepairLog> {
        let mut working = self.clone();
        let log = working.repair()?;

        if !log.is_empty() {
            *self = working;
        }
        debug!(
            removed = log.removed.len(),
            cycle_passes = log.cycle_passes,
            "Repaired dependencies"
        );
        Ok(log)
    }

    fn repair(&mut self) -> Result<RepairLog> {
        let known: HashSet<TaskId> = self.nodes().map(|node| node.id).collect();
        let slots: Vec<(Slot, TaskId)> = self
            .slots()
            .map(|slot| (slot, self.id_at(slot)))
            .collect();

        let mut log = RepairLog::default();
        let mut touched = BTreeSet::new();

        self.prune(&slots, RemovalReason::Dangling, &mut log, &mut touched, |_, dep, _| {
            !known.contains(dep)
        });
        self.prune(&slots, RemovalReason::SelfLoop, &mut log, &mut touched, |id, dep, _| {
            id == dep
        });
        self.prune(&slots, RemovalReason::Duplicate, &mut log, &mut touched, |_, dep, seen| {
            !seen.insert(dep.clone())
        });

        let budget = known.len().max(DependencyGraph::build(self).edge_count()) + 1;
        loop {
            let cycles = DependencyGraph::build(self).cycles();
            if cycles.is_empty() {
                break;
            }
            if log.cycle_passes >= budget {
                warn!(
                    passes = log.cycle_passes,
                    remaining = cycles.len(),
                    "Dependency repair did not converge"
                );
                return Err(Error::UnresolvableCycle {
                    passes: log.cycle_passes,
                    remaining: cycles,
                });
            }
            log.cycle_passes += 1;

            for cycle in &cycles {
                let Some((from, to)) = cycle.breaking_edge() else {
                    continue;
                };
                let Some(slot) = self.locate(from) else {
                    continue;
                };
                let deps = self.dependencies_at_mut(slot);
                // Skip edges an overlapping cycle already removed this pass.
                if let Some(position) = deps.iter().position(|dep| dep == to) {
                    deps.remove(position);
                    touched.insert(slot.task_index());
                    log.removed.push(RemovedEdge {
                        task: from.clone(),
                        dependency: to.clone(),
                        reason: RemovalReason::CycleBreak,
                    });
                }
            }
        }

        let now = Utc::now();
        for index in touched {
            self.touch(Slot::Task(index), now);
        }
        Ok(log)
    }

    /// Remove entries matching `should_remove` from every node's list, logging each.
    ///
    /// `should_remove` receives the node id, the entry and a per-node scratch set.
    fn prune<F>(
        &mut self,
        slots: &[(Slot, TaskId)],
        reason: RemovalReason,
        log: &mut RepairLog,
        touched: &mut BTreeSet<usize>,
        mut should_remove: F,
    ) where
        F: FnMut(&TaskId, &TaskId, &mut HashSet<TaskId>) -> bool,
    {
        for (slot, id) in slots {
            let mut seen = HashSet::new();
            let deps = self.dependencies_at_mut(*slot);
            let before = deps.len();
            deps.retain(|dep| {
                let remove = should_remove(id, dep, &mut seen);
                if remove {
                    log.removed.push(RemovedEdge {
                        task: id.clone(),
                        dependency: dep.clone(),
                        reason,
                    });
                }
                !remove
            });
            if deps.len() != before {
                touched.insert(slot.task_index());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cycle, IdSegment, Subtask, Task};

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn ids(list: &[&str]) -> Vec<TaskId> {
        list.iter().map(|s| id(s)).collect()
    }

    fn collection(layout: &[(&str, &[&str])]) -> TaskCollection {
        TaskCollection::new(
            layout
                .iter()
                .map(|(n, deps)| Task::new(id(n), *n).with_dependencies(ids(deps)))
                .collect(),
        )
        .unwrap()
    }

    fn edge(task: &str, dependency: &str, reason: RemovalReason) -> RemovedEdge {
        RemovedEdge {
            task: id(task),
            dependency: id(dependency),
            reason,
        }
    }

    #[test]
    fn test_fix_breaks_cycle_at_greatest_id() {
        let mut tasks = collection(&[("1", &["2"]), ("2", &["1"])]);
        let log = tasks.fix_dependencies().unwrap();

        assert_eq!(log.removed, vec![edge("2", "1", RemovalReason::CycleBreak)]);
        assert_eq!(log.cycle_passes, 1);
        assert_eq!(tasks.dependencies(&id("1")).unwrap(), ids(&["2"]));
        assert!(tasks.dependencies(&id("2")).unwrap().is_empty());
        assert!(tasks.validate_dependencies().is_clean());
    }

    #[test]
    fn test_fix_removes_dangling_reference() {
        let mut tasks = collection(&[("1", &["9"])]);
        let log = tasks.fix_dependencies().unwrap();

        assert_eq!(log.removed, vec![edge("1", "9", RemovalReason::Dangling)]);
        assert!(tasks.dependencies(&id("1")).unwrap().is_empty());
    }

    #[test]
    fn test_fix_applies_steps_in_order() {
        let mut tasks = collection(&[
            ("1", &["1", "2", "2", "7"]),
            ("2", &["3"]),
            ("3", &["1"]),
        ]);
        let log = tasks.fix_dependencies().unwrap();

        assert_eq!(
            log.removed,
            vec![
                edge("1", "7", RemovalReason::Dangling),
                edge("1", "1", RemovalReason::SelfLoop),
                edge("1", "2", RemovalReason::Duplicate),
                edge("3", "1", RemovalReason::CycleBreak),
            ]
        );
        assert_eq!(log.count(RemovalReason::Duplicate), 1);
        assert_eq!(tasks.dependencies(&id("1")).unwrap(), ids(&["2"]));
        assert!(tasks.validate_dependencies().is_clean());
    }

    #[test]
    fn test_fix_overlapping_cycles() {
        // 1 -> 2 -> 3 -> 1 and 2 -> 3 -> 2 share the edge 2 -> 3.
        let mut tasks = collection(&[("1", &["2"]), ("2", &["3"]), ("3", &["1", "2"])]);
        let log = tasks.fix_dependencies().unwrap();

        assert_eq!(
            log.removed,
            vec![
                edge("3", "1", RemovalReason::CycleBreak),
                edge("3", "2", RemovalReason::CycleBreak),
            ]
        );
        assert!(tasks.validate_dependencies().cycles.is_empty());
    }

    #[test]
    fn test_fix_is_idempotent() {
        let mut tasks = collection(&[("1", &["2", "5"]), ("2", &["1"]), ("3", &["3"])]);
        tasks.fix_dependencies().unwrap();
        let once = tasks.clone();

        let log = tasks.fix_dependencies().unwrap();
        assert!(log.is_empty());
        assert_eq!(tasks, once);
    }

    #[test]
    fn test_fix_valid_collection_is_untouched() {
        let mut tasks = collection(&[("1", &[]), ("2", &["1"])]);
        let before = tasks.clone();
        assert!(tasks.fix_dependencies().unwrap().is_empty());
        assert_eq!(tasks, before);
        assert!(tasks.task(&id("2")).unwrap().updated_at.is_none());
    }

    #[test]
    fn test_fix_touches_owning_task_of_subtask() {
        let mut tasks = TaskCollection::new(vec![
            Task::new(id("1"), "parent")
                .with_subtask(Subtask::new(IdSegment::Num(1), "a").with_dependencies([id("4")])),
            Task::new(id("2"), "other"),
        ])
        .unwrap();

        let log = tasks.fix_dependencies().unwrap();
        assert_eq!(log.removed, vec![edge("1.1", "4", RemovalReason::Dangling)]);
        assert!(tasks.task(&id("1")).unwrap().updated_at.is_some());
        assert!(tasks.task(&id("2")).unwrap().updated_at.is_none());
    }

    #[test]
    fn test_unresolvable_cycle_message() {
        let err = Error::UnresolvableCycle {
            passes: 3,
            remaining: vec![Cycle::new(ids(&["1", "2"]))],
        };
        assert_eq!(
            err.to_string(),
            "Dependency repair did not converge after 3 passes (1 cycles remain)"
        );
    }
}
