//! Validation of collection-wide dependency invariants.
//!
//! A collection is valid when every dependency id resolves to a node, no node
//! lists itself, and the dependency graph has no cycles.

use crate::graph::DependencyGraph;
use crate::{Cycle, TaskCollection, TaskId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// A dependency id that does not resolve to any node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DanglingReference {
    /// The node holding the reference.
    pub task: TaskId,
    /// The unresolved id.
    pub missing: TaskId,
}

/// A repeated entry in a dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DuplicateReference {
    /// The node holding the list.
    pub task: TaskId,
    /// The id listed more than once.
    pub dependency: TaskId,
}

/// Findings of [`TaskCollection::validate_dependencies`].
///
/// An empty report means the collection is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// References to ids that do not exist, once per node and id.
    pub dangling: Vec<DanglingReference>,
    /// Nodes that list themselves as a dependency.
    pub self_loops: Vec<TaskId>,
    /// Extra occurrences of an id already in the same list.
    pub duplicates: Vec<DuplicateReference>,
    /// Dependency cycles, excluding self-loops.
    pub cycles: Vec<Cycle>,
    /// Every node on at least one cycle, in collection order.
    ///
    /// A superset of the nodes in `cycles`: one depth-first pass reports a
    /// single cycle per back edge, so nodes on overlapping cycles may appear
    /// only here.
    pub cycle_nodes: Vec<TaskId>,
}

impl ValidationReport {
    /// Whether the report has no findings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }

    /// Whether the graph invariants hold.
    ///
    /// Duplicate entries are redundant rather than invalid, so they do not
    /// count against validity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.dangling.is_empty() && self.self_loops.is_empty() && self.cycles.is_empty()
    }

    /// Total number of findings.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.dangling.len() + self.self_loops.len() + self.duplicates.len() + self.cycles.len()
    }

    /// The state this report puts the collection in.
    #[must_use]
    pub fn state(&self) -> CollectionState {
        if self.is_valid() {
            CollectionState::Valid
        } else {
            CollectionState::Invalid
        }
    }
}

/// Validation state of a collection as seen by its caller.
///
/// The graph manager itself keeps no state; callers hold one of these next
/// to a collection they loaded and update it from reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionState {
    /// Not validated since it was loaded or last changed externally.
    #[default]
    Unknown,
    /// All invariants hold.
    Valid,
    /// At least one invariant is violated.
    Invalid,
}

impl From<&ValidationReport> for CollectionState {
    fn from(report: &ValidationReport) -> Self {
        report.state()
    }
}

impl fmt::Display for CollectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

impl TaskCollection {
    /// Scan the collection for dangling references, self-loops, redundant
    /// duplicates and cycles.
    ///
    /// Read-only. Nodes are scanned in collection order (each task, then its
    /// subtasks) and findings are listed in that order.
    #[must_use]
    pub fn validate_dependencies(&self) -> ValidationReport {
        let graph = DependencyGraph::build(self);
        let mut report = ValidationReport::default();

        for node in self.nodes() {
            let mut seen = HashSet::new();
            let mut self_loop = false;

            for dep in node.dependencies {
                if dep == &node.id {
                    if !self_loop {
                        report.self_loops.push(node.id.clone());
                        self_loop = true;
                    }
                    continue;
                }

                let first = seen.insert(dep);
                if graph.node(dep).is_none() {
                    if first {
                        report.dangling.push(DanglingReference {
                            task: node.id.clone(),
                            missing: dep.clone(),
                        });
                    }
                } else if !first {
                    report.duplicates.push(DuplicateReference {
                        task: node.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        report.cycles = graph.cycles();
        report.cycle_nodes = graph.ids(&graph.cyclic_nodes());

        debug!(
            nodes = graph.node_count(),
            dangling = report.dangling.len(),
            self_loops = report.self_loops.len(),
            duplicates = report.duplicates.len(),
            cycles = report.cycles.len(),
            cycle_nodes = report.cycle_nodes.len(),
            "Validated dependencies"
        );

        report
    }
}
