//! Ordering and reachability queries over the dependency graph.
//!
//! These are read-only and ignore dangling references and self-loops, which
//! validation reports separately.

use crate::graph::DependencyGraph;
use crate::{Error, Node, Result, TaskCollection, TaskId, TaskStatus};
use petgraph::algo::toposort;
use std::collections::{BTreeSet, HashMap};

/// Node ids ordered so that every dependency precedes its dependents.
pub type ExecutionOrder = Vec<TaskId>;

/// Groups of node ids with no dependencies between members.
///
/// All nodes in group N depend only on nodes in groups before N.
pub type ExecutionLevels = Vec<Vec<TaskId>>;

impl TaskCollection {
    /// Topologically sort the nodes, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cycle`] with one offending cycle if the graph is
    /// cyclic.
    pub fn execution_order(&self) -> Result<ExecutionOrder> {
        let graph = DependencyGraph::build(self);

        // Edges point dependent -> dependency, so petgraph yields dependents
        // first; reverse it.
        match toposort(graph.inner(), None) {
            Ok(mut sorted) => {
                sorted.reverse();
                Ok(graph.ids(&sorted))
            }
            Err(_) => {
                let path = graph
                    .cycles()
                    .first()
                    .map(crate::Cycle::closed_path)
                    .unwrap_or_default();
                Err(Error::Cycle { path })
            }
        }
    }

    /// Group nodes by dependency depth.
    ///
    /// Nodes without resolvable dependencies form level 0; every other node
    /// sits one level after its deepest dependency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cycle`] if the graph is cyclic.
    pub fn execution_levels(&self) -> Result<ExecutionLevels> {
        let sorted = self.execution_order()?;
        let mut levels: ExecutionLevels = Vec::new();
        let mut level_of: HashMap<TaskId, usize> = HashMap::new();

        for id in sorted {
            let level = self
                .dependencies(&id)
                .unwrap_or_default()
                .iter()
                .filter(|dep| **dep != id)
                .filter_map(|dep| level_of.get(dep))
                .map(|level| level + 1)
                .max()
                .unwrap_or(0);

            if level >= levels.len() {
                levels.resize(level + 1, Vec::new());
            }
            levels[level].push(id.clone());
            level_of.insert(id, level);
        }

        Ok(levels)
    }

    /// Every node `id` depends on, directly or transitively, in id order.
    ///
    /// `id` itself is included only when it lies on a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` does not resolve.
    pub fn transitive_dependencies(&self, id: &TaskId) -> Result<Vec<TaskId>> {
        let graph = DependencyGraph::build(self);
        let start = graph.node(id).ok_or_else(|| Error::not_found(id))?;

        let mut reached = BTreeSet::new();
        let mut frontier: Vec<_> = graph.successors(start).to_vec();
        while let Some(current) = frontier.pop() {
            if reached.insert(graph.id(current).clone()) {
                frontier.extend_from_slice(graph.successors(current));
            }
        }

        Ok(reached.into_iter().collect())
    }

    /// Nodes that list `id` as a direct dependency, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` does not resolve.
    pub fn dependents(&self, id: &TaskId) -> Result<Vec<TaskId>> {
        let graph = DependencyGraph::build(self);
        let target = graph.node(id).ok_or_else(|| Error::not_found(id))?;

        let found: BTreeSet<TaskId> = graph
            .predecessors(target)
            .map(|ix| graph.id(ix).clone())
            .collect();
        Ok(found.into_iter().collect())
    }

    /// The next node to work on.
    ///
    /// Candidates are pending or in-progress nodes whose dependencies all
    /// resolve to `done` nodes. Subtasks of a done or cancelled task are
    /// skipped. Among candidates the highest priority wins, then the fewest
    /// dependencies, then the smallest id.
    #[must_use]
    pub fn next_task(&self) -> Option<Node<'_>> {
        let status: HashMap<TaskId, TaskStatus> =
            self.nodes().map(|node| (node.id, node.status)).collect();

        self.nodes()
            .filter(|node| node.status.is_actionable())
            .filter(|node| node.parent.is_none_or(|parent| !parent.status.is_closed()))
            .filter(|node| {
                node.dependencies
                    .iter()
                    .all(|dep| status.get(dep) == Some(&TaskStatus::Done))
            })
            .min_by(|a, b| {
                a.priority
                    .rank()
                    .cmp(&b.priority.rank())
                    .then_with(|| a.dependencies.len().cmp(&b.dependencies.len()))
                    .then_with(|| a.id.cmp(&b.id))
            })
    }
}
