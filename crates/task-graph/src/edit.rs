//! Adding and removing single dependency edges.

use crate::graph::DependencyGraph;
use crate::{Error, Result, TaskCollection, TaskId};
use chrono::Utc;
use tracing::debug;

impl TaskCollection {
    /// Make `task_id` depend on `dependency_id`.
    ///
    /// The dependency is appended to the end of the task's list. The owning
    /// task's `updated_at` is refreshed; nothing else changes.
    ///
    /// # Errors
    ///
    /// Checked in this order, with the collection left untouched on failure:
    /// - [`Error::NotFound`] if either id does not resolve
    /// - [`Error::SelfDependency`] if the ids are equal
    /// - [`Error::DuplicateEdge`] if the edge already exists
    /// - [`Error::Cycle`] if `dependency_id` already reaches `task_id`; the
    ///   error carries the would-be cycle starting and ending at `task_id`
    pub fn add_dependency(&mut self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
        let slot = self
            .locate(task_id)
            .ok_or_else(|| Error::not_found(task_id))?;
        if !self.contains(dependency_id) {
            return Err(Error::not_found(dependency_id));
        }
        if task_id == dependency_id {
            return Err(Error::SelfDependency {
                id: task_id.clone(),
            });
        }
        if self.dependencies_at(slot).contains(dependency_id) {
            return Err(Error::DuplicateEdge {
                task: task_id.clone(),
                dependency: dependency_id.clone(),
            });
        }

        if let Some(path) = self.would_cycle(task_id, dependency_id) {
            debug!(
                task = %task_id,
                dependency = %dependency_id,
                "Rejected dependency that would create a cycle"
            );
            return Err(Error::Cycle { path });
        }

        self.dependencies_at_mut(slot).push(dependency_id.clone());
        self.touch(slot, Utc::now());
        debug!(task = %task_id, dependency = %dependency_id, "Added dependency");
        Ok(())
    }

    /// Remove one occurrence of `dependency_id` from `task_id`'s list.
    ///
    /// Remaining entries keep their relative order.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if either id does not resolve
    /// - [`Error::EdgeNotFound`] if the edge is not present, including on a
    ///   repeated removal
    pub fn remove_dependency(&mut self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
        let slot = self
            .locate(task_id)
            .ok_or_else(|| Error::not_found(task_id))?;
        if !self.contains(dependency_id) {
            return Err(Error::not_found(dependency_id));
        }

        let position = self
            .dependencies_at(slot)
            .iter()
            .position(|dep| dep == dependency_id)
            .ok_or_else(|| Error::EdgeNotFound {
                task: task_id.clone(),
                dependency: dependency_id.clone(),
            })?;

        self.dependencies_at_mut(slot).remove(position);
        self.touch(slot, Utc::now());
        debug!(task = %task_id, dependency = %dependency_id, "Removed dependency");
        Ok(())
    }

    /// Whether `task_id` transitively depends on `dependency_id`.
    ///
    /// Returns `false` for unknown ids.
    #[must_use]
    pub fn depends_on(&self, task_id: &TaskId, dependency_id: &TaskId) -> bool {
        let graph = DependencyGraph::build(self);
        match (graph.node(task_id), graph.node(dependency_id)) {
            (Some(from), Some(to)) if from != to => graph.path_between(from, to).is_some(),
            _ => false,
        }
    }

    /// The closed path the edge `task_id -> dependency_id` would create, if any.
    fn would_cycle(&self, task_id: &TaskId, dependency_id: &TaskId) -> Option<Vec<TaskId>> {
        let graph = DependencyGraph::build(self);
        let from = graph.node(dependency_id)?;
        let to = graph.node(task_id)?;
        let back = graph.path_between(from, to)?;

        let mut path = Vec::with_capacity(back.len() + 1);
        path.push(task_id.clone());
        path.extend(graph.ids(&back));
        Some(path)
    }
}
