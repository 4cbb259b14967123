//! Task records and the collection they live in.
//!
//! Records are typed, but fields this crate does not interpret are kept in
//! an opaque map so a load/save cycle never drops data.

use crate::{CollectionError, IdSegment, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Workflow status of a task or subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Waiting for review.
    Review,
    /// Finished.
    Done,
    /// Postponed.
    Deferred,
    /// Abandoned.
    Cancelled,
    /// Blocked on something outside the graph.
    Blocked,
}

impl TaskStatus {
    /// Whether work can start or continue on a node with this status.
    #[must_use]
    pub const fn is_actionable(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Whether the node will see no further work.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Deferred => "deferred",
            Self::Cancelled => "cancelled",
            Self::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Do first.
    High,
    /// Default priority.
    #[default]
    Medium,
    /// Do last.
    Low,
}

impl Priority {
    /// Sort key, lower runs first.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

/// A subtask nested under a [`Task`].
///
/// Its graph identity is the parent id qualified with [`Subtask::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Identifier local to the parent task.
    pub id: IdSegment,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Workflow status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Fully-qualified ids this subtask depends on.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    /// Fields carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Subtask {
    /// Create a pending subtask with no dependencies.
    #[must_use]
    pub fn new(id: IdSegment, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            dependencies: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Builder-style dependency list.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Builder-style status.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

/// A top-level task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique single-segment identifier.
    pub id: TaskId,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Implementation notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// How the work is verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_strategy: Option<String>,
    /// Workflow status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Ids this task depends on, in insertion order.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    /// Nested subtasks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    /// Last time a dependency list in this task changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Create a pending, medium-priority task with no dependencies.
    #[must_use]
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            details: None,
            test_strategy: None,
            status: TaskStatus::default(),
            priority: Priority::default(),
            dependencies: Vec::new(),
            subtasks: Vec::new(),
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Builder-style dependency list.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Builder-style status.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder-style priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builder-style subtask append.
    #[must_use]
    pub fn with_subtask(mut self, subtask: Subtask) -> Self {
        self.subtasks.push(subtask);
        self
    }

    /// Qualified identifier of one of this task's subtasks.
    #[must_use]
    pub fn subtask_id(&self, subtask: &Subtask) -> TaskId {
        self.id.child(subtask.id.clone())
    }
}

/// Position of a node inside a [`TaskCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Task(usize),
    Subtask(usize, usize),
}

impl Slot {
    pub(crate) const fn task_index(self) -> usize {
        match self {
            Self::Task(index) | Self::Subtask(index, _) => index,
        }
    }
}

/// Read-only view of one graph node: a task or a subtask.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    /// Qualified identifier.
    pub id: TaskId,
    /// Title of the task or subtask.
    pub title: &'a str,
    /// Status of the node itself.
    pub status: TaskStatus,
    /// Priority; subtasks inherit their parent's.
    pub priority: Priority,
    /// Outgoing dependency edges in list order.
    pub dependencies: &'a [TaskId],
    /// The owning task when this node is a subtask.
    pub parent: Option<&'a Task>,
}

/// The full set of tasks making up one dependency graph.
///
/// Tasks keep their document order. Node ids are unique across tasks and
/// qualified subtasks; this is checked on construction and deserialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCollection")]
pub struct TaskCollection {
    tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl TryFrom<RawCollection> for TaskCollection {
    type Error = CollectionError;

    fn try_from(raw: RawCollection) -> Result<Self, Self::Error> {
        Self::with_metadata(raw.tasks, raw.metadata)
    }
}

impl TaskCollection {
    /// Build a collection, checking identifier uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError`] if two nodes share an id or a top-level
    /// task uses a dotted id.
    pub fn new(tasks: Vec<Task>) -> Result<Self, CollectionError> {
        Self::with_metadata(tasks, Map::new())
    }

    /// Build a collection with opaque metadata attached.
    ///
    /// # Errors
    ///
    /// See [`TaskCollection::new`].
    pub fn with_metadata(
        tasks: Vec<Task>,
        metadata: Map<String, Value>,
    ) -> Result<Self, CollectionError> {
        let mut seen = HashSet::new();
        for task in &tasks {
            if !task.id.is_top_level() {
                return Err(CollectionError::NestedTopLevelId {
                    id: task.id.clone(),
                });
            }
            if !seen.insert(task.id.clone()) {
                return Err(CollectionError::DuplicateId {
                    id: task.id.clone(),
                });
            }
            for subtask in &task.subtasks {
                let id = task.subtask_id(subtask);
                if !seen.insert(id.clone()) {
                    return Err(CollectionError::DuplicateId { id });
                }
            }
        }
        Ok(Self { tasks, metadata })
    }

    /// All top-level tasks in document order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Consume the collection, returning its tasks.
    #[must_use]
    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    /// Opaque collection metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Look up a top-level task.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        match self.locate(id)? {
            Slot::Task(index) => self.tasks.get(index),
            Slot::Subtask(..) => None,
        }
    }

    /// Look up any node, task or subtask.
    #[must_use]
    pub fn node(&self, id: &TaskId) -> Option<Node<'_>> {
        self.locate(id).map(|slot| self.node_at(slot))
    }

    /// Whether a node with this id exists.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.locate(id).is_some()
    }

    /// Dependency list of any node.
    #[must_use]
    pub fn dependencies(&self, id: &TaskId) -> Option<&[TaskId]> {
        self.locate(id).map(|slot| self.dependencies_at(slot))
    }

    /// Number of graph nodes (tasks plus subtasks).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tasks.iter().map(|task| 1 + task.subtasks.len()).sum()
    }

    /// Whether the collection has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate over every node: each task followed by its subtasks.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        self.slots().map(|slot| self.node_at(slot))
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.tasks.iter().enumerate().flat_map(|(index, task)| {
            std::iter::once(Slot::Task(index))
                .chain((0..task.subtasks.len()).map(move |sub| Slot::Subtask(index, sub)))
        })
    }

    pub(crate) fn locate(&self, id: &TaskId) -> Option<Slot> {
        let root = TaskId::new(id.root().clone());
        let index = self.tasks.iter().position(|task| task.id == root)?;
        match id.depth() {
            1 => Some(Slot::Task(index)),
            2 => self.tasks[index]
                .subtasks
                .iter()
                .position(|sub| &sub.id == id.local())
                .map(|sub| Slot::Subtask(index, sub)),
            _ => None,
        }
    }

    pub(crate) fn id_at(&self, slot: Slot) -> TaskId {
        match slot {
            Slot::Task(index) => self.tasks[index].id.clone(),
            Slot::Subtask(index, sub) => {
                let task = &self.tasks[index];
                task.subtask_id(&task.subtasks[sub])
            }
        }
    }

    pub(crate) fn node_at(&self, slot: Slot) -> Node<'_> {
        match slot {
            Slot::Task(index) => {
                let task = &self.tasks[index];
                Node {
                    id: task.id.clone(),
                    title: &task.title,
                    status: task.status,
                    priority: task.priority,
                    dependencies: &task.dependencies,
                    parent: None,
                }
            }
            Slot::Subtask(index, sub) => {
                let task = &self.tasks[index];
                let subtask = &task.subtasks[sub];
                Node {
                    id: task.subtask_id(subtask),
                    title: &subtask.title,
                    status: subtask.status,
                    priority: task.priority,
                    dependencies: &subtask.dependencies,
                    parent: Some(task),
                }
            }
        }
    }

    pub(crate) fn dependencies_at(&self, slot: Slot) -> &[TaskId] {
        match slot {
            Slot::Task(index) => &self.tasks[index].dependencies,
            Slot::Subtask(index, sub) => &self.tasks[index].subtasks[sub].dependencies,
        }
    }

    pub(crate) fn dependencies_at_mut(&mut self, slot: Slot) -> &mut Vec<TaskId> {
        match slot {
            Slot::Task(index) => &mut self.tasks[index].dependencies,
            Slot::Subtask(index, sub) => &mut self.tasks[index].subtasks[sub].dependencies,
        }
    }

    /// Stamp the owning task of `slot` as modified.
    pub(crate) fn touch(&mut self, slot: Slot, now: DateTime<Utc>) {
        if let Some(task) = self.tasks.get_mut(slot.task_index()) {
            task.updated_at = Some(now);
        }
    }
}
