//! Read-only commands: `next`, `order` and `show`.

use super::{Context, join_ids};
use crate::cli::{CliError, EXIT_OK, render_ok};
use crate::storage;
use serde::Serialize;
use std::fmt;
use tasklane_graph::{Node, Priority, TaskCollection, TaskId, TaskStatus};
use tracing::debug;

/// Serializable snapshot of one task or subtask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    /// Qualified identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Status.
    pub status: TaskStatus,
    /// Priority, inherited from the parent for subtasks.
    pub priority: Priority,
    /// Direct dependencies in list order.
    pub dependencies: Vec<TaskId>,
    /// Owning task for subtasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
}

impl From<Node<'_>> for NodeSummary {
    fn from(node: Node<'_>) -> Self {
        Self {
            title: node.title.to_string(),
            status: node.status,
            priority: node.priority,
            dependencies: node.dependencies.to_vec(),
            parent: node.parent.map(|task| task.id.clone()),
            id: node.id,
        }
    }
}

impl fmt::Display for NodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}, {}]",
            self.id, self.title, self.status, self.priority
        )
    }
}

/// Result of `next`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextOutcome {
    /// The chosen node, if any is actionable.
    pub next: Option<NodeSummary>,
}

impl fmt::Display for NextOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.next {
            Some(node) => {
                writeln!(f, "Next task: {node}")?;
                write!(f, "Dependencies: {}", join_ids(&node.dependencies))
            }
            None => write!(f, "No actionable task: everything is done or blocked"),
        }
    }
}

/// Result of `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OrderOutcome {
    /// One flat topological order.
    Order {
        /// Nodes with dependencies first.
        order: Vec<NodeSummary>,
    },
    /// Nodes grouped by dependency depth.
    Levels {
        /// Groups whose members can run in parallel.
        levels: Vec<Vec<NodeSummary>>,
    },
}

impl fmt::Display for OrderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        match self {
            Self::Order { order } => {
                for (position, node) in order.iter().enumerate() {
                    lines.push(format!("{:>3}. {node}", position + 1));
                }
            }
            Self::Levels { levels } => {
                for (level, nodes) in levels.iter().enumerate() {
                    lines.push(format!("Level {level}:"));
                    lines.extend(nodes.iter().map(|node| format!("  {node}")));
                }
            }
        }
        if lines.is_empty() {
            return write!(f, "No tasks");
        }
        f.write_str(&lines.join("\n"))
    }
}

/// Result of `show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowOutcome {
    /// The node itself.
    pub task: NodeSummary,
    /// Everything it depends on, directly or transitively.
    pub transitive_dependencies: Vec<TaskId>,
    /// Nodes that list it as a direct dependency.
    pub dependents: Vec<TaskId>,
}

impl fmt::Display for ShowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.task)?;
        if let Some(parent) = &self.task.parent {
            writeln!(f, "  subtask of: {parent}")?;
        }
        writeln!(f, "  depends on: {}", join_ids(&self.task.dependencies))?;
        writeln!(
            f,
            "  all dependencies: {}",
            join_ids(&self.transitive_dependencies)
        )?;
        write!(f, "  needed by: {}", join_ids(&self.dependents))
    }
}

fn summarize(tasks: &TaskCollection, ids: Vec<TaskId>) -> Vec<NodeSummary> {
    ids.into_iter()
        .filter_map(|id| tasks.node(&id))
        .map(NodeSummary::from)
        .collect()
}

/// Print the next actionable task.
///
/// # Errors
///
/// Returns an error if the tasks file cannot be loaded.
pub fn next(ctx: &Context) -> Result<i32, CliError> {
    let tasks = storage::load(&ctx.tasks_file)?;
    let outcome = NextOutcome {
        next: tasks.next_task().map(NodeSummary::from),
    };
    debug!(next = ?outcome.next.as_ref().map(|node| &node.id), "Selected next task");

    render_ok(&outcome, ctx.json)?;
    Ok(EXIT_OK)
}

/// Print tasks in dependency order, optionally grouped into levels.
///
/// # Errors
///
/// Returns an error if the tasks file cannot be loaded or the graph has a
/// cycle.
pub fn order(ctx: &Context, levels: bool) -> Result<i32, CliError> {
    let tasks = storage::load(&ctx.tasks_file)?;

    let outcome = if levels {
        OrderOutcome::Levels {
            levels: tasks
                .execution_levels()?
                .into_iter()
                .map(|level| summarize(&tasks, level))
                .collect(),
        }
    } else {
        OrderOutcome::Order {
            order: summarize(&tasks, tasks.execution_order()?),
        }
    };

    render_ok(&outcome, ctx.json)?;
    Ok(EXIT_OK)
}

/// Print one task with its dependencies and dependents.
///
/// # Errors
///
/// Returns an error if the tasks file cannot be loaded or `id` does not
/// exist.
pub fn show(ctx: &Context, id: &TaskId) -> Result<i32, CliError> {
    let tasks = storage::load(&ctx.tasks_file)?;
    let node = tasks
        .node(id)
        .ok_or_else(|| tasklane_graph::Error::not_found(id))?;

    let outcome = ShowOutcome {
        task: NodeSummary::from(node),
        transitive_dependencies: tasks.transitive_dependencies(id)?,
        dependents: tasks.dependents(id)?,
    };

    render_ok(&outcome, ctx.json)?;
    Ok(EXIT_OK)
}
