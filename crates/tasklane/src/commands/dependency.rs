//! `add-dependency` and `remove-dependency`.

use super::{Context, join_ids};
use crate::cli::{CliError, EXIT_OK, render_ok};
use crate::storage;
use serde::Serialize;
use std::fmt;
use tasklane_graph::TaskId;
use tracing::info;

/// Kind of edge edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// The edge was appended.
    Added,
    /// The edge was removed.
    Removed,
}

/// Result of an edge edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyChange {
    /// What happened.
    pub action: ChangeAction,
    /// The dependent node.
    pub task: TaskId,
    /// The dependency that was added or removed.
    pub dependency: TaskId,
    /// The dependent node's list after the edit.
    pub dependencies: Vec<TaskId>,
}

impl fmt::Display for DependencyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            ChangeAction::Added => {
                writeln!(f, "Task {} now depends on {}", self.task, self.dependency)?;
            }
            ChangeAction::Removed => {
                writeln!(f, "Task {} no longer depends on {}", self.task, self.dependency)?;
            }
        }
        write!(f, "Dependencies of {}: {}", self.task, join_ids(&self.dependencies))
    }
}

/// Add `dependency` to `task`'s list and save.
///
/// # Errors
///
/// Returns an error if the edge is rejected or the file cannot be updated.
pub fn add(ctx: &Context, task: &TaskId, dependency: &TaskId) -> Result<i32, CliError> {
    edit(ctx, task, dependency, ChangeAction::Added)
}

/// Remove `dependency` from `task`'s list and save.
///
/// # Errors
///
/// Returns an error if the edge does not exist or the file cannot be updated.
pub fn remove(ctx: &Context, task: &TaskId, dependency: &TaskId) -> Result<i32, CliError> {
    edit(ctx, task, dependency, ChangeAction::Removed)
}

fn edit(
    ctx: &Context,
    task: &TaskId,
    dependency: &TaskId,
    action: ChangeAction,
) -> Result<i32, CliError> {
    let mut tasks = storage::load(&ctx.tasks_file)?;

    match action {
        ChangeAction::Added => tasks.add_dependency(task, dependency)?,
        ChangeAction::Removed => tasks.remove_dependency(task, dependency)?,
    }
    storage::save(&ctx.tasks_file, &tasks)?;
    info!(%task, %dependency, ?action, "Updated dependency");

    let change = DependencyChange {
        action,
        task: task.clone(),
        dependency: dependency.clone(),
        dependencies: tasks.dependencies(task).unwrap_or_default().to_vec(),
    };
    render_ok(&change, ctx.json)?;
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    #[test]
    fn test_display_added() {
        let change = DependencyChange {
            action: ChangeAction::Added,
            task: id("3"),
            dependency: id("1"),
            dependencies: vec![id("2"), id("1")],
        };
        assert_eq!(
            change.to_string(),
            "Task 3 now depends on 1\nDependencies of 3: 2, 1"
        );
    }

    #[test]
    fn test_json_shape() {
        let change = DependencyChange {
            action: ChangeAction::Removed,
            task: id("1.2"),
            dependency: id("1.1"),
            dependencies: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            serde_json::json!({
                "action": "removed",
                "task": "1.2",
                "dependency": "1.1",
                "dependencies": []
            })
        );
    }
}
