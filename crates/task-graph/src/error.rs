//! Error types for dependency graph operations.

use crate::{Cycle, TaskId};
use miette::Diagnostic;
use thiserror::Error;

/// Result type for dependency graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the dependency graph operations.
///
/// Every operation that returns one of these leaves the collection exactly as
/// it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum Error {
    /// A referenced task or subtask does not exist.
    #[error("Task '{id}' does not exist")]
    #[diagnostic(
        code(tasklane::graph::not_found),
        help("Subtasks are addressed as '<task>.<subtask>', e.g. '3.1'")
    )]
    NotFound {
        /// The identifier that could not be resolved.
        id: TaskId,
    },

    /// The operation would make a node depend on itself.
    #[error("Task '{id}' cannot depend on itself")]
    #[diagnostic(code(tasklane::graph::self_dependency))]
    SelfDependency {
        /// The node that would depend on itself.
        id: TaskId,
    },

    /// The edge is already present.
    #[error("Task '{task}' already depends on '{dependency}'")]
    #[diagnostic(code(tasklane::graph::duplicate_edge))]
    DuplicateEdge {
        /// The dependent node.
        task: TaskId,
        /// The existing dependency.
        dependency: TaskId,
    },

    /// The edge targeted for removal does not exist.
    #[error("Task '{task}' does not depend on '{dependency}'")]
    #[diagnostic(code(tasklane::graph::edge_not_found))]
    EdgeNotFound {
        /// The dependent node.
        task: TaskId,
        /// The dependency that is not in the list.
        dependency: TaskId,
    },

    /// A dependency cycle exists or would be created.
    #[error("Dependency cycle detected: {}", render_path(path))]
    #[diagnostic(
        code(tasklane::graph::cycle),
        help("Run 'tasklane fix-dependencies' to break existing cycles")
    )]
    Cycle {
        /// The closed path, starting and ending at the same node.
        path: Vec<TaskId>,
    },

    /// Repair did not converge within its pass budget.
    #[error(
        "Dependency repair did not converge after {passes} passes ({} cycles remain)",
        remaining.len()
    )]
    #[diagnostic(code(tasklane::graph::unresolvable_cycle))]
    UnresolvableCycle {
        /// Number of cycle-breaking passes that were run.
        passes: usize,
        /// Cycles still present when the budget ran out.
        remaining: Vec<Cycle>,
    },
}

impl Error {
    /// Create a not-found error.
    #[must_use]
    pub fn not_found(id: &TaskId) -> Self {
        Self::NotFound { id: id.clone() }
    }
}

fn render_path(path: &[TaskId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors raised while assembling a [`TaskCollection`](crate::TaskCollection).
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CollectionError {
    /// Two nodes share the same qualified identifier.
    #[error("Duplicate task id '{id}'")]
    #[diagnostic(
        code(tasklane::collection::duplicate_id),
        help("Task ids, and subtask ids within a task, must be unique")
    )]
    DuplicateId {
        /// The repeated identifier.
        id: TaskId,
    },

    /// A top-level task uses a dotted identifier reserved for subtasks.
    #[error("Top-level task id '{id}' must not contain '.'")]
    #[diagnostic(code(tasklane::collection::nested_id))]
    NestedTopLevelId {
        /// The offending identifier.
        id: TaskId,
    },
}

/// Errors raised when parsing a textual task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum IdParseError {
    /// The input was empty.
    #[error("Task id must not be empty")]
    #[diagnostic(code(tasklane::id::empty))]
    Empty,

    /// A dot-separated segment was empty (e.g. `"3."`).
    #[error("Task id '{input}' contains an empty segment")]
    #[diagnostic(code(tasklane::id::empty_segment))]
    EmptySegment {
        /// The rejected input.
        input: String,
    },

    /// A segment contained a character outside `[A-Za-z0-9_-]`.
    #[error("Task id '{input}' contains invalid character '{found}'")]
    #[diagnostic(
        code(tasklane::id::invalid_character),
        help("Ids may contain letters, digits, '-' and '_', with '.' separating subtasks")
    )]
    InvalidCharacter {
        /// The rejected input.
        input: String,
        /// The first invalid character.
        found: char,
    },

    /// A numeric segment does not fit in 64 bits.
    #[error("Task id '{input}' is out of range")]
    #[diagnostic(code(tasklane::id::out_of_range))]
    OutOfRange {
        /// The rejected input.
        input: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_renders_path() {
        let err = Error::Cycle {
            path: ["1", "3", "2", "1"].iter().map(|s| s.parse().unwrap()).collect(),
        };
        assert_eq!(
            err.to_string(),
            "Dependency cycle detected: 1 -> 3 -> 2 -> 1"
        );
    }

    #[test]
    fn test_not_found_message() {
        let id: TaskId = "4.2".parse().unwrap();
        assert_eq!(
            Error::not_found(&id).to_string(),
            "Task '4.2' does not exist"
        );
    }
}
