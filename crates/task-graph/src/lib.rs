//! Dependency graph management for tasklane task collections.
//!
//! A [`TaskCollection`] holds tasks and their nested subtasks. Seen as a
//! graph, every task and subtask is a node identified by a [`TaskId`]
//! (`7`, `7.2`) and every entry in a `dependencies` list is an edge from the
//! dependent node to its dependency.
//!
//! The operations keep three invariants:
//!
//! - every dependency id resolves to a node
//! - no node depends on itself
//! - no node depends on itself transitively (the graph is acyclic)
//!
//! All operations are synchronous, perform no I/O and keep no state between
//! calls. Mutating operations are all-or-nothing: on error the collection is
//! unchanged.
//!
//! # Key Types
//!
//! - [`TaskCollection`]: the tasks plus the add/remove/validate/fix operations
//! - [`ValidationReport`]: findings of [`TaskCollection::validate_dependencies`]
//! - [`RepairLog`]: edges removed by [`TaskCollection::fix_dependencies`]
//! - [`Error`]: structured failures, one variant per error kind
//!
//! # Example
//!
//! ```
//! use tasklane_graph::{Error, Task, TaskCollection, TaskId};
//!
//! let id = |s: &str| s.parse::<TaskId>().unwrap();
//! let mut tasks = TaskCollection::new(vec![
//!     Task::new(id("1"), "Set up repository"),
//!     Task::new(id("2"), "Write parser").with_dependencies([id("1")]),
//! ])?;
//!
//! tasks.add_dependency(&id("2"), &id("1")).unwrap_err();
//! assert!(matches!(
//!     tasks.add_dependency(&id("1"), &id("2")),
//!     Err(Error::Cycle { .. })
//! ));
//! assert!(tasks.validate_dependencies().is_clean());
//! # Ok::<(), tasklane_graph::CollectionError>(())
//! ```

mod edit;
mod error;
mod graph;
mod id;
mod model;
mod repair;
mod traversal;
mod validation;

pub use error::{CollectionError, Error, IdParseError, Result};
pub use graph::Cycle;
pub use id::{IdSegment, TaskId};
pub use model::{Node, Priority, Subtask, Task, TaskCollection, TaskStatus};
pub use repair::{RemovalReason, RemovedEdge, RepairLog};
pub use traversal::{ExecutionLevels, ExecutionOrder};
pub use validation::{CollectionState, DanglingReference, DuplicateReference, ValidationReport};
