//! Subcommand implementations.
//!
//! Every command loads the tasks file, runs one graph operation and, for
//! successful edits, writes the file back.

pub mod dependency;
pub mod query;
pub mod validate;

use crate::cli::{CliError, Commands};
use std::path::PathBuf;
use tasklane_graph::TaskId;

/// Settings shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Tasks file to load and save.
    pub tasks_file: PathBuf,
    /// Render results as JSON envelopes.
    pub json: bool,
}

/// Run a subcommand, returning the process exit code.
///
/// # Errors
///
/// Returns a [`CliError`] if the tasks file cannot be loaded or saved, or
/// the graph operation fails.
pub fn execute(command: Commands, ctx: &Context) -> Result<i32, CliError> {
    let span = crate::command_span!(command.name(), file = ctx.tasks_file.display());
    let _guard = span.enter();

    match command {
        Commands::AddDependency { id, depends_on } => dependency::add(ctx, &id, &depends_on),
        Commands::RemoveDependency { id, depends_on } => {
            dependency::remove(ctx, &id, &depends_on)
        }
        Commands::ValidateDependencies => validate::validate(ctx),
        Commands::FixDependencies { dry_run } => validate::fix(ctx, dry_run),
        Commands::Next => query::next(ctx),
        Commands::Order { levels } => query::order(ctx, levels),
        Commands::Show { id } => query::show(ctx, &id),
    }
}

/// Comma-separated ids, or `none`.
pub(crate) fn join_ids(ids: &[TaskId]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_ids() {
        assert_eq!(join_ids(&[]), "none");
        let ids: Vec<TaskId> = ["2", "1.3"].iter().map(|s| s.parse().unwrap()).collect();
        assert_eq!(join_ids(&ids), "2, 1.3");
    }
}
