//! `validate-dependencies` and `fix-dependencies`.

use super::{Context, join_ids};
use crate::cli::{CliError, EXIT_INVALID, EXIT_OK, render_ok};
use crate::storage;
use serde::Serialize;
use std::fmt;
use tasklane_graph::{CollectionState, RepairLog, ValidationReport};
use tracing::{debug, info};

/// Result of `validate-dependencies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    /// Validity after this check.
    pub state: CollectionState,
    /// Number of tasks and subtasks checked.
    pub nodes: usize,
    /// The findings.
    pub report: ValidationReport,
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = &self.report;
        if report.is_clean() {
            return write!(f, "No dependency problems found in {} tasks", self.nodes);
        }

        writeln!(f, "Found {} dependency problems:", report.issue_count())?;
        for dangling in &report.dangling {
            writeln!(
                f,
                "  missing: {} depends on {}, which does not exist",
                dangling.task, dangling.missing
            )?;
        }
        for id in &report.self_loops {
            writeln!(f, "  self-dependency: {id} depends on itself")?;
        }
        for duplicate in &report.duplicates {
            writeln!(
                f,
                "  duplicate: {} lists {} more than once",
                duplicate.task, duplicate.dependency
            )?;
        }
        for cycle in &report.cycles {
            writeln!(f, "  cycle: {cycle}")?;
        }
        if !report.cycle_nodes.is_empty() {
            writeln!(f, "  on a cycle: {}", join_ids(&report.cycle_nodes))?;
        }
        write!(f, "Run 'tasklane fix-dependencies' to repair them")
    }
}

/// Result of `fix-dependencies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOutcome {
    /// Whether changes were only previewed.
    pub dry_run: bool,
    /// Whether the tasks file was rewritten.
    pub saved: bool,
    /// Validity after repair.
    pub state: CollectionState,
    /// The removed edges.
    pub log: RepairLog,
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.log.is_empty() {
            return write!(f, "No dependency problems to fix");
        }

        let count = self.log.removed.len();
        if self.dry_run {
            writeln!(f, "Would remove {count} dependencies (dry run):")?;
        } else {
            writeln!(f, "Removed {count} dependencies:")?;
        }
        for edge in &self.log.removed {
            writeln!(f, "  {} -> {} ({})", edge.task, edge.dependency, edge.reason)?;
        }
        if self.log.cycle_passes > 0 {
            writeln!(f, "Cycles broken in {} passes", self.log.cycle_passes)?;
        }
        write!(f, "Dependency graph is now {}", self.state)
    }
}

/// Report dependency problems without changing anything.
///
/// Returns [`EXIT_INVALID`] when the report is not clean.
///
/// # Errors
///
/// Returns an error if the tasks file cannot be loaded.
pub fn validate(ctx: &Context) -> Result<i32, CliError> {
    let tasks = storage::load(&ctx.tasks_file)?;
    let report = tasks.validate_dependencies();
    let clean = report.is_clean();

    let outcome = ValidationOutcome {
        state: report.state(),
        nodes: tasks.node_count(),
        report,
    };
    info!(state = %outcome.state, issues = outcome.report.issue_count(), "Validated tasks file");
    render_ok(&outcome, ctx.json)?;

    Ok(if clean { EXIT_OK } else { EXIT_INVALID })
}

/// Repair dependency problems and save, unless `dry_run` is set.
///
/// # Errors
///
/// Returns an error if the tasks file cannot be loaded or saved, or repair
/// does not converge.
pub fn fix(ctx: &Context, dry_run: bool) -> Result<i32, CliError> {
    let mut tasks = storage::load(&ctx.tasks_file)?;
    debug!(state = %tasks.validate_dependencies().state(), "State before repair");

    let log = tasks.fix_dependencies()?;
    let state = tasks.validate_dependencies().state();

    let saved = !dry_run && !log.is_empty();
    if saved {
        storage::save(&ctx.tasks_file, &tasks)?;
    }
    info!(removed = log.removed.len(), dry_run, saved, "Repaired tasks file");

    let outcome = FixOutcome {
        dry_run,
        saved,
        state,
        log,
    };
    render_ok(&outcome, ctx.json)?;
    Ok(EXIT_OK)
}
