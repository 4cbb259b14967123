//! Command-line definitions, error mapping and output envelopes.

use clap::{Parser, Subcommand};
use miette::{Diagnostic, Report};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use tasklane_graph::TaskId;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Validation found problems in the dependency graph
pub const EXIT_INVALID: i32 = 1;
/// CLI, configuration or input error exit code
pub const EXIT_CLI: i32 = 2;
/// Storage or repair failure exit code
pub const EXIT_FAILURE: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Configuration error (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(tasklane::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Rejected input such as an unknown id or a cycle (exit code 2)
    #[error("{message}")]
    #[diagnostic(code(tasklane::cli::input))]
    Input {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Tasks file could not be read, parsed or written (exit code 3)
    #[error("Storage error: {message}")]
    #[diagnostic(code(tasklane::cli::storage))]
    Storage {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(tasklane::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// Stable error kind used in JSON envelopes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Input { .. } => "input",
            Self::Storage { .. } => "storage",
            Self::Other { .. } => "other",
        }
    }
}

fn help_of(err: &dyn Diagnostic) -> Option<String> {
    err.help().map(|help| help.to_string())
}

/// Convert graph operation failures.
///
/// Rejected edits are input errors (exit code 2). A repair that cannot
/// converge is unexpected (exit code 3).
impl From<tasklane_graph::Error> for CliError {
    fn from(err: tasklane_graph::Error) -> Self {
        let help = help_of(&err);
        let message = err.to_string();
        match err {
            tasklane_graph::Error::UnresolvableCycle { .. } => Self::Other { message, help },
            tasklane_graph::Error::NotFound { .. }
            | tasklane_graph::Error::SelfDependency { .. }
            | tasklane_graph::Error::DuplicateEdge { .. }
            | tasklane_graph::Error::EdgeNotFound { .. }
            | tasklane_graph::Error::Cycle { .. } => Self::Input { message, help },
        }
    }
}

/// Convert storage and config file failures.
///
/// A missing or malformed config file is a configuration error (exit code 2);
/// everything touching the tasks file is a storage error (exit code 3).
impl From<crate::error::Error> for CliError {
    fn from(err: crate::error::Error) -> Self {
        let help = help_of(&err);
        let message = err.to_string();
        match err {
            crate::error::Error::ConfigNotFound { .. } | crate::error::Error::Toml { .. } => {
                Self::Config { message, help }
            }
            crate::error::Error::TasksFileNotFound { .. }
            | crate::error::Error::Io { .. }
            | crate::error::Error::Json { .. } => Self::Storage { message, help },
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } | CliError::Input { .. } => EXIT_CLI,
        CliError::Storage { .. } | CliError::Other { .. } => EXIT_FAILURE,
    }
}

/// Render error appropriately based on JSON flag
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": err.kind(),
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        // Use miette for human-friendly error display
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Render a command result: a JSON envelope with `--json`, text otherwise.
///
/// # Errors
///
/// Returns an error if the result cannot be serialized.
#[allow(clippy::print_stdout)]
pub fn render_ok<T: Serialize + Display>(data: &T, json_mode: bool) -> Result<(), CliError> {
    if json_mode {
        let json = serde_json::to_string(&OkEnvelope::new(data))
            .map_err(|e| CliError::other(format!("Failed to serialize output: {e}")))?;
        println!("{json}");
    } else {
        println!("{data}");
    }
    Ok(())
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Main CLI entry point for tasklane.
///
/// Manage task dependencies: add and remove edges, detect cycles and repair
/// broken graphs.
#[derive(Parser, Debug)]
#[command(name = "tasklane")]
#[command(about = "Manage task dependencies: validate, repair and order task graphs")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the tasks file.
    #[arg(
        short = 'f',
        long,
        global = true,
        env = "TASKLANE_FILE",
        help = "Path to the tasks file (default: tasks.json)",
        value_name = "PATH"
    )]
    pub file: Option<PathBuf>,

    /// Path to the config file.
    #[arg(
        long,
        global = true,
        env = "TASKLANE_CONFIG",
        help = "Path to the config file (default: ./tasklane.toml if present)",
        value_name = "PATH"
    )]
    pub config: Option<PathBuf>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level (default: warn)",
        value_enum
    )]
    pub level: Option<crate::tracing::LogLevel>,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "TASKLANE_LOG_FORMAT",
        help = "Set log output format (default: pretty, or json with --json)",
        value_enum,
        value_name = "FORMAT"
    )]
    pub log_format: Option<crate::tracing::TracingFormat>,

    /// Emit JSON envelope regardless of format.
    #[arg(long, global = true, help = "Emit JSON envelope instead of text")]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Add a dependency edge.
    #[command(about = "Make a task depend on another task")]
    AddDependency {
        /// The dependent task or subtask.
        #[arg(long, help = "Task that gains the dependency (e.g. 3 or 3.1)")]
        id: TaskId,
        /// The task it should depend on.
        #[arg(long, help = "Task to depend on")]
        depends_on: TaskId,
    },
    /// Remove a dependency edge.
    #[command(about = "Remove a dependency between two tasks")]
    RemoveDependency {
        /// The dependent task or subtask.
        #[arg(long, help = "Task that loses the dependency")]
        id: TaskId,
        /// The dependency to remove.
        #[arg(long, help = "Dependency to remove")]
        depends_on: TaskId,
    },
    /// Report dependency problems.
    #[command(
        about = "Check for missing references, self-dependencies and cycles",
        visible_alias = "validate"
    )]
    ValidateDependencies,
    /// Repair dependency problems.
    #[command(about = "Remove invalid dependencies and break cycles", visible_alias = "fix")]
    FixDependencies {
        /// Report what would change without saving.
        #[arg(long, help = "Show what would be removed without saving")]
        dry_run: bool,
    },
    /// Show the next task to work on.
    #[command(about = "Show the next task whose dependencies are all done")]
    Next,
    /// Show execution order.
    #[command(about = "Print tasks in dependency order")]
    Order {
        /// Group tasks that can run in parallel.
        #[arg(long, help = "Group tasks into levels that can run in parallel")]
        levels: bool,
    },
    /// Show one task's dependencies and dependents.
    #[command(about = "Show a task's direct and transitive dependencies and its dependents")]
    Show {
        /// The task or subtask to show.
        #[arg(value_name = "ID")]
        id: TaskId,
    },
}

impl Commands {
    /// Subcommand name as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddDependency { .. } => "add-dependency",
            Self::RemoveDependency { .. } => "remove-dependency",
            Self::ValidateDependencies => "validate-dependencies",
            Self::FixDependencies { .. } => "fix-dependencies",
            Self::Next => "next",
            Self::Order { .. } => "order",
            Self::Show { .. } => "show",
        }
    }
}

/// Parse command-line arguments, exiting with usage help on failure.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
