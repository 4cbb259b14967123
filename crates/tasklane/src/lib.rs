//! tasklane - task dependency management from the command line
//!
//! The binary is a thin layer over [`tasklane_graph`]: it resolves settings
//! from flags, environment and `tasklane.toml`, loads the tasks file, runs a
//! single graph operation and writes the file back when it changed.
//!
//! Exit codes:
//!
//! - `0` success
//! - `1` `validate-dependencies` found problems
//! - `2` usage, configuration or input error
//! - `3` storage or repair failure

pub mod cli;
/// Subcommand implementations.
pub mod commands;
/// Layered configuration.
pub mod config;
/// Storage and configuration errors.
pub mod error;
/// Loading and saving the tasks file.
pub mod storage;
/// Tracing and logging configuration.
pub mod tracing;

use cli::{Cli, CliError, exit_code_for, render_error};
use commands::Context;
use config::{Config, Settings};

/// Run a parsed command line, returning the process exit code.
#[must_use]
pub fn run(cli: Cli) -> i32 {
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let err = CliError::from(err);
            render_error(&err, cli.json);
            return exit_code_for(&err);
        }
    };

    let settings = Settings::resolve(cli.file, cli.level, cli.log_format, cli.json, config);
    // Ignore error if tracing already initialized (e.g., in tests)
    let _ = crate::tracing::init_tracing(settings.tracing_config());

    let ctx = Context {
        tasks_file: settings.tasks_file,
        json: cli.json,
    };
    match commands::execute(cli.command, &ctx) {
        Ok(code) => code,
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    }
}
