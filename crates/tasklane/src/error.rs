//! Errors raised while loading configuration and task files.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for storage and configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Storage and configuration errors.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// The tasks file does not exist.
    #[error("Tasks file not found at {}", path.display())]
    #[diagnostic(
        code(tasklane::storage::tasks_file_not_found),
        help("Create the file, or point at it with --file, TASKLANE_FILE or tasks_file in tasklane.toml")
    )]
    TasksFileNotFound {
        /// The path that was tried.
        path: PathBuf,
    },

    /// An explicitly requested config file does not exist.
    #[error("Config file not found at {}", path.display())]
    #[diagnostic(
        code(tasklane::config::not_found),
        help("Check the --config flag or the TASKLANE_CONFIG environment variable")
    )]
    ConfigNotFound {
        /// The path that was tried.
        path: PathBuf,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(tasklane::storage::io_error),
        help("Check that the referenced paths exist and that you have permission to read or write them")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// The tasks file is not a valid task collection.
    #[error("JSON parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(tasklane::storage::json_error),
        help("Ensure the file holds a 'tasks' array with unique task and subtask ids")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },

    /// The config file is not valid.
    #[error("TOML parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(tasklane::config::toml_error),
        help("Supported keys are tasks_file, log_level and log_format")
    )]
    Toml {
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Create an I/O error for an operation on `path`.
    #[must_use]
    pub fn io(source: std::io::Error, path: &Path, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.to_path_buf()),
            operation: operation.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source, path: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message_includes_path() {
        let error = Error::io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            Path::new("/tmp/tasks.json"),
            "writing tasks file",
        );
        assert_eq!(
            error.to_string(),
            "I/O error during writing tasks file at /tmp/tasks.json: denied"
        );
    }

    #[test]
    fn test_json_error_without_path() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::from(source);
        assert!(error.to_string().starts_with("JSON parsing error: "));
    }

    #[test]
    fn test_diagnostic_codes() {
        let error = Error::TasksFileNotFound {
            path: PathBuf::from("tasks.json"),
        };
        assert_eq!(
            error.code().map(|c| c.to_string()).as_deref(),
            Some("tasklane::storage::tasks_file_not_found")
        );
        assert!(error.help().is_some());
    }
}
