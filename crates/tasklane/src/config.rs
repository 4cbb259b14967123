//! Layered configuration: command-line flags and environment variables win
//! over `tasklane.toml`, which wins over built-in defaults.

use crate::error::{Error, Result};
use crate::tracing::{Level, LogLevel, TracingConfig, TracingFormat};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "tasklane.toml";

/// Tasks file used when neither a flag nor the config names one.
pub const DEFAULT_TASKS_FILE: &str = "tasks.json";

/// Contents of `tasklane.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the tasks file, relative to the config file's directory.
    pub tasks_file: Option<PathBuf>,
    /// Default log level.
    pub log_level: Option<LogLevel>,
    /// Default log output format.
    pub log_format: Option<TracingFormat>,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `tasklane.toml` in the
    /// working directory is used if present, otherwise defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit config file is missing, or a config
    /// file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(Error::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = PathBuf::from(CONFIG_FILE);
                if !candidate.is_file() {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };
        Self::read(&path)
    }

    /// Read and parse one config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid.
    pub fn read(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| Error::io(e, path, "reading config file"))?;
        let mut config: Self = toml::from_str(&content).map_err(|e| Error::Toml {
            source: e,
            path: Some(path.to_path_buf()),
        })?;

        if let (Some(tasks_file), Some(base)) = (&config.tasks_file, path.parent())
            && tasks_file.is_relative()
        {
            config.tasks_file = Some(base.join(tasks_file));
        }

        debug!(path = %path.display(), ?config, "Loaded config file");
        Ok(config)
    }
}

/// Effective settings after layering flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Tasks file to load and save.
    pub tasks_file: PathBuf,
    /// Log level.
    pub level: Level,
    /// Log output format.
    pub format: TracingFormat,
}

impl Settings {
    /// Combine command-line values with the config file.
    ///
    /// Without an explicit `--log-format`, `--json` switches logs to JSON so
    /// that both output streams are machine readable.
    #[must_use]
    pub fn resolve(
        file: Option<PathBuf>,
        level: Option<LogLevel>,
        format: Option<TracingFormat>,
        json: bool,
        config: Config,
    ) -> Self {
        let tasks_file = file
            .or(config.tasks_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TASKS_FILE));
        let level = level.or(config.log_level).unwrap_or_default().into();
        let format = format
            .or_else(|| json.then_some(TracingFormat::Json))
            .or(config.log_format)
            .unwrap_or_default();

        Self {
            tasks_file,
            level,
            format,
        }
    }

    /// Tracing configuration for these settings.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            format: self.format,
            level: self.level,
            ..TracingConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_resolves_tasks_file_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "tasks_file = \"tasks/tasks.json\"\nlog_level = \"debug\"\nlog_format = \"compact\"\n",
        )
        .unwrap();

        let config = Config::read(&path).unwrap();
        assert_eq!(
            config.tasks_file,
            Some(dir.path().join("tasks/tasks.json"))
        );
        assert_eq!(config.log_level, Some(LogLevel::Debug));
        assert_eq!(config.log_format, Some(TracingFormat::Compact));
    }

    #[test]
    fn test_read_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "tasks = \"x.json\"\n").unwrap();

        assert!(matches!(
            Config::read(&path).unwrap_err(),
            Error::Toml { .. }
        ));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)).unwrap_err(),
            Error::ConfigNotFound { .. }
        ));
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            tasks_file: Some(PathBuf::from("/from/config.json")),
            log_level: Some(LogLevel::Debug),
            log_format: Some(TracingFormat::Compact),
        };

        let settings = Settings::resolve(
            Some(PathBuf::from("flag.json")),
            Some(LogLevel::Error),
            None,
            false,
            config.clone(),
        );
        assert_eq!(settings.tasks_file, PathBuf::from("flag.json"));
        assert_eq!(settings.level, Level::ERROR);
        assert_eq!(settings.format, TracingFormat::Compact);

        let settings = Settings::resolve(None, None, None, true, config.clone());
        assert_eq!(settings.tasks_file, PathBuf::from("/from/config.json"));
        assert_eq!(settings.level, Level::DEBUG);
        assert_eq!(settings.format, TracingFormat::Json);

        let settings = Settings::resolve(None, None, Some(TracingFormat::Dev), true, config);
        assert_eq!(settings.format, TracingFormat::Dev);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(None, None, None, false, Config::default());
        assert_eq!(settings.tasks_file, PathBuf::from(DEFAULT_TASKS_FILE));
        assert_eq!(settings.level, Level::WARN);
        assert_eq!(settings.format, TracingFormat::Pretty);
    }
}
