//! Loading and saving the tasks file.
//!
//! The whole collection is read at the start of a command and written back
//! in one piece. Writes go to a temporary file in the target directory which
//! is then renamed over the original, so readers never see a partial file.

use crate::error::{Error, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tasklane_graph::TaskCollection;
use tempfile::NamedTempFile;
use tracing::debug;

/// Read and parse the tasks file.
///
/// # Errors
///
/// Returns [`Error::TasksFileNotFound`] if the file is missing, or an I/O or
/// JSON error if it cannot be read or does not hold a valid collection.
pub fn load(path: &Path) -> Result<TaskCollection> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            Error::TasksFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::io(e, path, "reading tasks file")
        }
    })?;

    let tasks: TaskCollection = serde_json::from_str(&content).map_err(|e| Error::Json {
        source: e,
        path: Some(path.to_path_buf()),
    })?;

    debug!(
        path = %path.display(),
        tasks = tasks.tasks().len(),
        nodes = tasks.node_count(),
        "Loaded tasks file"
    );
    Ok(tasks)
}

/// Write the collection back to `path`, pretty-printed.
///
/// # Errors
///
/// Returns an I/O error if the temporary file cannot be written or moved
/// into place. An existing file keeps its permissions.
pub fn save(path: &Path, tasks: &TaskCollection) -> Result<()> {
    let mut contents = serde_json::to_string_pretty(tasks)?;
    contents.push('\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file =
        NamedTempFile::new_in(dir).map_err(|e| Error::io(e, dir, "creating temporary file"))?;
    // Temporary files are created owner-only; keep the mode of the file being replaced.
    if let Ok(metadata) = fs::metadata(path) {
        file.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| Error::io(e, file.path(), "copying tasks file permissions"))?;
    }
    file.write_all(contents.as_bytes())
        .map_err(|e| Error::io(e, file.path(), "writing temporary file"))?;
    file.as_file()
        .sync_all()
        .map_err(|e| Error::io(e, file.path(), "syncing temporary file"))?;
    file.persist(path)
        .map_err(|e| Error::io(e.error, path, "replacing tasks file"))?;

    debug!(path = %path.display(), bytes = contents.len(), "Saved tasks file");
    Ok(())
}
