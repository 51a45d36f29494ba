use std::path::{Path, PathBuf};

use crate::error::{IoResultExt as _, ProvisionError, Result};

/// Resolves `start_dir` against the current directory (following `..` and
/// symlinks) and then runs [`locate`] on the result.
pub fn find_root(start_dir: &Path, marker: &str) -> Result<PathBuf> {
    let start = std::fs::canonicalize(start_dir)
        .with_io_context(|| format!("resolve start directory {}", start_dir.display()))?;
    locate(&start, marker)
}

/// Walks from `start_dir` towards the filesystem root and returns the first
/// directory whose base name is `marker`. Only path components are inspected,
/// so `start_dir` should be absolute and free of `..`; see [`find_root`].
pub fn locate(start_dir: &Path, marker: &str) -> Result<PathBuf> {
    start_dir
        .ancestors()
        .find(|dir| dir.file_name().is_some_and(|name| name == marker))
        .map(Path::to_path_buf)
        .ok_or_else(|| ProvisionError::RootNotFound {
            marker: marker.to_string(),
            start: start_dir.to_path_buf(),
        })
}
