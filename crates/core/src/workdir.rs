//! Working and scratch directories.

use crate::{SegError, SegResult};
use std::path::Path;
use tempfile::TempDir;

/// Creates `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> SegResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| SegError::WorkDirCreation {
        path: dir.to_path_buf(),
        source,
    })
}

/// Creates a uniquely named scratch directory inside `parent`.
///
/// The directory and its contents are removed when the returned handle is dropped.
pub fn scratch_dir(parent: &Path, prefix: &str) -> SegResult<TempDir> {
    ensure_dir(parent)?;
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(parent)
        .map_err(SegError::ScratchDirCreation)
}
