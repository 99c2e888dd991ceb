//! Destination directory, staging area and atomic placement.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;

/// Prefix of per-item staging directories created under the destination.
pub const STAGING_PREFIX: &str = ".plexdl-";

/// Create `dir` (and parents) if absent. Safe to call from many workers at
/// once: a directory that appears concurrently is not an error.
pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// New empty staging directory inside `dir`, on the same filesystem as the
/// final files so that placement is a plain rename. Removed when dropped.
pub fn staging_dir(dir: &Path) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(dir)
        .with_context(|| format!("failed to create staging directory in {}", dir.display()))
}

/// Atomically rename the fetched file to its final path, replacing any existing file.
pub fn place_file(fetched: &Path, final_path: &Path) -> Result<()> {
    fs::rename(fetched, final_path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            fetched.display(),
            final_path.display()
        )
    })
}
