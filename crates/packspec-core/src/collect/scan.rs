//! The workspace scanner: walks a workspace root looking for per-package
//! manifest files, skipping directories that hold build artifacts rather
//! than source packages.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::PackspecError;

const SKIPPED_DIRS: &[&str] = &["install", "build", "log", "devel", ".git", ".colcon", ".ros"];

/// Walks `root`, skipping [`SKIPPED_DIRS`], and returns the path of every
/// `package.xml` file found.
pub fn scan_workspace(root: &Path) -> Result<Vec<PathBuf>, PackspecError> {
    let mut manifests = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            !SKIPPED_DIRS.contains(&name.as_ref())
        } else {
            true
        }
    });
    for entry in walker {
        let entry = entry.map_err(|e| {
            PackspecError::invalid_argument(format!("failed to walk workspace: {e}"))
        })?;
        if entry.file_type().is_file() && entry.file_name() == "package.xml" {
            manifests.push(entry.into_path());
        }
    }
    manifests.sort();
    Ok(manifests)
}
