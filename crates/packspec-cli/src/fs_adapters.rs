//! Filesystem-backed stand-ins for the engine's external inputs: a
//! workspace scanner that walks a directory tree for `package.xml` files,
//! and an index source that reads an already-materialized repository-index
//! JSON document. Both only ever touch local disk — never the network —
//! matching `spec.md` §1's scope.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::instrument;

use packspec_core::collect::{parse_manifest, scan_workspace, Manifest};
use packspec_core::index::RepoIndex;
use packspec_core::{PackspecError, Result};

/// Walks a workspace root and parses every `package.xml` manifest found
/// under it, in path-sorted order.
pub struct FsWorkspaceScanner;

impl FsWorkspaceScanner {
    /// Scans `root` and returns every parsed manifest.
    #[instrument(skip(self))]
    pub fn scan(&self, root: &Path) -> Result<Vec<Manifest>> {
        let paths = scan_workspace(root)?;
        paths
            .iter()
            .map(|path| {
                let file = File::open(path).map_err(|e| {
                    PackspecError::not_found(format!("{}: {e}", path.display()))
                })?;
                parse_manifest(BufReader::new(file))
            })
            .collect()
    }
}

/// Reads a repository-index snapshot from a JSON file on disk.
pub struct FsIndexSource;

impl FsIndexSource {
    /// Loads the repository index at `path`.
    #[instrument(skip(self))]
    pub fn load(&self, path: &Path) -> Result<RepoIndex> {
        let file = File::open(path)
            .map_err(|e| PackspecError::not_found(format!("{}: {e}", path.display())))?;
        RepoIndex::from_json_reader(BufReader::new(file))
    }
}
