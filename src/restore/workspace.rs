// dbrestore/src/restore/workspace.rs
use std::path::Path;

use tempfile::TempDir;

use crate::errors::{RestoreError, Result};

/// Per-run scratch directory. Removed by [`Workspace::clean`], or on drop if a
/// run unwinds before reaching cleanup.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create(scratch_root: &Path) -> Result<Self> {
        std::fs::create_dir_all(scratch_root)
            .map_err(|e| RestoreError::extraction_io(scratch_root, e))?;
        let dir = tempfile::Builder::new()
            .prefix("dbrestore-")
            .tempdir_in(scratch_root)
            .map_err(|e| RestoreError::extraction_io(scratch_root, e))?;
        tracing::debug!(workspace = %dir.path().display(), "workspace created");
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Deletes the directory tree. Failures are logged, never returned.
    pub fn clean(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => tracing::debug!(workspace = %path.display(), "workspace removed"),
            Err(e) => tracing::warn!(
                workspace = %path.display(),
                error = %e,
                "failed to remove workspace"
            ),
        }
    }
}
