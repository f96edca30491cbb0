// dbrestore/src/restore/locator.rs
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::errors::{RestoreError, Result};
use crate::restore::archive::ArchiveKind;

/// A backup archive that exists on disk and has a recognised format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    pub absolute_path: PathBuf,
    pub kind: ArchiveKind,
    pub basename: String,
}

/// A restorable archive found while listing the backup roots.
#[derive(Debug, Clone)]
pub struct ArchiveListing {
    pub path: PathBuf,
    pub kind: ArchiveKind,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

/// Resolves archive references against an immutable, ordered list of backup roots.
#[derive(Debug, Clone)]
pub struct ArchiveLocator {
    storage_root: PathBuf,
    backup_roots: Vec<PathBuf>,
}

impl ArchiveLocator {
    pub fn new(storage_root: impl Into<PathBuf>, backup_roots: Vec<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            backup_roots,
        }
    }

    /// Finds the archive file for `reference`.
    ///
    /// The reference is first tried relative to the storage root (an absolute
    /// reference is used as-is). Failing that, its file name is probed in each
    /// backup root in configuration order.
    pub fn locate(&self, reference: &str) -> Result<PathBuf> {
        let not_found = || RestoreError::ArchiveNotFound {
            reference: reference.to_string(),
        };

        let reference_trimmed = reference.trim();
        if reference_trimmed.is_empty() {
            return Err(not_found());
        }

        let direct = self.storage_root.join(reference_trimmed);
        if direct.is_file() {
            return absolute(&direct);
        }

        let basename = Path::new(reference_trimmed).file_name().ok_or_else(not_found)?;
        for root in &self.backup_roots {
            let candidate = root.join(basename);
            tracing::debug!(candidate = %candidate.display(), "probing backup root");
            if candidate.is_file() {
                return absolute(&candidate);
            }
        }

        Err(not_found())
    }

    /// Locates the archive and classifies its format.
    pub fn describe(&self, reference: &str) -> Result<ArchiveDescriptor> {
        let absolute_path = self.locate(reference)?;
        let basename = absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = ArchiveKind::detect(&basename).ok_or_else(|| RestoreError::UnsupportedFormat {
            path: absolute_path.clone(),
        })?;

        Ok(ArchiveDescriptor {
            absolute_path,
            kind,
            basename,
        })
    }

    /// Every directory the locator reads from, storage root first, without duplicates.
    pub fn search_dirs(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = vec![self.storage_root.as_path()];
        for root in &self.backup_roots {
            if !dirs.contains(&root.as_path()) {
                dirs.push(root.as_path());
            }
        }
        dirs
    }

    /// Restorable archives directly inside the search directories, newest first.
    /// Unreadable directories are skipped.
    pub fn list_archives(&self) -> Vec<ArchiveListing> {
        let mut listings = Vec::new();
        for dir in self.search_dirs() {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable backup root");
                    continue;
                }
            };
            for entry in entries.flatten() {
                let Ok(metadata) = entry.metadata() else {
                    continue;
                };
                if !metadata.is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                let Some(kind) = ArchiveKind::detect(&name) else {
                    continue;
                };
                listings.push(ArchiveListing {
                    path: entry.path(),
                    kind,
                    size_bytes: metadata.len(),
                    modified: metadata.modified().ok().map(DateTime::<Local>::from),
                });
            }
        }
        listings.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        listings
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|_| RestoreError::ArchiveNotFound {
        reference: path.display().to_string(),
    })
}
