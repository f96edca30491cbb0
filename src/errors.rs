// dbrestore/src/errors.rs
use std::path::PathBuf;
use thiserror::Error;

/// Coarse category of a restore failure, independent of the payload it carries.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    ArchiveNotFound,
    UnsupportedFormat,
    ArchiveCorrupt,
    SqlPayloadMissing,
    ExtractionIo,
    SqlPayloadUnreadable,
    PreflightFailed,
    ExecutionFailed,
    FallbackFailed,
}

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Backup archive not found: {reference}")]
    ArchiveNotFound { reference: String },

    #[error("Unsupported archive format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Archive could not be opened: {}: {detail}", path.display())]
    ArchiveCorrupt { path: PathBuf, detail: String },

    #[error("No .sql or .sql.gz file found in archive: {}", path.display())]
    SqlPayloadMissing { path: PathBuf },

    #[error("I/O error while extracting {}: {source}", path.display())]
    ExtractionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQL file is missing or unreadable: {}", path.display())]
    SqlPayloadUnreadable { path: PathBuf },

    #[error("Database preflight failed: {0}")]
    PreflightFailed(String),

    #[error("Database client failed ({detail}): {diagnostic_tail}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        detail: String,
        diagnostic_tail: String,
    },

    #[error("Database client failed over TCP and again over named pipe. TCP: {original_tail} | PIPE: {fallback_tail}")]
    FallbackFailed {
        original_tail: String,
        fallback_tail: String,
    },
}

impl RestoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RestoreError::ArchiveNotFound { .. } => ErrorKind::ArchiveNotFound,
            RestoreError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            RestoreError::ArchiveCorrupt { .. } => ErrorKind::ArchiveCorrupt,
            RestoreError::SqlPayloadMissing { .. } => ErrorKind::SqlPayloadMissing,
            RestoreError::ExtractionIo { .. } => ErrorKind::ExtractionIo,
            RestoreError::SqlPayloadUnreadable { .. } => ErrorKind::SqlPayloadUnreadable,
            RestoreError::PreflightFailed(_) => ErrorKind::PreflightFailed,
            RestoreError::ExecutionFailed { .. } => ErrorKind::ExecutionFailed,
            RestoreError::FallbackFailed { .. } => ErrorKind::FallbackFailed,
        }
    }

    /// Short message safe to show an end user: no paths, hosts or client output.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::ArchiveNotFound => "Restore failed: the backup file could not be found.",
            ErrorKind::UnsupportedFormat => {
                "Restore failed: the backup file format is not supported (use .zip, .tar, .tar.gz or .sql.gz)."
            }
            ErrorKind::ArchiveCorrupt => "Restore failed: the backup archive could not be opened.",
            ErrorKind::SqlPayloadMissing => "Restore failed: no SQL dump was found inside the backup.",
            ErrorKind::ExtractionIo => "Restore failed: the backup could not be extracted.",
            ErrorKind::SqlPayloadUnreadable => "Restore failed: the extracted SQL dump is not readable.",
            // The pipeline downgrades preflight errors to warnings, so this text only reaches logs.
            ErrorKind::PreflightFailed => "Restore failed: the target database could not be prepared.",
            ErrorKind::ExecutionFailed | ErrorKind::FallbackFailed => {
                "Restore failed: the database client reported an error. Check the logs for details."
            }
        }
    }

    pub(crate) fn extraction_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RestoreError::ExtractionIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RestoreError>;
