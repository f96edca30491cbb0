// dbrestore/src/restore/mod.rs
pub(crate) mod archive;
pub(crate) mod connection;
pub(crate) mod locator;
pub(crate) mod logic;
pub(crate) mod preflight;
pub(crate) mod process;
pub(crate) mod retry;
pub(crate) mod workspace;

use crate::config::AppConfig;
use connection::OsFamily;
use locator::{ArchiveListing, ArchiveLocator};
use logic::{RestoreOutcome, RestorePipeline, RestoreRequest};
use process::TokioProcessRunner;

/// Public entry point for the restore process.
/// Never fails: every error is folded into the returned outcome.
pub async fn run_restore_flow(app_config: &AppConfig, archive_reference: &str) -> RestoreOutcome {
    let pipeline = RestorePipeline::from_settings(
        &app_config.restore,
        OsFamily::current(),
        TokioProcessRunner,
    );
    pipeline.restore(&RestoreRequest::new(archive_reference)).await
}

/// Archives that `run_restore_flow` could be pointed at, newest first.
pub fn list_available_archives(app_config: &AppConfig) -> Vec<ArchiveListing> {
    let settings = &app_config.restore;
    ArchiveLocator::new(&settings.storage_root, settings.backup_roots.clone()).list_archives()
}
