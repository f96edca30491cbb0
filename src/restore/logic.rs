// dbrestore/src/restore/logic.rs
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::RestoreSettings;
use crate::errors::RestoreError;
use crate::restore::archive::{self, SqlPayload};
use crate::restore::connection::{self, ConnectionPlan, OsFamily};
use crate::restore::locator::{ArchiveDescriptor, ArchiveLocator};
use crate::restore::preflight;
use crate::restore::process::{AttemptReport, ExecutionStrategy, ProcessRunner};
use crate::restore::retry;
use crate::restore::workspace::Workspace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreRequest {
    pub archive_reference: String,
}

impl RestoreRequest {
    pub fn new(archive_reference: impl Into<String>) -> Self {
        Self {
            archive_reference: archive_reference.into(),
        }
    }
}

/// Terminal result of one restore run.
#[derive(Debug)]
pub struct RestoreOutcome {
    pub succeeded: bool,
    pub diagnostic_tail: String,
    pub used_fallback: bool,
    pub exit_code: Option<i32>,
    /// Client log of the last attempt, when the strategy captures one.
    pub diagnostic_file: Option<PathBuf>,
    pub error: Option<RestoreError>,
}

impl RestoreOutcome {
    fn success(attempt: &AttemptReport, used_fallback: bool) -> Self {
        Self {
            succeeded: true,
            diagnostic_tail: attempt.diagnostic_tail.clone(),
            used_fallback,
            exit_code: attempt.exit_code,
            diagnostic_file: attempt.diagnostic_file.clone(),
            error: None,
        }
    }

    fn failure(error: RestoreError) -> Self {
        Self {
            succeeded: false,
            diagnostic_tail: String::new(),
            used_fallback: false,
            exit_code: None,
            diagnostic_file: None,
            error: Some(error),
        }
    }

    /// Message suitable for the end user.
    pub fn message(&self) -> String {
        match &self.error {
            None if self.used_fallback => {
                "Database restored successfully (connected over named pipe).".to_string()
            }
            None => "Database restored successfully.".to_string(),
            Some(e) => e.user_message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStage {
    Locating,
    Extracting,
    Validating,
    Preflighting,
    Executing,
    Retrying,
    CleaningUp,
}

fn enter(stage: RestoreStage) {
    debug!(stage = ?stage, "restore stage");
}

/// Locate, extract, validate, preflight, execute (with at most one fallback), clean up.
pub struct RestorePipeline<R> {
    locator: ArchiveLocator,
    plan: ConnectionPlan,
    strategy: ExecutionStrategy,
    scratch_dir: PathBuf,
    runner: R,
}

impl<R: ProcessRunner> RestorePipeline<R> {
    pub fn new(
        locator: ArchiveLocator,
        plan: ConnectionPlan,
        strategy: ExecutionStrategy,
        scratch_dir: impl Into<PathBuf>,
        runner: R,
    ) -> Self {
        Self {
            locator,
            plan,
            strategy,
            scratch_dir: scratch_dir.into(),
            runner,
        }
    }

    /// Wires the pipeline for `os` from resolved settings.
    pub fn from_settings(settings: &RestoreSettings, os: OsFamily, runner: R) -> Self {
        let locator = ArchiveLocator::new(&settings.storage_root, settings.backup_roots.clone());
        let plan = connection::resolve_plan(&settings.database, os, connection::client_on_system);
        let strategy = ExecutionStrategy::for_os(os, &settings.log_dir);
        Self::new(locator, plan, strategy, &settings.scratch_dir, runner)
    }

    #[cfg(test)]
    pub fn plan(&self) -> &ConnectionPlan {
        &self.plan
    }

    pub async fn restore(&self, request: &RestoreRequest) -> RestoreOutcome {
        info!(
            archive = %request.archive_reference,
            binary = %self.plan.client_binary.display(),
            host = %self.plan.host,
            port = self.plan.port,
            protocol = %self.plan.protocol_mode,
            mode = ?self.strategy.mode(),
            "restore started"
        );

        enter(RestoreStage::Locating);
        let archive = match self.locator.describe(&request.archive_reference) {
            Ok(archive) => archive,
            Err(e) => return finish(RestoreOutcome::failure(e)),
        };
        info!(path = %archive.absolute_path.display(), kind = ?archive.kind, "archive located");

        let workspace = match Workspace::create(&self.scratch_dir) {
            Ok(workspace) => workspace,
            Err(e) => return finish(RestoreOutcome::failure(e)),
        };

        let outcome = self.run_in_workspace(&archive, workspace.root()).await;

        enter(RestoreStage::CleaningUp);
        workspace.clean();
        finish(outcome)
    }

    async fn run_in_workspace(&self, archive: &ArchiveDescriptor, workspace: &Path) -> RestoreOutcome {
        enter(RestoreStage::Extracting);
        let payload = match archive::extract_payload(archive, workspace) {
            Ok(payload) => payload,
            Err(e) => return RestoreOutcome::failure(e),
        };

        enter(RestoreStage::Validating);
        match archive::validate_payload(&payload) {
            Ok(bytes) => info!(payload = %payload.path.display(), bytes, "SQL payload ready"),
            Err(e) => return RestoreOutcome::failure(e),
        }

        enter(RestoreStage::Preflighting);
        if let Err(e) = preflight::ensure_database(&self.runner, &self.plan).await {
            warn!(error = %e, database = %self.plan.database, "preflight failed, continuing with restore");
        }

        enter(RestoreStage::Executing);
        self.execute(&payload).await
    }

    async fn execute(&self, payload: &SqlPayload) -> RestoreOutcome {
        let first = self.strategy.execute(&self.runner, &self.plan, payload).await;
        if first.succeeded {
            return RestoreOutcome::success(&first, false);
        }
        warn!(
            attempt = 1,
            detail = %first.detail,
            exit_code = ?first.exit_code,
            timed_out = first.timed_out,
            diagnostic_file = ?first.diagnostic_file,
            diagnostic_tail = %first.diagnostic_tail,
            "database client failed"
        );

        if !retry::should_fall_back(&self.strategy, &first) {
            return execution_failed(first);
        }

        enter(RestoreStage::Retrying);
        let fallback_plan = retry::fallback_plan(&self.plan);
        info!(
            pipe = fallback_plan.socket_or_pipe_name.as_deref().unwrap_or_default(),
            "TCP socket unavailable, retrying over named pipe"
        );
        let second = self.strategy.execute(&self.runner, &fallback_plan, payload).await;
        if second.succeeded {
            return RestoreOutcome::success(&second, true);
        }
        warn!(
            attempt = 2,
            detail = %second.detail,
            exit_code = ?second.exit_code,
            timed_out = second.timed_out,
            diagnostic_file = ?second.diagnostic_file,
            diagnostic_tail = %second.diagnostic_tail,
            "named pipe retry failed"
        );

        RestoreOutcome {
            succeeded: false,
            diagnostic_tail: format!(
                "{}\n--- named pipe retry ---\n{}",
                first.diagnostic_tail, second.diagnostic_tail
            ),
            used_fallback: true,
            exit_code: second.exit_code,
            diagnostic_file: second.diagnostic_file,
            error: Some(RestoreError::FallbackFailed {
                original_tail: first.diagnostic_tail,
                fallback_tail: second.diagnostic_tail,
            }),
        }
    }
}

fn execution_failed(attempt: AttemptReport) -> RestoreOutcome {
    RestoreOutcome {
        succeeded: false,
        diagnostic_tail: attempt.diagnostic_tail.clone(),
        used_fallback: false,
        exit_code: attempt.exit_code,
        diagnostic_file: attempt.diagnostic_file,
        error: Some(RestoreError::ExecutionFailed {
            exit_code: attempt.exit_code,
            detail: attempt.detail,
            diagnostic_tail: attempt.diagnostic_tail,
        }),
    }
}

fn finish(outcome: RestoreOutcome) -> RestoreOutcome {
    match &outcome.error {
        None => info!(used_fallback = outcome.used_fallback, "restore succeeded"),
        Some(e) => error!(
            kind = ?e.kind(),
            error = %e,
            exit_code = ?outcome.exit_code,
            diagnostic_file = ?outcome.diagnostic_file,
            diagnostic_tail = %outcome.diagnostic_tail,
            "restore failed"
        ),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::restore::connection::ProtocolMode;
    use crate::restore::process::{DiagnosticSink, ProcessInvocation, ProcessStatus, StdinSource};
    use std::collections::VecDeque;
    use std::fs::{self, File};
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    const TCP_FAILURE: &str = "ERROR 2004 (HY000): Can't create TCP/IP socket (10106)";

    struct Step {
        status: std::result::Result<ProcessStatus, String>,
        diagnostics: &'static str,
    }

    fn exits(code: i32) -> Step {
        Step {
            status: Ok(ProcessStatus::exited(code)),
            diagnostics: "",
        }
    }

    fn exits_with(code: i32, diagnostics: &'static str) -> Step {
        Step {
            status: Ok(ProcessStatus::exited(code)),
            diagnostics,
        }
    }

    /// Replays scripted results and records what it was asked to run.
    #[derive(Default)]
    struct ScriptedRunner {
        script: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<ProcessInvocation>>,
        stdin_payloads: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                script: Mutex::new(steps.into()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<ProcessInvocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ProcessRunner for ScriptedRunner {
        async fn run(
            &self,
            invocation: &ProcessInvocation,
            _timeout: Duration,
        ) -> std::io::Result<ProcessStatus> {
            self.calls.lock().unwrap().push(invocation.clone());
            if let StdinSource::Payload(path) = &invocation.stdin {
                self.stdin_payloads
                    .lock()
                    .unwrap()
                    .push(fs::read_to_string(path)?);
            }
            let step = self.script.lock().unwrap().pop_front().unwrap_or(exits(0));
            if let DiagnosticSink::File(path) = &invocation.diagnostics {
                fs::write(path, step.diagnostics)?;
            }
            step.status.map_err(std::io::Error::other)
        }
    }

    struct Fixture {
        storage: TempDir,
        first_root: TempDir,
        second_root: TempDir,
        scratch: TempDir,
        logs: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                storage: TempDir::new().unwrap(),
                first_root: TempDir::new().unwrap(),
                second_root: TempDir::new().unwrap(),
                scratch: TempDir::new().unwrap(),
                logs: TempDir::new().unwrap(),
            }
        }

        fn pipeline(&self, strategy: ExecutionStrategy, runner: ScriptedRunner) -> RestorePipeline<ScriptedRunner> {
            let locator = ArchiveLocator::new(
                self.storage.path(),
                vec![
                    self.first_root.path().to_path_buf(),
                    self.second_root.path().to_path_buf(),
                ],
            );
            let plan = ConnectionPlan {
                client_binary: PathBuf::from("mysql"),
                host: "127.0.0.1".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: "secret".to_string(),
                database: "assets".to_string(),
                protocol_mode: ProtocolMode::Tcp,
                socket_or_pipe_name: None,
                timeout_secs: 1800,
            };
            RestorePipeline::new(locator, plan, strategy, self.scratch.path(), runner)
        }

        fn shell(&self) -> ExecutionStrategy {
            ExecutionStrategy::ShellRedirect {
                log_dir: self.logs.path().to_path_buf(),
            }
        }

        fn assert_workspace_removed(&self) {
            assert_eq!(fs::read_dir(self.scratch.path()).unwrap().count(), 0);
        }
    }

    fn sql_of_len(len: usize) -> String {
        let mut sql = String::new();
        let mut i = 0;
        while sql.len() < len {
            sql.push_str(&format!("INSERT INTO assets VALUES ({});\n", i));
            i += 1;
        }
        sql.truncate(len);
        sql
    }

    fn write_zip(path: &Path, name: &str, data: &[u8]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        writer.start_file(name, FileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn end_to_end_restore_from_second_root() {
        let fx = Fixture::new();
        let dump = sql_of_len(500);
        write_zip(&fx.second_root.path().join("nightly.zip"), "dump.sql", dump.as_bytes());
        let pipeline = fx.pipeline(ExecutionStrategy::DirectSpawn, ScriptedRunner::new(vec![]));

        let outcome = pipeline.restore(&RestoreRequest::new("nightly.zip")).await;

        assert!(outcome.succeeded, "{:?}", outcome.error);
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.exit_code, Some(0));

        let calls = pipeline.runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].args.iter().any(|a| a.starts_with("CREATE DATABASE IF NOT EXISTS")));
        let StdinSource::Payload(sql) = &calls[1].stdin else {
            panic!("restore must stream the payload on stdin");
        };
        assert_eq!(sql.file_name().unwrap(), "dump.sql");
        assert_eq!(*pipeline.runner.stdin_payloads.lock().unwrap(), vec![dump]);
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn missing_archive_spawns_nothing() {
        let fx = Fixture::new();
        let pipeline = fx.pipeline(ExecutionStrategy::DirectSpawn, ScriptedRunner::new(vec![]));

        let outcome = pipeline.restore(&RestoreRequest::new("missing.sql.gz")).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.error.as_ref().map(|e| e.kind()), Some(ErrorKind::ArchiveNotFound));
        assert!(pipeline.runner.calls().is_empty());
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn bare_gz_is_unsupported() {
        let fx = Fixture::new();
        fs::write(fx.storage.path().join("dump.gz"), b"whatever").unwrap();
        let pipeline = fx.pipeline(ExecutionStrategy::DirectSpawn, ScriptedRunner::new(vec![]));

        let outcome = pipeline.restore(&RestoreRequest::new("dump.gz")).await;

        assert_eq!(outcome.error.as_ref().map(|e| e.kind()), Some(ErrorKind::UnsupportedFormat));
        assert!(pipeline.runner.calls().is_empty());
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn container_without_sql_fails_and_cleans_up() {
        let fx = Fixture::new();
        write_zip(&fx.storage.path().join("empty.zip"), "notes.txt", b"no sql");
        let pipeline = fx.pipeline(ExecutionStrategy::DirectSpawn, ScriptedRunner::new(vec![]));

        let outcome = pipeline.restore(&RestoreRequest::new("empty.zip")).await;

        assert_eq!(outcome.error.as_ref().map(|e| e.kind()), Some(ErrorKind::SqlPayloadMissing));
        assert!(pipeline.runner.calls().is_empty());
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn corrupt_container_fails_and_cleans_up() {
        let fx = Fixture::new();
        fs::write(fx.storage.path().join("broken.zip"), b"not a zip").unwrap();
        let pipeline = fx.pipeline(ExecutionStrategy::DirectSpawn, ScriptedRunner::new(vec![]));

        let outcome = pipeline.restore(&RestoreRequest::new("broken.zip")).await;

        assert_eq!(outcome.error.as_ref().map(|e| e.kind()), Some(ErrorKind::ArchiveCorrupt));
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn undecodable_nested_dump_fails_and_cleans_up() {
        let fx = Fixture::new();
        write_zip(&fx.storage.path().join("nightly.zip"), "dump.sql.gz", b"this is not gzip data");
        let pipeline = fx.pipeline(ExecutionStrategy::DirectSpawn, ScriptedRunner::new(vec![]));

        let outcome = pipeline.restore(&RestoreRequest::new("nightly.zip")).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.error.as_ref().map(|e| e.kind()), Some(ErrorKind::ExtractionIo));
        assert!(pipeline.runner.calls().is_empty());
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn preflight_failure_does_not_stop_restore() {
        let fx = Fixture::new();
        write_zip(&fx.storage.path().join("nightly.zip"), "dump.sql", b"SELECT 1;");
        let runner = ScriptedRunner::new(vec![
            Step {
                status: Err("mysql not found".to_string()),
                diagnostics: "",
            },
            exits(0),
        ]);
        let pipeline = fx.pipeline(ExecutionStrategy::DirectSpawn, runner);

        let outcome = pipeline.restore(&RestoreRequest::new("nightly.zip")).await;

        assert!(outcome.succeeded);
        assert_eq!(pipeline.runner.calls().len(), 2);
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn preflight_non_zero_exit_does_not_stop_restore() {
        let fx = Fixture::new();
        write_zip(&fx.storage.path().join("nightly.zip"), "dump.sql", b"SELECT 1;");
        let pipeline = fx.pipeline(
            ExecutionStrategy::DirectSpawn,
            ScriptedRunner::new(vec![exits(1), exits(0)]),
        );

        let outcome = pipeline.restore(&RestoreRequest::new("nightly.zip")).await;

        assert!(outcome.succeeded);
        assert!(outcome.error.is_none());
        assert_eq!(pipeline.runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn tcp_socket_failure_retries_once_over_named_pipe() {
        let fx = Fixture::new();
        write_zip(&fx.storage.path().join("nightly.zip"), "dump.sql", b"SELECT 1;");
        let runner = ScriptedRunner::new(vec![exits(0), exits_with(1, TCP_FAILURE), exits(0)]);
        let pipeline = fx.pipeline(fx.shell(), runner);

        let outcome = pipeline.restore(&RestoreRequest::new("nightly.zip")).await;

        assert!(outcome.succeeded, "{:?}", outcome.error);
        assert!(outcome.used_fallback);

        let calls = pipeline.runner.calls();
        assert_eq!(calls.len(), 3);
        let first_line = calls[1].args.last().unwrap();
        let retry_line = calls[2].args.last().unwrap();
        assert!(first_line.contains("--protocol=TCP"));
        assert!(retry_line.contains("--protocol=PIPE"));
        assert!(retry_line.contains("--socket=MySQL"));
        assert!(!retry_line.contains("--host="));
        assert_ne!(calls[1].diagnostics, calls[2].diagnostics);
        assert_eq!(pipeline.plan().protocol_mode, ProtocolMode::Tcp);
        let DiagnosticSink::File(retry_log) = &calls[2].diagnostics else {
            panic!("shell redirect must capture diagnostics");
        };
        assert_eq!(outcome.diagnostic_file.as_ref(), Some(retry_log));

        // Diagnostic logs are kept for triage.
        assert_eq!(fs::read_dir(fx.logs.path()).unwrap().count(), 2);
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn failed_retry_surfaces_both_tails() {
        let fx = Fixture::new();
        write_zip(&fx.storage.path().join("nightly.zip"), "dump.sql", b"SELECT 1;");
        let runner = ScriptedRunner::new(vec![
            exits(0),
            exits_with(1, TCP_FAILURE),
            exits_with(1, "ERROR 2017 (HY000): Can't open named pipe to host: .  pipe: MySQL (2)"),
        ]);
        let pipeline = fx.pipeline(fx.shell(), runner);

        let outcome = pipeline.restore(&RestoreRequest::new("nightly.zip")).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code, Some(1));
        let Some(RestoreError::FallbackFailed {
            original_tail,
            fallback_tail,
        }) = &outcome.error
        else {
            panic!("expected FallbackFailed, got {:?}", outcome.error);
        };
        assert!(original_tail.contains("ERROR 2004"));
        assert!(fallback_tail.contains("ERROR 2017"));
        assert!(outcome.diagnostic_tail.contains("ERROR 2004"));
        assert!(outcome.diagnostic_tail.contains("ERROR 2017"));
        assert_eq!(pipeline.runner.calls().len(), 3);
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let fx = Fixture::new();
        write_zip(&fx.storage.path().join("nightly.zip"), "dump.sql", b"SELECT 1;");
        let runner = ScriptedRunner::new(vec![
            exits(0),
            exits_with(1, "ERROR 1045 (28000): Access denied for user 'root'@'localhost'"),
        ]);
        let pipeline = fx.pipeline(fx.shell(), runner);

        let outcome = pipeline.restore(&RestoreRequest::new("nightly.zip")).await;

        assert!(!outcome.succeeded);
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.error.as_ref().map(|e| e.kind()), Some(ErrorKind::ExecutionFailed));
        assert!(outcome.diagnostic_tail.contains("ERROR 1045"));
        assert_eq!(pipeline.runner.calls().len(), 2);
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn direct_spawn_never_retries() {
        let fx = Fixture::new();
        write_zip(&fx.storage.path().join("nightly.zip"), "dump.sql", b"SELECT 1;");
        let pipeline = fx.pipeline(
            ExecutionStrategy::DirectSpawn,
            ScriptedRunner::new(vec![exits(0), exits(1)]),
        );

        let outcome = pipeline.restore(&RestoreRequest::new("nightly.zip")).await;

        assert_eq!(outcome.error.as_ref().map(|e| e.kind()), Some(ErrorKind::ExecutionFailed));
        assert_eq!(outcome.exit_code, Some(1));
        assert_eq!(pipeline.runner.calls().len(), 2);
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn timed_out_client_is_an_execution_failure() {
        let fx = Fixture::new();
        write_zip(&fx.storage.path().join("nightly.zip"), "dump.sql", b"SELECT 1;");
        let runner = ScriptedRunner::new(vec![
            exits(0),
            Step {
                status: Ok(ProcessStatus {
                    exit_code: None,
                    timed_out: true,
                }),
                diagnostics: "",
            },
        ]);
        let pipeline = fx.pipeline(ExecutionStrategy::DirectSpawn, runner);

        let outcome = pipeline.restore(&RestoreRequest::new("nightly.zip")).await;

        let Some(RestoreError::ExecutionFailed { detail, exit_code, .. }) = &outcome.error else {
            panic!("expected ExecutionFailed, got {:?}", outcome.error);
        };
        assert!(detail.contains("timed out"));
        assert_eq!(*exit_code, None);
        fx.assert_workspace_removed();
    }

    #[tokio::test]
    async fn compressed_sql_reference_is_restored() {
        let fx = Fixture::new();
        let mut encoder = flate2::write::GzEncoder::new(
            File::create(fx.first_root.path().join("assets.sql.gz")).unwrap(),
            flate2::Compression::default(),
        );
        encoder.write_all(b"SELECT 42;").unwrap();
        encoder.finish().unwrap();
        let pipeline = fx.pipeline(ExecutionStrategy::DirectSpawn, ScriptedRunner::new(vec![]));

        let outcome = pipeline.restore(&RestoreRequest::new("old/location/assets.sql.gz")).await;

        assert!(outcome.succeeded, "{:?}", outcome.error);
        assert_eq!(*pipeline.runner.stdin_payloads.lock().unwrap(), vec!["SELECT 42;".to_string()]);
        fx.assert_workspace_removed();
    }

    #[test]
    fn outcome_messages() {
        let ok = RestoreOutcome {
            succeeded: true,
            diagnostic_tail: String::new(),
            used_fallback: false,
            exit_code: Some(0),
            diagnostic_file: None,
            error: None,
        };
        assert_eq!(ok.message(), "Database restored successfully.");

        let failed = RestoreOutcome::failure(RestoreError::ArchiveNotFound {
            reference: "/secret/path.zip".to_string(),
        });
        assert!(!failed.message().contains("/secret"));
    }
}
