// dbrestore/src/restore/process.rs
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use tokio::process::Command;
use tracing::{info, warn};

use crate::restore::archive::SqlPayload;
use crate::restore::connection::{ConnectionPlan, OsFamily};

/// How much trailing client output is kept for triage.
pub const DIAGNOSTIC_TAIL_BYTES: u64 = 4000;

/// Characters that make `cmd.exe` or the client's argv parser treat an argument specially.
const SHELL_METACHARACTERS: &[char] = &['"', '&', '|', '<', '>', '^', '%', '!', '(', ')'];

static PASSWORD_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""--password=(?:[^"]|"")*"|--password=\S*"#).expect("password pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    DirectSpawn,
    ShellRedirect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinSource {
    Payload(PathBuf),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticSink {
    File(PathBuf),
    Discard,
}

/// One fully-specified process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub stdin: StdinSource,
    pub diagnostics: DiagnosticSink,
    pub execution_mode: ExecutionMode,
}

impl ProcessInvocation {
    /// Program and arguments with any password masked, for logging.
    pub fn redacted_argv(&self) -> Vec<String> {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .map(|arg| redact(&arg))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ProcessStatus {
    #[cfg(test)]
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            timed_out: false,
        }
    }

    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Launches a process and waits for it, killing it once `timeout` elapses.
pub trait ProcessRunner {
    async fn run(
        &self,
        invocation: &ProcessInvocation,
        timeout: Duration,
    ) -> std::io::Result<ProcessStatus>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        invocation: &ProcessInvocation,
        timeout: Duration,
    ) -> std::io::Result<ProcessStatus> {
        let mut command = Command::new(&invocation.program);
        push_args(&mut command, invocation);

        let stdin = match &invocation.stdin {
            StdinSource::Payload(path) => Stdio::from(File::open(path)?),
            StdinSource::None => Stdio::null(),
        };
        // Output is never piped back: an unread pipe can stall the client.
        command
            .stdin(stdin)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => {
                let status = status?;
                Ok(ProcessStatus {
                    exit_code: status.code(),
                    timed_out: false,
                })
            }
            Err(_) => {
                warn!(
                    program = %invocation.program.display(),
                    timeout_secs = timeout.as_secs(),
                    "process timed out, killing it"
                );
                kill_process_tree(&child).await;
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill timed out process");
                }
                Ok(ProcessStatus {
                    exit_code: None,
                    timed_out: true,
                })
            }
        }
    }
}

/// On Windows the child is usually `cmd`, and killing it alone leaves the
/// client it started running. `taskkill /T` takes down the whole tree.
#[cfg(windows)]
async fn kill_process_tree(child: &tokio::process::Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let result = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match result {
        Ok(status) if status.success() => {}
        Ok(status) => warn!(pid, exit_code = ?status.code(), "taskkill did not succeed"),
        Err(e) => warn!(pid, error = %e, "failed to run taskkill"),
    }
}

#[cfg(not(windows))]
async fn kill_process_tree(_child: &tokio::process::Child) {}

#[cfg(windows)]
fn push_args(command: &mut Command, invocation: &ProcessInvocation) {
    match invocation.execution_mode {
        // The command line was quoted by `quote_argument`; Rust must not quote it again.
        ExecutionMode::ShellRedirect => {
            for arg in &invocation.args {
                command.raw_arg(arg);
            }
        }
        ExecutionMode::DirectSpawn => {
            command.args(&invocation.args);
        }
    }
}

#[cfg(not(windows))]
fn push_args(command: &mut Command, invocation: &ProcessInvocation) {
    command.args(&invocation.args);
}

/// Result of running the restore client once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    pub succeeded: bool,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    /// Human-readable reason when the attempt failed.
    pub detail: String,
    pub diagnostic_tail: String,
    pub diagnostic_file: Option<PathBuf>,
}

/// The two ways of feeding a SQL file to the database client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Spawn the client directly with the payload attached to stdin.
    DirectSpawn,
    /// Run the client through a shell with `<` / `>` redirection, capturing output in `log_dir`.
    ShellRedirect { log_dir: PathBuf },
}

impl ExecutionStrategy {
    pub fn for_os(os: OsFamily, log_dir: impl Into<PathBuf>) -> Self {
        match os {
            OsFamily::Windows => ExecutionStrategy::ShellRedirect {
                log_dir: log_dir.into(),
            },
            OsFamily::Unix => ExecutionStrategy::DirectSpawn,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        match self {
            ExecutionStrategy::DirectSpawn => ExecutionMode::DirectSpawn,
            ExecutionStrategy::ShellRedirect { .. } => ExecutionMode::ShellRedirect,
        }
    }

    pub fn build_invocation(
        &self,
        plan: &ConnectionPlan,
        payload: &SqlPayload,
    ) -> std::io::Result<ProcessInvocation> {
        match self {
            ExecutionStrategy::DirectSpawn => Ok(ProcessInvocation {
                program: plan.client_binary.clone(),
                args: plan.restore_args(),
                stdin: StdinSource::Payload(payload.path.clone()),
                diagnostics: DiagnosticSink::Discard,
                execution_mode: ExecutionMode::DirectSpawn,
            }),
            ExecutionStrategy::ShellRedirect { log_dir } => {
                std::fs::create_dir_all(log_dir)?;
                let diagnostic_file = log_dir.join(diagnostic_file_name());
                let line = redirect_command_line(
                    &plan.client_binary,
                    &plan.restore_args(),
                    &payload.path,
                    &diagnostic_file,
                );
                let (program, args) = shell_command(line);
                Ok(ProcessInvocation {
                    program,
                    args,
                    stdin: StdinSource::None,
                    diagnostics: DiagnosticSink::File(diagnostic_file),
                    execution_mode: ExecutionMode::ShellRedirect,
                })
            }
        }
    }

    /// Runs one restore attempt. Every failure is folded into the report.
    pub async fn execute<R: ProcessRunner>(
        &self,
        runner: &R,
        plan: &ConnectionPlan,
        payload: &SqlPayload,
    ) -> AttemptReport {
        let invocation = match self.build_invocation(plan, payload) {
            Ok(invocation) => invocation,
            Err(e) => {
                return AttemptReport {
                    succeeded: false,
                    exit_code: None,
                    timed_out: false,
                    detail: format!("could not prepare client invocation: {}", e),
                    diagnostic_tail: String::new(),
                    diagnostic_file: None,
                };
            }
        };

        info!(
            mode = ?invocation.execution_mode,
            binary = %plan.client_binary.display(),
            host = %plan.host,
            port = plan.port,
            protocol = %plan.protocol_mode,
            argv = ?invocation.redacted_argv(),
            "starting database client"
        );

        let timeout = Duration::from_secs(plan.timeout_secs);
        let result = runner.run(&invocation, timeout).await;

        let diagnostic_file = match &invocation.diagnostics {
            DiagnosticSink::File(path) => Some(path.clone()),
            DiagnosticSink::Discard => None,
        };
        let diagnostic_tail = diagnostic_file
            .as_deref()
            .map(|path| read_diagnostic_tail(path, DIAGNOSTIC_TAIL_BYTES))
            .unwrap_or_default();

        match result {
            Ok(status) => AttemptReport {
                succeeded: status.success(),
                exit_code: status.exit_code,
                timed_out: status.timed_out,
                detail: describe_status(&status, plan.timeout_secs),
                diagnostic_tail,
                diagnostic_file,
            },
            Err(e) => AttemptReport {
                succeeded: false,
                exit_code: None,
                timed_out: false,
                detail: format!("failed to start {}: {}", plan.client_binary.display(), e),
                diagnostic_tail,
                diagnostic_file,
            },
        }
    }
}

fn describe_status(status: &ProcessStatus, timeout_secs: u64) -> String {
    if status.timed_out {
        format!("timed out after {}s", timeout_secs)
    } else {
        match status.exit_code {
            Some(0) => "exit code 0".to_string(),
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

fn diagnostic_file_name() -> String {
    format!(
        "restore-{}-{}.log",
        Utc::now().format("%Y%m%d-%H%M%S"),
        uuid::Uuid::new_v4().simple()
    )
}

/// Renders `program args < sql > log 2>&1` with every token quoted.
pub fn redirect_command_line(program: &Path, args: &[String], sql: &Path, log: &Path) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(quote_argument(&program.to_string_lossy()));
    parts.extend(args.iter().map(|arg| quote_argument(arg)));
    format!(
        "{} < {} > {} 2>&1",
        parts.join(" "),
        quote_argument(&sql.to_string_lossy()),
        quote_argument(&log.to_string_lossy())
    )
}

fn shell_command(line: String) -> (PathBuf, Vec<String>) {
    if cfg!(windows) {
        // `/S` makes cmd strip exactly the outer quotes and run the rest verbatim.
        (
            PathBuf::from("cmd"),
            vec!["/S".to_string(), "/C".to_string(), format!("\"{}\"", line)],
        )
    } else {
        (PathBuf::from("sh"), vec!["-c".to_string(), line])
    }
}

/// Quotes one argument for a `cmd.exe` command line.
///
/// Arguments without whitespace or metacharacters pass through unchanged.
/// Otherwise the argument is wrapped in double quotes, embedded quotes are
/// doubled and backslashes that precede a quote are doubled, which keeps cmd's
/// quote state and the client's argv parsing in agreement. `%` is quoted but
/// cmd may still expand `%VAR%` sequences.
pub fn quote_argument(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }
    if !arg
        .chars()
        .any(|c| c.is_whitespace() || SHELL_METACHARACTERS.contains(&c))
    {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                quoted.extend(std::iter::repeat_n('\\', backslashes * 2));
                backslashes = 0;
                quoted.push_str("\"\"");
            }
            _ => {
                quoted.extend(std::iter::repeat_n('\\', backslashes));
                backslashes = 0;
                quoted.push(c);
            }
        }
    }
    quoted.extend(std::iter::repeat_n('\\', backslashes * 2));
    quoted.push('"');
    quoted
}

/// Last `max_bytes` of `path` as lossy UTF-8; empty when the file is absent.
pub fn read_diagnostic_tail(path: &Path, max_bytes: u64) -> String {
    let read = || -> std::io::Result<String> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        let start = len.saturating_sub(max_bytes);
        file.seek(SeekFrom::Start(start))?;
        let mut buf = Vec::with_capacity((len - start) as usize);
        file.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).trim().to_string())
    };
    read().unwrap_or_default()
}

pub fn redact(arg: &str) -> String {
    PASSWORD_ARG
        .replace_all(arg, |caps: &regex::Captures<'_>| {
            if caps[0].starts_with('"') {
                "\"--password=***\"".to_string()
            } else {
                "--password=***".to_string()
            }
        })
        .into_owned()
}
