// dbrestore/src/restore/preflight.rs
use std::time::Duration;

use crate::errors::{RestoreError, Result};
use crate::restore::connection::ConnectionPlan;
use crate::restore::process::{
    DiagnosticSink, ExecutionMode, ProcessInvocation, ProcessRunner, StdinSource,
};

pub const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(60);

/// `client -e "CREATE DATABASE IF NOT EXISTS ..."` with the restore's connection settings.
pub fn preflight_invocation(plan: &ConnectionPlan) -> ProcessInvocation {
    ProcessInvocation {
        program: plan.client_binary.clone(),
        args: plan.ensure_database_args(),
        stdin: StdinSource::None,
        diagnostics: DiagnosticSink::Discard,
        execution_mode: ExecutionMode::DirectSpawn,
    }
}

/// Creates the target database if it is missing.
///
/// Callers treat an error here as a warning: the restore itself reports a
/// clearer failure if the database really is unusable.
pub async fn ensure_database<R: ProcessRunner>(runner: &R, plan: &ConnectionPlan) -> Result<()> {
    let invocation = preflight_invocation(plan);
    tracing::debug!(argv = ?invocation.redacted_argv(), "ensuring target database exists");

    let status = runner
        .run(&invocation, PREFLIGHT_TIMEOUT)
        .await
        .map_err(|e| RestoreError::PreflightFailed(format!("could not start client: {}", e)))?;

    if status.success() {
        Ok(())
    } else if status.timed_out {
        Err(RestoreError::PreflightFailed(format!(
            "timed out after {}s",
            PREFLIGHT_TIMEOUT.as_secs()
        )))
    } else {
        Err(RestoreError::PreflightFailed(format!(
            "client exited with {:?}",
            status.exit_code
        )))
    }
}
