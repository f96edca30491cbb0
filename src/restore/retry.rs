// dbrestore/src/restore/retry.rs
use std::sync::LazyLock;

use regex::Regex;

use crate::restore::connection::{ConnectionPlan, DEFAULT_PIPE_NAME, ProtocolMode};
use crate::restore::process::{AttemptReport, ExecutionStrategy};

// CR_IPSOCK_ERROR: the client could not create a TCP/IP socket.
static TCP_SOCKET_FAILURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ERROR\s+2004\b").expect("signature pattern is valid"));

/// True when client output shows the TCP transport itself could not be used.
pub fn is_transport_unavailable(diagnostic_text: &str) -> bool {
    TCP_SOCKET_FAILURE.is_match(diagnostic_text)
}

/// A failed shell-redirect attempt whose output carries the TCP failure signature
/// gets exactly one retry over a named pipe. Nothing else is retried.
pub fn should_fall_back(strategy: &ExecutionStrategy, attempt: &AttemptReport) -> bool {
    matches!(strategy, ExecutionStrategy::ShellRedirect { .. })
        && !attempt.succeeded
        && is_transport_unavailable(&attempt.diagnostic_tail)
}

pub fn fallback_plan(plan: &ConnectionPlan) -> ConnectionPlan {
    let pipe_name = plan
        .socket_or_pipe_name
        .clone()
        .unwrap_or_else(|| DEFAULT_PIPE_NAME.to_string());
    plan.with_protocol(ProtocolMode::Pipe, Some(pipe_name))
}
