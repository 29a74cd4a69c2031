// Result/Status Reporter - collapses a run into exit status and diagnostics

use crate::domain::{ChainOutcome, ChainState};
use crate::error::Result;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Map a run result to a process exit code.
///
/// Callers must only distinguish zero from non-zero; the failure value is
/// fixed at 1 but not part of the contract.
pub fn exit_code(result: &Result<ChainOutcome>) -> i32 {
    match result {
        Ok(outcome) if outcome.is_success() => EXIT_SUCCESS,
        _ => EXIT_FAILURE,
    }
}

/// Render the failure diagnostic for a run, or `None` on success.
///
/// Names the failing statement's position (1-based for operators), the
/// connection(s) involved, and the underlying error text.
pub fn render_failure(task: &str, result: &Result<ChainOutcome>) -> Option<String> {
    match result {
        Ok(outcome) => match &outcome.state {
            ChainState::Failed { index } => {
                let detail = outcome
                    .first_failure()
                    .map(|failure| {
                        let connections = failure.connections.join(", ");
                        match &failure.error {
                            Some(err) => format!("connection(s) {}: {}", connections, err),
                            None => format!("connection(s) {}", connections),
                        }
                    })
                    .unwrap_or_else(|| "no failure detail recorded".to_string());
                Some(format!(
                    "Task '{}' failed at statement {} - {}",
                    task,
                    index + 1,
                    detail
                ))
            }
            ChainState::Cancelled { completed } => Some(format!(
                "Task '{}' cancelled after {} statement(s)",
                task, completed
            )),
            _ => None,
        },
        Err(err) => Some(format!("Task '{}' could not start: {}", task, err)),
    }
}
