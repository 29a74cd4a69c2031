// Run Outcomes and the Chain State Machine

use crate::error::StatementError;

/// Terminal status of one attempted statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementStatus {
    Succeeded,
    Failed,
}

/// Outcome of one attempted statement.
///
/// Statements after a failing index are never attempted and therefore have
/// no outcome: absence means "not attempted", not "succeeded silently".
#[derive(Debug)]
pub struct StatementOutcome {
    /// Zero-based chain index.
    pub index: usize,
    /// Connection names the statement touched, read side first.
    pub connections: Vec<String>,
    pub status: StatementStatus,
    /// Rows affected or transferred, where the driver reports one.
    pub rows_affected: Option<u64>,
    pub error: Option<StatementError>,
}

/// Linear run state: one pass, no retries, no backtracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainState {
    Pending,
    Running { index: usize },
    Succeeded,
    Failed { index: usize },
    /// The run was cancelled between statements; `completed` statements had
    /// already finished (and stay committed).
    Cancelled { completed: usize },
}

impl ChainState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChainState::Succeeded | ChainState::Failed { .. } | ChainState::Cancelled { .. }
        )
    }
}

impl std::fmt::Display for ChainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainState::Pending => write!(f, "PENDING"),
            ChainState::Running { index } => write!(f, "RUNNING({})", index),
            ChainState::Succeeded => write!(f, "SUCCEEDED"),
            ChainState::Failed { index } => write!(f, "FAILED({})", index),
            ChainState::Cancelled { completed } => write!(f, "CANCELLED({})", completed),
        }
    }
}

/// Aggregated outcome of one chain run.
///
/// Owned by a single invocation and discarded once the exit status is
/// reported; the only persistence is whatever the executed SQL left behind.
#[derive(Debug)]
pub struct ChainOutcome {
    pub task: String,
    pub state: ChainState,
    /// Outcomes of the attempted statements, in execution order.
    pub statements: Vec<StatementOutcome>,
}

impl ChainOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.state, ChainState::Succeeded)
    }

    pub fn first_failure(&self) -> Option<&StatementOutcome> {
        self.statements
            .iter()
            .find(|outcome| outcome.status == StatementStatus::Failed)
    }
}
