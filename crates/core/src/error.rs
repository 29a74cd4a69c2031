// Central Error Types for the Engine

use thiserror::Error;

/// Fatal, pre-execution failures of a run.
///
/// These abort the run before (or while) connections are opened: no
/// statement executes and no side effects are produced. Statement-level
/// failures are a different animal - they are recovered into a
/// [`ChainOutcome`](crate::domain::ChainOutcome) as [`StatementError`]s, and
/// only the reporter decides the process exit status.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown task '{0}'")]
    UnknownTask(String),

    #[error("Task '{task}', statement {}: unknown connection '{name}'", .index + 1)]
    UnknownConnection {
        task: String,
        /// Zero-based chain index; rendered 1-based for operators.
        index: usize,
        name: String,
    },

    #[error("Connection '{name}' could not be opened: {detail}")]
    Connection { name: String, detail: String },

    #[error("No driver registered for dialect '{dialect}' (connection '{name}')")]
    UnsupportedDialect { dialect: String, name: String },
}

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure of a single statement, recovered into the chain outcome.
///
/// Carries the originating connection name(s) so the reporter can point an
/// operator at the right database without reading logs.
#[derive(Error, Debug)]
pub enum StatementError {
    /// A direct statement failed; its transaction was rolled back.
    #[error("SQL execution failed on connection '{connection}': {detail}")]
    Sql { connection: String, detail: String },

    /// A transfer failed on its read or write side.
    #[error("Transfer failed on the {side} side (connection '{connection}'): {detail}")]
    Transfer {
        side: TransferSide,
        connection: String,
        detail: String,
    },

    /// A statement named a connection the registry does not hold.
    ///
    /// Pre-flight validation rejects these before anything runs; this
    /// variant exists so an unvalidated chain still fails loudly instead of
    /// panicking.
    #[error("Connection '{connection}' is not open")]
    ConnectionMissing { connection: String },
}

/// Which half of a transfer produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSide {
    Read,
    Write,
}

impl std::fmt::Display for TransferSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferSide::Read => write!(f, "read"),
            TransferSide::Write => write!(f, "write"),
        }
    }
}
