// Statement Chain Model

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};

/// One entry of a statement chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Raw SQL executed on a single connection, inside its own transaction.
    Direct { connection: String, sql: String },

    /// Cross-connection row movement: run `query` on `source` and insert
    /// every yielded row into `table` on `target`.
    Transfer {
        source: String,
        query: String,
        target: String,
        table: String,
    },
}

impl Statement {
    /// Connection names this statement touches, read side first.
    pub fn connection_names(&self) -> Vec<&str> {
        match self {
            Statement::Direct { connection, .. } => vec![connection.as_str()],
            Statement::Transfer { source, target, .. } => {
                vec![source.as_str(), target.as_str()]
            }
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Direct { .. } => "direct",
            Statement::Transfer { .. } => "transfer",
        }
    }
}

/// The ordered list of statements for one task invocation.
///
/// Execution order is exactly list order: no reordering, no parallelism, no
/// dependency inference between entries. The chain is never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementChain(Vec<Statement>);

impl StatementChain {
    pub fn new(statements: Vec<Statement>) -> Result<Self> {
        if statements.is_empty() {
            return Err(DomainError::EmptyChain);
        }
        Ok(Self(statements))
    }

    pub fn statements(&self) -> &[Statement] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
