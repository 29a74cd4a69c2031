// Execution Engine - walks a statement chain strictly in order
//
// Each direct statement runs inside its own transaction on its connection;
// each transfer commits per batch. Commits applied before a failing
// statement remain committed: there is no chain-wide rollback. This is the
// documented contract, not an accident - earlier steps of a chain persist
// even when a later step fails.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::cancel::CancelToken;
use crate::application::registry::ConnectionRegistry;
use crate::application::transfer::{self, DEFAULT_TRANSFER_BATCH_SIZE};
use crate::domain::{
    ChainOutcome, ChainState, Statement, StatementChain, StatementOutcome, StatementStatus,
};
use crate::error::StatementError;
use crate::port::{DriverError, SqlConnection};

/// Runs one statement chain against an opened connection registry.
pub struct ChainExecutor<'a> {
    registry: &'a ConnectionRegistry,
    batch_size: usize,
    cancel: Option<CancelToken>,
}

impl<'a> ChainExecutor<'a> {
    pub fn new(registry: &'a ConnectionRegistry) -> Self {
        Self {
            registry,
            batch_size: DEFAULT_TRANSFER_BATCH_SIZE,
            cancel: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the chain: one linear pass, halting at the first failure.
    ///
    /// Statement failures are recovered into the outcome; statements after
    /// the failing index are never attempted and produce no outcome entry.
    pub async fn run(&self, task: &str, chain: &StatementChain) -> ChainOutcome {
        let mut outcome = ChainOutcome {
            task: task.to_string(),
            state: ChainState::Pending,
            statements: Vec::new(),
        };

        for (index, statement) in chain.statements().iter().enumerate() {
            if let Some(token) = &self.cancel {
                if token.is_cancelled() {
                    warn!(task, index, "Run cancelled; remaining statements skipped");
                    outcome.state = ChainState::Cancelled { completed: index };
                    return outcome;
                }
            }

            outcome.state = ChainState::Running { index };
            info!(task, index, kind = statement.kind(), "Executing statement");

            let connections: Vec<String> = statement
                .connection_names()
                .into_iter()
                .map(str::to_string)
                .collect();

            match self.run_statement(statement).await {
                Ok(rows_affected) => {
                    outcome.statements.push(StatementOutcome {
                        index,
                        connections,
                        status: StatementStatus::Succeeded,
                        rows_affected,
                        error: None,
                    });
                }
                Err(err) => {
                    error!(task, index, error = %err, "Statement failed; halting chain");
                    outcome.statements.push(StatementOutcome {
                        index,
                        connections,
                        status: StatementStatus::Failed,
                        rows_affected: None,
                        error: Some(err),
                    });
                    outcome.state = ChainState::Failed { index };
                    return outcome;
                }
            }
        }

        outcome.state = ChainState::Succeeded;
        info!(task, statements = chain.len(), "Chain completed");
        outcome
    }

    async fn run_statement(&self, statement: &Statement) -> Result<Option<u64>, StatementError> {
        match statement {
            Statement::Direct { connection, sql } => {
                let conn = self.resolve(connection)?;
                let rows = run_direct(connection, conn.as_ref(), sql).await?;
                Ok(Some(rows))
            }
            Statement::Transfer {
                source,
                query,
                target,
                table,
            } => {
                let read = self.resolve(source)?;
                let write = self.resolve(target)?;
                let rows = transfer::transfer_rows(
                    source,
                    read.as_ref(),
                    query,
                    target,
                    write.as_ref(),
                    table,
                    self.batch_size,
                )
                .await?;
                Ok(Some(rows))
            }
        }
    }

    fn resolve(&self, name: &str) -> Result<&Arc<dyn SqlConnection>, StatementError> {
        self.registry
            .get(name)
            .ok_or_else(|| StatementError::ConnectionMissing {
                connection: name.to_string(),
            })
    }
}

/// Execute one direct statement inside its own transaction: begin, execute,
/// commit - or roll back on error.
async fn run_direct(
    name: &str,
    connection: &dyn SqlConnection,
    sql: &str,
) -> Result<u64, StatementError> {
    let mut tx = connection
        .begin()
        .await
        .map_err(|e| sql_failure(name, e))?;

    match tx.execute(sql).await {
        Ok(rows) => {
            tx.commit().await.map_err(|e| sql_failure(name, e))?;
            Ok(rows)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(connection = %name, error = %rollback_err, "Rollback failed");
            }
            Err(sql_failure(name, err))
        }
    }
}

fn sql_failure(connection: &str, err: DriverError) -> StatementError {
    StatementError::Sql {
        connection: connection.to_string(),
        detail: err.to_string(),
    }
}
