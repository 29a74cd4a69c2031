// Driver Port
// Abstraction over concrete database engines. Dialect differences (SQL
// syntax, placeholders, identifier quoting) are fully contained in the
// driver; the engine only sequences statements and moves rows.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::{Batch, ConnectionDescriptor, Row};

/// Errors surfaced by a concrete driver.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The target could not be opened (missing file, unreachable host,
    /// refused credentials).
    #[error("connect failed: {0}")]
    Connect(String),

    /// A statement or query was rejected by the database.
    #[error("{0}")]
    Sql(String),

    /// A result row could not be decoded into engine values.
    #[error("row decode failed: {0}")]
    Decode(String),
}

/// Factory for connections of one dialect.
#[async_trait]
pub trait SqlDriver: Send + Sync {
    /// Dialect identifier this driver serves (e.g. "sqlite").
    fn dialect(&self) -> &str;

    /// Open a live connection for the descriptor.
    ///
    /// Opening must fail if the target does not exist - the engine never
    /// creates databases implicitly.
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Arc<dyn SqlConnection>, DriverError>;
}

/// A live handle to one database, exclusively owned by a single run.
#[async_trait]
pub trait SqlConnection: Send + Sync + std::fmt::Debug {
    fn dialect(&self) -> &str;

    /// Begin an explicit transaction. The engine ties one transaction to
    /// each direct statement and to each transfer batch.
    async fn begin(&self) -> Result<Box<dyn SqlTransaction>, DriverError>;

    /// Stream the rows of a read query, forward-only, in batches of at most
    /// `batch_size` rows.
    ///
    /// Row order is whatever the engine yields. Callers must not rely on it
    /// for correctness - only the row count is guaranteed.
    fn stream_query(
        &self,
        sql: &str,
        batch_size: usize,
    ) -> mpsc::Receiver<Result<Batch, DriverError>>;

    /// Close the connection. Idempotent and infallible: drivers log internal
    /// close errors instead of surfacing them, so teardown can never mask a
    /// run's primary failure.
    async fn close(&self);
}

/// One explicit transaction on one connection.
#[async_trait]
pub trait SqlTransaction: Send {
    /// Execute a statement, returning the affected row count.
    async fn execute(&mut self, sql: &str) -> Result<u64, DriverError>;

    /// Insert rows into `table` verbatim, in column order, using
    /// parameterized statements.
    async fn insert_batch(&mut self, table: &str, rows: &[Row]) -> Result<u64, DriverError>;

    async fn commit(self: Box<Self>) -> Result<(), DriverError>;

    async fn rollback(self: Box<Self>) -> Result<(), DriverError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Observable state shared between a mock connection and its
    /// transactions. Only committed work lands in `executed` / `inserted`.
    #[derive(Default)]
    struct MockState {
        executed: Mutex<Vec<String>>,
        inserted: Mutex<Vec<Row>>,
        commits: Mutex<usize>,
        rollbacks: Mutex<usize>,
        closes: Mutex<usize>,
        insert_calls: Mutex<usize>,
        read_batches: Mutex<VecDeque<Result<Batch, DriverError>>>,
    }

    /// Scripted in-memory connection for engine tests.
    pub struct MockConnection {
        state: Arc<MockState>,
        fail_execute_on: Option<String>,
        fail_insert_on_call: Option<usize>,
        fail_begin: bool,
    }

    impl std::fmt::Debug for MockConnection {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockConnection").finish_non_exhaustive()
        }
    }

    impl MockConnection {
        pub fn new() -> Self {
            Self {
                state: Arc::new(MockState::default()),
                fail_execute_on: None,
                fail_insert_on_call: None,
                fail_begin: false,
            }
        }

        /// Queue batches for the next `stream_query` call.
        pub fn with_read_batches(self, batches: Vec<Batch>) -> Self {
            {
                let mut queue = self.state.read_batches.lock().unwrap();
                for batch in batches {
                    queue.push_back(Ok(batch));
                }
            }
            self
        }

        /// Queue a read-side error after the already-queued batches.
        pub fn with_read_error(self, detail: impl Into<String>) -> Self {
            self.state
                .read_batches
                .lock()
                .unwrap()
                .push_back(Err(DriverError::Sql(detail.into())));
            self
        }

        /// Fail `execute` for statements containing the given fragment.
        pub fn fail_execute_on(mut self, fragment: impl Into<String>) -> Self {
            self.fail_execute_on = Some(fragment.into());
            self
        }

        /// Fail the n-th `insert_batch` call (zero-based).
        pub fn fail_insert_on_call(mut self, call: usize) -> Self {
            self.fail_insert_on_call = Some(call);
            self
        }

        pub fn fail_begin(mut self) -> Self {
            self.fail_begin = true;
            self
        }

        pub fn executed(&self) -> Vec<String> {
            self.state.executed.lock().unwrap().clone()
        }

        pub fn inserted_rows(&self) -> Vec<Row> {
            self.state.inserted.lock().unwrap().clone()
        }

        pub fn commit_count(&self) -> usize {
            *self.state.commits.lock().unwrap()
        }

        pub fn rollback_count(&self) -> usize {
            *self.state.rollbacks.lock().unwrap()
        }

        pub fn close_count(&self) -> usize {
            *self.state.closes.lock().unwrap()
        }
    }

    impl Default for MockConnection {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl SqlConnection for MockConnection {
        fn dialect(&self) -> &str {
            "mock"
        }

        async fn begin(&self) -> Result<Box<dyn SqlTransaction>, DriverError> {
            if self.fail_begin {
                return Err(DriverError::Sql("begin refused".to_string()));
            }
            Ok(Box::new(MockTransaction {
                state: Arc::clone(&self.state),
                fail_execute_on: self.fail_execute_on.clone(),
                fail_insert_on_call: self.fail_insert_on_call,
                pending_sql: Vec::new(),
                pending_rows: Vec::new(),
            }))
        }

        fn stream_query(
            &self,
            _sql: &str,
            _batch_size: usize,
        ) -> mpsc::Receiver<Result<Batch, DriverError>> {
            let (tx, rx) = mpsc::channel(8);
            let items: Vec<_> = self
                .state
                .read_batches
                .lock()
                .unwrap()
                .drain(..)
                .collect();
            tokio::spawn(async move {
                for item in items {
                    if tx.send(item).await.is_err() {
                        break;
                    }
                }
            });
            rx
        }

        async fn close(&self) {
            *self.state.closes.lock().unwrap() += 1;
        }
    }

    struct MockTransaction {
        state: Arc<MockState>,
        fail_execute_on: Option<String>,
        fail_insert_on_call: Option<usize>,
        pending_sql: Vec<String>,
        pending_rows: Vec<Row>,
    }

    #[async_trait]
    impl SqlTransaction for MockTransaction {
        async fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
            if let Some(fragment) = &self.fail_execute_on {
                if sql.contains(fragment.as_str()) {
                    return Err(DriverError::Sql(format!("rejected statement: {}", sql)));
                }
            }
            self.pending_sql.push(sql.to_string());
            Ok(1)
        }

        async fn insert_batch(&mut self, _table: &str, rows: &[Row]) -> Result<u64, DriverError> {
            let call = {
                let mut calls = self.state.insert_calls.lock().unwrap();
                let current = *calls;
                *calls += 1;
                current
            };
            if self.fail_insert_on_call == Some(call) {
                return Err(DriverError::Sql("constraint violation".to_string()));
            }
            self.pending_rows.extend(rows.iter().cloned());
            Ok(rows.len() as u64)
        }

        async fn commit(self: Box<Self>) -> Result<(), DriverError> {
            let MockTransaction {
                state,
                pending_sql,
                pending_rows,
                ..
            } = *self;
            state.executed.lock().unwrap().extend(pending_sql);
            state.inserted.lock().unwrap().extend(pending_rows);
            *state.commits.lock().unwrap() += 1;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), DriverError> {
            *self.state.rollbacks.lock().unwrap() += 1;
            Ok(())
        }
    }

    /// Mock driver that hands out pre-built connections in open order.
    pub struct MockDriver {
        dialect: String,
        outcomes: Mutex<VecDeque<Result<Arc<dyn SqlConnection>, DriverError>>>,
    }

    impl MockDriver {
        pub fn new(dialect: impl Into<String>) -> Self {
            Self {
                dialect: dialect.into(),
                outcomes: Mutex::new(VecDeque::new()),
            }
        }

        pub fn push_connection(&self, connection: Arc<dyn SqlConnection>) {
            self.outcomes.lock().unwrap().push_back(Ok(connection));
        }

        pub fn push_failure(&self, detail: impl Into<String>) {
            self.outcomes
                .lock()
                .unwrap()
                .push_back(Err(DriverError::Connect(detail.into())));
        }
    }

    #[async_trait]
    impl SqlDriver for MockDriver {
        fn dialect(&self) -> &str {
            &self.dialect
        }

        async fn open(
            &self,
            _descriptor: &ConnectionDescriptor,
        ) -> Result<Arc<dyn SqlConnection>, DriverError> {
            let next = self.outcomes.lock().unwrap().pop_front();
            match next {
                Some(outcome) => outcome,
                None => Ok(Arc::new(MockConnection::new())),
            }
        }
    }
}
