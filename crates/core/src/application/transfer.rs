// Cross-Connection Transfer Strategy
//
// Streams rows from the read side and batch-inserts them on the write side
// with parameterized statements, because a single-engine
// "INSERT INTO ... SELECT ..." is unavailable across connections.
//
// Commit granularity is the batch: a failure mid-transfer leaves the
// destination holding zero or whole committed batches, never a partial one.
// The read and write commits are still independent - there is no
// distributed transaction - so a process crash between them can leave the
// destination short of rows relative to the source.

use tracing::debug;

use crate::error::{StatementError, TransferSide};
use crate::port::{DriverError, SqlConnection};

/// Rows per insert batch unless overridden by engine options. Bounds memory
/// for large transfers.
pub const DEFAULT_TRANSFER_BATCH_SIZE: usize = 5_000;

/// Move every row produced by `query` on `source` into `table` on `target`.
///
/// Returns the number of rows inserted, which equals the number of rows the
/// read query yielded - the engine's row count contract. Row order is the
/// server's natural order and is not part of the contract.
pub async fn transfer_rows(
    source_name: &str,
    source: &dyn SqlConnection,
    query: &str,
    target_name: &str,
    target: &dyn SqlConnection,
    table: &str,
    batch_size: usize,
) -> Result<u64, StatementError> {
    let mut stream = source.stream_query(query, batch_size.max(1));
    let mut rows_moved: u64 = 0;
    let mut batches: u64 = 0;

    while let Some(read) = stream.recv().await {
        let batch = read.map_err(|e| read_failure(source_name, e))?;
        if batch.is_empty() {
            continue;
        }

        let mut tx = target
            .begin()
            .await
            .map_err(|e| write_failure(target_name, e))?;

        match tx.insert_batch(table, &batch).await {
            Ok(inserted) => {
                tx.commit()
                    .await
                    .map_err(|e| write_failure(target_name, e))?;
                rows_moved += inserted;
                batches += 1;
            }
            Err(err) => {
                // Keep the destination at a batch boundary.
                if let Err(rollback_err) = tx.rollback().await {
                    debug!(
                        connection = %target_name,
                        error = %rollback_err,
                        "Rollback after failed batch insert also failed"
                    );
                }
                return Err(write_failure(target_name, err));
            }
        }
    }

    debug!(
        source = %source_name,
        target = %target_name,
        table = %table,
        rows = rows_moved,
        batches,
        "Transfer complete"
    );
    Ok(rows_moved)
}

fn read_failure(connection: &str, err: DriverError) -> StatementError {
    StatementError::Transfer {
        side: TransferSide::Read,
        connection: connection.to_string(),
        detail: err.to_string(),
    }
}

fn write_failure(connection: &str, err: DriverError) -> StatementError {
    StatementError::Transfer {
        side: TransferSide::Write,
        connection: connection.to_string(),
        detail: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Row, SqlValue};
    use crate::port::driver::mocks::MockConnection;

    fn row(n: i64) -> Row {
        vec![SqlValue::Integer(n), SqlValue::Text(format!("row-{}", n))]
    }

    #[tokio::test]
    async fn test_every_read_row_is_inserted() {
        let source =
            MockConnection::new().with_read_batches(vec![vec![row(1), row(2)], vec![row(3)]]);
        let target = MockConnection::new();

        let moved = transfer_rows("src", &source, "SELECT * FROM t", "dst", &target, "t_copy", 2)
            .await
            .unwrap();

        assert_eq!(moved, 3);
        assert_eq!(target.inserted_rows().len(), 3);
        // One commit per batch.
        assert_eq!(target.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_rows_is_a_successful_transfer() {
        let source = MockConnection::new();
        let target = MockConnection::new();

        let moved = transfer_rows("src", &source, "SELECT * FROM t", "dst", &target, "t_copy", 10)
            .await
            .unwrap();

        assert_eq!(moved, 0);
        assert_eq!(target.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_read_error_carries_the_read_side() {
        let source = MockConnection::new()
            .with_read_batches(vec![vec![row(1)]])
            .with_read_error("no such table: t");
        let target = MockConnection::new();

        let err = transfer_rows("src", &source, "SELECT * FROM t", "dst", &target, "t_copy", 10)
            .await
            .unwrap_err();

        match err {
            StatementError::Transfer {
                side, connection, ..
            } => {
                assert_eq!(side, TransferSide::Read);
                assert_eq!(connection, "src");
            }
            other => panic!("expected transfer error, got {:?}", other),
        }
        // The batch before the error was already committed.
        assert_eq!(target.inserted_rows().len(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_leaves_whole_batches_only() {
        let source = MockConnection::new()
            .with_read_batches(vec![vec![row(1), row(2)], vec![row(3), row(4)]]);
        let target = MockConnection::new().fail_insert_on_call(1);

        let err = transfer_rows("src", &source, "SELECT * FROM t", "dst", &target, "t_copy", 2)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StatementError::Transfer {
                side: TransferSide::Write,
                ..
            }
        ));
        // First batch committed whole, second rolled back whole.
        assert_eq!(target.inserted_rows().len(), 2);
        assert_eq!(target.commit_count(), 1);
        assert_eq!(target.rollback_count(), 1);
    }
}
