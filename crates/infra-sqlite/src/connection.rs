// SQLite Connection backed by a sqlx pool
//
// A small pool (not a single handle) so a streaming read and a concurrent
// write transaction on the same database file do not contend for one
// handle during same-connection transfers.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row as _, TypeInfo, ValueRef};
use tokio::sync::mpsc;
use tracing::debug;

use sqlpipe_core::domain::{Batch, Row, SqlValue};
use sqlpipe_core::port::{DriverError, SqlConnection, SqlTransaction};

use crate::transaction::SqliteChainTransaction;

/// A live SQLite database handle.
pub struct SqliteChainConnection {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteChainConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteChainConnection")
            .finish_non_exhaustive()
    }
}

impl SqliteChainConnection {
    /// Open an existing database file with WAL mode and a busy timeout.
    ///
    /// Missing files are an error: the engine never creates databases
    /// implicitly, so a typo in a path fails the run instead of silently
    /// materializing an empty database.
    pub async fn open(path: &Path) -> Result<Self, DriverError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| DriverError::Connect(format!("{}: {}", path.display(), e)))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SqlConnection for SqliteChainConnection {
    fn dialect(&self) -> &str {
        "sqlite"
    }

    async fn begin(&self) -> Result<Box<dyn SqlTransaction>, DriverError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DriverError::Sql(e.to_string()))?;
        Ok(Box::new(SqliteChainTransaction::new(tx)))
    }

    fn stream_query(
        &self,
        sql: &str,
        batch_size: usize,
    ) -> mpsc::Receiver<Result<Batch, DriverError>> {
        // Channel capacity of 2 batches gives the writer read-ahead while
        // keeping memory bounded by batch size.
        let (tx, rx) = mpsc::channel(2);
        let pool = self.pool.clone();
        let sql = sql.to_string();
        let batch_size = batch_size.max(1);

        tokio::spawn(async move {
            let mut stream = sqlx::query(&sql).fetch(&pool);
            let mut batch: Batch = Vec::with_capacity(batch_size);

            while let Some(next) = stream.next().await {
                let decoded = next
                    .map_err(|e| DriverError::Sql(e.to_string()))
                    .and_then(|row| decode_row(&row));

                match decoded {
                    Ok(row) => {
                        batch.push(row);
                        if batch.len() >= batch_size {
                            let full = std::mem::replace(
                                &mut batch,
                                Vec::with_capacity(batch_size),
                            );
                            if tx.send(Ok(full)).await.is_err() {
                                // Receiver dropped; stop reading.
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(Err(err)).await;
                        return;
                    }
                }
            }

            if !batch.is_empty() {
                let _ = tx.send(Ok(batch)).await;
            }
        });

        rx
    }

    async fn close(&self) {
        // sqlx pools close idempotently; a second call is a no-op.
        debug!("Closing sqlite pool");
        self.pool.close().await;
    }
}

/// Decode one sqlx row into engine values using SQLite's storage classes.
fn decode_row(row: &SqliteRow) -> Result<Row, DriverError> {
    let mut values = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        let raw = row
            .try_get_raw(index)
            .map_err(|e| DriverError::Decode(e.to_string()))?;

        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => SqlValue::Integer(decoded(row, index)?),
                "REAL" => SqlValue::Real(decoded(row, index)?),
                "BLOB" => SqlValue::Blob(decoded(row, index)?),
                // TEXT and declared affinities sqlite stores as text.
                _ => SqlValue::Text(decoded(row, index)?),
            }
        };
        values.push(value);
    }
    Ok(values)
}

fn decoded<'r, T>(row: &'r SqliteRow, index: usize) -> Result<T, DriverError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get::<T, _>(index)
        .map_err(|e| DriverError::Decode(format!("column {}: {}", index, e)))
}
