// SQLite Transaction Implementation
// One explicit transaction per direct statement or transfer batch.

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

use sqlpipe_core::domain::{Row, SqlValue};
use sqlpipe_core::port::{DriverError, SqlTransaction};

pub struct SqliteChainTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteChainTransaction {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl SqlTransaction for SqliteChainTransaction {
    async fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        let result = sqlx::query(sql)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn insert_batch(&mut self, table: &str, rows: &[Row]) -> Result<u64, DriverError> {
        let Some(first) = rows.first() else {
            return Ok(0);
        };
        validate_identifier(table)?;

        let placeholders = vec!["?"; first.len()].join(", ");
        let insert = format!("INSERT INTO {} VALUES ({})", quote_ident(table), placeholders);

        for row in rows {
            if row.len() != first.len() {
                return Err(DriverError::Sql(format!(
                    "row width mismatch: expected {} columns, got {}",
                    first.len(),
                    row.len()
                )));
            }
            let mut query = sqlx::query(&insert);
            for value in row {
                query = match value {
                    SqlValue::Null => query.bind(None::<i64>),
                    SqlValue::Integer(v) => query.bind(*v),
                    SqlValue::Real(v) => query.bind(*v),
                    SqlValue::Text(v) => query.bind(v.as_str()),
                    SqlValue::Blob(v) => query.bind(v.as_slice()),
                };
            }
            query
                .execute(&mut *self.tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        Ok(rows.len() as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), DriverError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), DriverError> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

/// Quote an identifier for SQLite: double quotes, embedded quotes doubled.
/// Identifiers cannot be bound as parameters, so the destination table name
/// has to be spliced into the INSERT text.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn validate_identifier(name: &str) -> Result<(), DriverError> {
    if name.is_empty() {
        return Err(DriverError::Sql("table name cannot be empty".to_string()));
    }
    if name.contains('\0') {
        return Err(DriverError::Sql(format!(
            "table name contains a null byte: {:?}",
            name
        )));
    }
    Ok(())
}

// Helper to convert sqlx::Error to DriverError with the sqlite result code
// kept visible. Codes: https://www.sqlite.org/rescode.html
fn map_sqlx_error(err: sqlx::Error) -> DriverError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("1555") | Some("2067") => DriverError::Sql(format!(
                "unique constraint violation: {}",
                db_err.message()
            )),
            Some("787") => DriverError::Sql(format!(
                "foreign key constraint violation: {}",
                db_err.message()
            )),
            Some("5") => {
                DriverError::Sql(format!("database is locked: {}", db_err.message()))
            }
            Some(code) => DriverError::Sql(format!("[{}] {}", code, db_err.message())),
            None => DriverError::Sql(db_err.message().to_string()),
        },
        _ => DriverError::Sql(err.to_string()),
    }
}
