// SQLite Driver - opens file-backed connections

use std::sync::Arc;

use async_trait::async_trait;

use sqlpipe_core::domain::ConnectionDescriptor;
use sqlpipe_core::port::{DriverError, SqlConnection, SqlDriver};

use crate::connection::SqliteChainConnection;

/// Driver for the "sqlite" dialect.
pub struct SqliteDriver;

#[async_trait]
impl SqlDriver for SqliteDriver {
    fn dialect(&self) -> &str {
        "sqlite"
    }

    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Arc<dyn SqlConnection>, DriverError> {
        let path = descriptor.path.as_ref().ok_or_else(|| {
            DriverError::Connect("sqlite connections require a file path".to_string())
        })?;
        let connection = SqliteChainConnection::open(path).await?;
        Ok(Arc::new(connection))
    }
}
