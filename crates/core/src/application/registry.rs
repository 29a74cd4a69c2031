// Connection Registry - opens and owns the run's connections

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::RunConfig;
use crate::domain::ConnectionDescriptor;
use crate::error::{EngineError, Result};
use crate::port::{SqlConnection, SqlDriver};

/// Maps dialect identifiers to driver implementations.
///
/// The composition root registers the drivers it ships; the engine never
/// constructs a driver itself.
#[derive(Default, Clone)]
pub struct DriverCatalog {
    drivers: BTreeMap<String, Arc<dyn SqlDriver>>,
}

impl DriverCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, driver: Arc<dyn SqlDriver>) {
        self.drivers.insert(driver.dialect().to_string(), driver);
    }

    pub fn get(&self, dialect: &str) -> Option<&Arc<dyn SqlDriver>> {
        self.drivers.get(dialect)
    }
}

/// Live connections for one run, opened eagerly before any statement.
///
/// Each connection is exclusively owned by this run and closed exactly once
/// at run end, success or failure.
pub struct ConnectionRegistry {
    connections: BTreeMap<String, Arc<dyn SqlConnection>>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ConnectionRegistry {
    /// Open every declared connection, fail-fast.
    ///
    /// If any open fails the whole run aborts before a single statement
    /// executes; connections opened so far are closed before returning.
    pub async fn open_all(config: &RunConfig, catalog: &DriverCatalog) -> Result<Self> {
        let mut connections: BTreeMap<String, Arc<dyn SqlConnection>> = BTreeMap::new();

        for (name, descriptor) in &config.connections {
            match open_one(name, descriptor, catalog).await {
                Ok(connection) => {
                    connections.insert(name.clone(), connection);
                }
                Err(err) => {
                    let partial = Self { connections };
                    partial.close_all().await;
                    return Err(err);
                }
            }
        }

        Ok(Self { connections })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SqlConnection>> {
        self.connections.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    /// Close every connection. Safe to call more than once and never fails:
    /// drivers absorb close errors, so teardown cannot mask the run's
    /// primary failure.
    pub async fn close_all(&self) {
        for (name, connection) in &self.connections {
            debug!(connection = %name, "Closing connection");
            connection.close().await;
        }
    }
}

async fn open_one(
    name: &str,
    descriptor: &ConnectionDescriptor,
    catalog: &DriverCatalog,
) -> Result<Arc<dyn SqlConnection>> {
    let driver = catalog
        .get(&descriptor.dialect)
        .ok_or_else(|| EngineError::UnsupportedDialect {
            dialect: descriptor.dialect.clone(),
            name: name.to_string(),
        })?;

    debug!(
        connection = %name,
        dialect = %descriptor.dialect,
        location = %descriptor.location(),
        "Opening connection"
    );

    driver
        .open(descriptor)
        .await
        .map_err(|e| EngineError::Connection {
            name: name.to_string(),
            detail: e.to_string(),
        })
}
