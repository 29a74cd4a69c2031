// Run Configuration - loading, lowering, path resolution

mod types;
mod validation;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{ConnectionDescriptor, Statement, StatementChain};
use crate::error::{EngineError, Result};

use types::{RawConfig, RawStatement};

/// The resolved, in-memory configuration for one invocation: a mapping of
/// logical connection names to descriptors, and of task names to statement
/// chains.
///
/// Logical names are map keys and therefore unique. The file loader treats
/// names case-insensitively and normalizes them to lowercase.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub connections: BTreeMap<String, ConnectionDescriptor>,
    pub tasks: BTreeMap<String, StatementChain>,
}

impl RunConfig {
    /// Load a configuration file (TOML, YAML, or JSON by extension).
    ///
    /// Every relative path inside the file - database files, SQL files -
    /// resolves against the configuration file's own parent directory,
    /// never against the process working directory. SQL files are read
    /// here, so a loaded `RunConfig` is self-contained.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;

        let raw: RawConfig = settings
            .try_deserialize()
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;

        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let loaded = Self::lower(raw, base)?;
        loaded.validate()?;
        debug!(
            connections = loaded.connections.len(),
            tasks = loaded.tasks.len(),
            "Configuration loaded"
        );
        Ok(loaded)
    }

    fn lower(raw: RawConfig, base: &Path) -> Result<Self> {
        let mut connections = BTreeMap::new();
        for (name, connection) in raw.connections {
            connections.insert(
                name,
                ConnectionDescriptor {
                    dialect: connection.dialect,
                    path: connection.path.map(|p| resolve(base, p)),
                    url: connection.url,
                },
            );
        }

        let mut tasks = BTreeMap::new();
        for (name, task) in raw.tasks {
            let mut statements = Vec::with_capacity(task.statements.len());
            for statement in task.statements {
                statements.push(lower_statement(statement, base)?);
            }
            let chain = StatementChain::new(statements)
                .map_err(|e| EngineError::Config(format!("task '{}': {}", name, e)))?;
            tasks.insert(name, chain);
        }

        Ok(Self { connections, tasks })
    }
}

fn lower_statement(raw: RawStatement, base: &Path) -> Result<Statement> {
    let statement = match raw {
        RawStatement::DirectInline { connection, sql } => Statement::Direct { connection, sql },
        RawStatement::DirectFile {
            connection,
            sql_file,
        } => Statement::Direct {
            connection,
            sql: read_sql_file(base, &sql_file)?,
        },
        RawStatement::TransferInline {
            from,
            query,
            to,
            table,
        } => Statement::Transfer {
            source: from,
            query,
            target: to,
            table,
        },
        RawStatement::TransferFile {
            from,
            query_file,
            to,
            table,
        } => Statement::Transfer {
            source: from,
            query: read_sql_file(base, &query_file)?,
            target: to,
            table,
        },
    };
    Ok(statement)
}

fn read_sql_file(base: &Path, file: &Path) -> Result<String> {
    let resolved = resolve(base, file.to_path_buf());
    std::fs::read_to_string(&resolved).map_err(|e| {
        EngineError::Config(format!("failed to read SQL file {}: {}", resolved.display(), e))
    })
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
