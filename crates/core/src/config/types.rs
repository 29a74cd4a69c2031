// Configuration File Shapes (raw serde model, before lowering)

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level file shape. Lowered into
/// [`RunConfig`](super::RunConfig) by the loader.
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub connections: BTreeMap<String, RawConnection>,
    pub tasks: BTreeMap<String, RawTask>,
}

#[derive(Debug, Deserialize)]
pub struct RawConnection {
    pub dialect: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawTask {
    pub statements: Vec<RawStatement>,
}

/// One configured statement.
///
/// Direct statements carry inline SQL or a path to a SQL file; transfers
/// name both sides. The variants are distinguished by their required keys.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawStatement {
    DirectInline {
        connection: String,
        sql: String,
    },
    DirectFile {
        connection: String,
        sql_file: PathBuf,
    },
    TransferInline {
        from: String,
        query: String,
        to: String,
        table: String,
    },
    TransferFile {
        from: String,
        query_file: PathBuf,
        to: String,
        table: String,
    },
}
