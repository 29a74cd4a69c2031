// Shared fixtures: throwaway SQLite databases seeded with the album tables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use sqlpipe_core::application::{ChainRunner, DriverCatalog};
use sqlpipe_core::config::RunConfig;
use sqlpipe_core::domain::{ConnectionDescriptor, Statement, StatementChain};
use sqlpipe_infra_sqlite::SqliteDriver;

pub const ALBUM_COLUMNS: &str =
    "(title text, artist text, release_date text, publisher text, media_type text)";

pub fn runner() -> ChainRunner {
    let mut catalog = DriverCatalog::new();
    catalog.register(Arc::new(SqliteDriver));
    ChainRunner::new(catalog)
}

/// Fresh database path under the system temp dir; any previous file is
/// removed so each test starts from a clean database.
pub fn temp_db_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("sqlpipe_it_{}.sqlite", name));
    let _ = std::fs::remove_file(&path);
    path
}

pub async fn create_db(path: &Path) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .unwrap()
}

/// Create `albums_src` with 4 seed rows and an empty `albums_dest`.
/// Returns the seed row count.
pub async fn prepare_src_and_dest_tables(pool: &SqlitePool) -> i64 {
    sqlx::query(&format!("CREATE TABLE albums_src {}", ALBUM_COLUMNS))
        .execute(pool)
        .await
        .unwrap();

    let albums = [
        ("Exodus", "Andy Hunter", "7/9/2002", "Sparrow Records", "CD"),
        (
            "Until We Have Faces",
            "Red",
            "2/1/2011",
            "Essential Records",
            "CD",
        ),
        (
            "The End is Where We Begin",
            "Thousand Foot Krutch",
            "4/17/2012",
            "TFKmusic",
            "CD",
        ),
        (
            "The Good Life",
            "Trip Lee",
            "4/10/2012",
            "Reach Records",
            "CD",
        ),
    ];
    for (title, artist, release_date, publisher, media_type) in albums {
        sqlx::query("INSERT INTO albums_src VALUES (?, ?, ?, ?, ?)")
            .bind(title)
            .bind(artist)
            .bind(release_date)
            .bind(publisher)
            .bind(media_type)
            .execute(pool)
            .await
            .unwrap();
    }

    sqlx::query(&format!("CREATE TABLE albums_dest {}", ALBUM_COLUMNS))
        .execute(pool)
        .await
        .unwrap();

    albums.len() as i64
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT count(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn sqlite_connection(path: &Path) -> ConnectionDescriptor {
    ConnectionDescriptor {
        dialect: "sqlite".to_string(),
        path: Some(path.to_path_buf()),
        url: None,
    }
}

/// Build an in-memory configuration with one task.
pub fn config_for_task(
    connections: Vec<(&str, ConnectionDescriptor)>,
    task: &str,
    statements: Vec<Statement>,
) -> RunConfig {
    let mut connection_map = BTreeMap::new();
    for (name, descriptor) in connections {
        connection_map.insert(name.to_string(), descriptor);
    }
    let mut tasks = BTreeMap::new();
    tasks.insert(
        task.to_string(),
        StatementChain::new(statements).unwrap(),
    );
    RunConfig {
        connections: connection_map,
        tasks,
    }
}

pub fn direct(connection: &str, sql: &str) -> Statement {
    Statement::Direct {
        connection: connection.to_string(),
        sql: sql.to_string(),
    }
}

pub fn transfer(source: &str, query: &str, target: &str, table: &str) -> Statement {
    Statement::Transfer {
        source: source.to_string(),
        query: query.to_string(),
        target: target.to_string(),
        table: table.to_string(),
    }
}
