//! Cross-database transfer scenarios: two SQLite files, rows moved through
//! an intermediate table and back, plus the failure modes - unreachable
//! connections, bad transfer queries, undeclared connection names - and the
//! committed-before-failure contract.

mod common;

use common::*;
use sqlpipe_core::application::{exit_code, render_failure};
use sqlpipe_core::error::{EngineError, StatementError, TransferSide};

/// Rows travel A -> B (intermediate) -> A (destination); the final
/// destination count matches the original seed count.
#[tokio::test]
async fn test_statement_chain_between_databases() {
    let db_a = temp_db_path("chain_a");
    let db_b = temp_db_path("chain_b");

    let pool_a = create_db(&db_a).await;
    let pool_b = create_db(&db_b).await;

    let seeded = prepare_src_and_dest_tables(&pool_a).await;
    sqlx::query(&format!(
        "CREATE TABLE albums_intermediate {}",
        ALBUM_COLUMNS
    ))
    .execute(&pool_b)
    .await
    .unwrap();

    let config = config_for_task(
        vec![
            ("a", sqlite_connection(&db_a)),
            ("b", sqlite_connection(&db_b)),
        ],
        "b_to_a",
        vec![
            transfer("a", "SELECT * FROM albums_src", "b", "albums_intermediate"),
            transfer(
                "b",
                "SELECT * FROM albums_intermediate",
                "a",
                "albums_dest",
            ),
        ],
    );

    let result = runner().execute(&config, "b_to_a").await;

    let dest_count = count_rows(&pool_a, "albums_dest").await;
    assert_eq!(
        seeded, dest_count,
        "row count in albums_dest must equal the original albums_src count"
    );
    assert!(dest_count > 0);
    assert_eq!(count_rows(&pool_b, "albums_intermediate").await, seeded);
    assert_eq!(exit_code(&result), 0);

    pool_a.close().await;
    pool_b.close().await;
    std::fs::remove_file(&db_a).unwrap();
    std::fs::remove_file(&db_b).unwrap();
}

/// An unreachable source connection fails the run before any statement,
/// leaving the other declared connection untouched.
#[tokio::test]
async fn test_fails_on_invalid_src_connection() {
    let db_target = temp_db_path("invalid_src_target");
    let missing = temp_db_path("invalid_src_missing");

    let pool = create_db(&db_target).await;
    let seeded = prepare_src_and_dest_tables(&pool).await;

    let config = config_for_task(
        vec![
            ("source", sqlite_connection(&missing)),
            ("target", sqlite_connection(&db_target)),
        ],
        "invalid_src_connection",
        vec![transfer(
            "source",
            "SELECT * FROM albums_src",
            "target",
            "albums_dest",
        )],
    );

    let result = runner().execute(&config, "invalid_src_connection").await;

    assert_ne!(exit_code(&result), 0);
    assert!(matches!(
        result,
        Err(EngineError::Connection { ref name, .. }) if name == "source"
    ));
    // No side effects on the reachable connection.
    assert_eq!(count_rows(&pool, "albums_src").await, seeded);
    assert_eq!(count_rows(&pool, "albums_dest").await, 0);

    pool.close().await;
    std::fs::remove_file(&db_target).unwrap();
}

/// Same for the write side: every declared connection opens eagerly, so a
/// bad target path aborts the run up front.
#[tokio::test]
async fn test_fails_on_invalid_target_connection() {
    let db_source = temp_db_path("invalid_target_source");
    let missing = temp_db_path("invalid_target_missing");

    let pool = create_db(&db_source).await;
    prepare_src_and_dest_tables(&pool).await;
    pool.close().await;

    let config = config_for_task(
        vec![
            ("source", sqlite_connection(&db_source)),
            ("target", sqlite_connection(&missing)),
        ],
        "invalid_target_connection",
        vec![transfer(
            "source",
            "SELECT * FROM albums_src",
            "target",
            "albums_dest",
        )],
    );

    let result = runner().execute(&config, "invalid_target_connection").await;

    assert_ne!(exit_code(&result), 0);
    assert!(matches!(
        result,
        Err(EngineError::Connection { ref name, .. }) if name == "target"
    ));

    std::fs::remove_file(&db_source).unwrap();
}

/// A transfer whose read query is invalid fails on the read side and
/// leaves the destination empty.
#[tokio::test]
async fn test_fails_on_invalid_transfer_query() {
    let db_a = temp_db_path("bad_query_a");
    let db_b = temp_db_path("bad_query_b");

    let pool_a = create_db(&db_a).await;
    let pool_b = create_db(&db_b).await;
    prepare_src_and_dest_tables(&pool_b).await;
    pool_a.close().await;

    let config = config_for_task(
        vec![
            ("a", sqlite_connection(&db_a)),
            ("b", sqlite_connection(&db_b)),
        ],
        "invalid_sql",
        vec![transfer(
            "a",
            "SELECT * FROM no_such_table",
            "b",
            "albums_dest",
        )],
    );

    let result = runner().execute(&config, "invalid_sql").await;

    assert_ne!(exit_code(&result), 0);
    let outcome = result.unwrap();
    let failure = outcome.first_failure().unwrap();
    assert!(matches!(
        failure.error,
        Some(StatementError::Transfer {
            side: TransferSide::Read,
            ..
        })
    ));
    assert_eq!(count_rows(&pool_b, "albums_dest").await, 0);

    pool_b.close().await;
    std::fs::remove_file(&db_a).unwrap();
    std::fs::remove_file(&db_b).unwrap();
}

/// Statements committed before the failing index stay committed: there is
/// no chain-wide rollback, and statements after the failure never run.
#[tokio::test]
async fn test_committed_statements_persist_after_later_failure() {
    let db_path = temp_db_path("commit_persists");
    let pool = create_db(&db_path).await;
    let seeded = prepare_src_and_dest_tables(&pool).await;

    let config = config_for_task(
        vec![("main", sqlite_connection(&db_path))],
        "partial",
        vec![
            transfer("main", "SELECT * FROM albums_src", "main", "albums_dest"),
            direct("main", "SELCT broken"),
            direct("main", "DELETE FROM albums_dest"),
        ],
    );

    let result = runner().execute(&config, "partial").await;

    assert_ne!(exit_code(&result), 0);
    let outcome = result.unwrap();
    assert_eq!(outcome.first_failure().unwrap().index, 1);
    // Only statements 0 and 1 were attempted.
    assert_eq!(outcome.statements.len(), 2);
    // The transfer's rows survived the later failure; the DELETE never ran.
    assert_eq!(count_rows(&pool, "albums_dest").await, seeded);

    pool.close().await;
    std::fs::remove_file(&db_path).unwrap();
}

/// Referencing an undeclared connection is rejected before any statement
/// executes - even statements earlier in the chain produce no side effects.
#[tokio::test]
async fn test_undeclared_connection_fails_before_any_statement() {
    let db_path = temp_db_path("undeclared_connection");
    let pool = create_db(&db_path).await;

    let config = config_for_task(
        vec![("main", sqlite_connection(&db_path))],
        "typo_task",
        vec![
            direct("main", "CREATE TABLE should_not_exist (x int)"),
            direct("typo", "SELECT 1"),
        ],
    );

    let result = runner().execute(&config, "typo_task").await;

    assert_ne!(exit_code(&result), 0);
    let diagnostic = render_failure("typo_task", &result).unwrap();
    assert!(diagnostic.contains("typo"));

    // Pre-flight validation means statement 0 never ran.
    let tables: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'should_not_exist'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tables, 0);

    pool.close().await;
    std::fs::remove_file(&db_path).unwrap();
}

/// Transferring from an empty source succeeds with zero rows moved.
#[tokio::test]
async fn test_transfer_of_zero_rows_succeeds() {
    let db_path = temp_db_path("zero_rows");
    let pool = create_db(&db_path).await;
    prepare_src_and_dest_tables(&pool).await;
    sqlx::query("DELETE FROM albums_src")
        .execute(&pool)
        .await
        .unwrap();

    let config = config_for_task(
        vec![("main", sqlite_connection(&db_path))],
        "empty_transfer",
        vec![transfer(
            "main",
            "SELECT * FROM albums_src",
            "main",
            "albums_dest",
        )],
    );

    let result = runner().execute(&config, "empty_transfer").await;

    assert_eq!(exit_code(&result), 0);
    let outcome = result.unwrap();
    assert_eq!(outcome.statements[0].rows_affected, Some(0));
    assert_eq!(count_rows(&pool, "albums_dest").await, 0);

    pool.close().await;
    std::fs::remove_file(&db_path).unwrap();
}
