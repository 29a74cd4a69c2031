// sqlpipe Infrastructure - SQLite Adapter
// Implements the SqlDriver / SqlConnection / SqlTransaction ports via sqlx.

mod connection;
mod driver;
mod transaction;

pub use connection::SqliteChainConnection;
pub use driver::SqliteDriver;
pub use transaction::SqliteChainTransaction;

// Note: sqlx::Error conversion happens at this boundary; core only ever
// sees DriverError (orphan rules forbid From<sqlx::Error> in core anyway).
