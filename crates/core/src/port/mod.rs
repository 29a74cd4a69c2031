// Port Layer - the driver seam between the engine and concrete databases

pub mod driver;

// Re-exports
pub use driver::{DriverError, SqlConnection, SqlDriver, SqlTransaction};
