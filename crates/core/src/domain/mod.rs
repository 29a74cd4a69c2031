// Domain Layer - statement chains, connection descriptors, run outcomes

pub mod chain;
pub mod connection;
pub mod error;
pub mod outcome;
pub mod value;

// Re-exports
pub use chain::{Statement, StatementChain};
pub use connection::ConnectionDescriptor;
pub use error::DomainError;
pub use outcome::{ChainOutcome, ChainState, StatementOutcome, StatementStatus};
pub use value::{Batch, Row, SqlValue};
