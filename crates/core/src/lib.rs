// sqlpipe Core - Domain Logic & Ports
// NO infrastructure dependencies: concrete database drivers live behind the
// port layer and are wired in by the composition root.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{ChainRunner, EngineOptions};
pub use error::{EngineError, Result, StatementError, TransferSide};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
