// Application Layer - engine services

pub mod cancel;
pub mod executor;
pub mod registry;
pub mod report;
pub mod runner;
pub mod transfer;

// Re-exports
pub use cancel::{cancel_channel, CancelSender, CancelToken};
pub use executor::ChainExecutor;
pub use registry::{ConnectionRegistry, DriverCatalog};
pub use report::{exit_code, render_failure, EXIT_FAILURE, EXIT_SUCCESS};
pub use runner::{ChainRunner, EngineOptions};
pub use transfer::DEFAULT_TRANSFER_BATCH_SIZE;
