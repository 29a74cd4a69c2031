// Chain Runner - the engine's single entry point
//
// `execute(config, task) -> Result<ChainOutcome, EngineError>` is the whole
// core boundary. Fatal pre-execution failures (unknown task, invalid
// references, connections that cannot be opened) come back as `Err` with no
// side effects; statement-level failures come back as an `Ok` outcome whose
// state is `Failed`. Only the outermost caller collapses either into a
// process exit code.

use tracing::info;

use crate::application::cancel::CancelToken;
use crate::application::executor::ChainExecutor;
use crate::application::registry::{ConnectionRegistry, DriverCatalog};
use crate::application::transfer::DEFAULT_TRANSFER_BATCH_SIZE;
use crate::config::RunConfig;
use crate::domain::ChainOutcome;
use crate::error::{EngineError, Result};

/// Tunables for one runner.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Rows per transfer batch.
    pub batch_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_TRANSFER_BATCH_SIZE,
        }
    }
}

/// Executes named statement chains from a run configuration.
pub struct ChainRunner {
    catalog: DriverCatalog,
    options: EngineOptions,
}

impl ChainRunner {
    pub fn new(catalog: DriverCatalog) -> Self {
        Self::with_options(catalog, EngineOptions::default())
    }

    pub fn with_options(catalog: DriverCatalog, options: EngineOptions) -> Self {
        Self { catalog, options }
    }

    /// Execute one named task.
    pub async fn execute(&self, config: &RunConfig, task: &str) -> Result<ChainOutcome> {
        self.execute_with_cancel(config, task, None).await
    }

    /// Execute one named task with an optional cancellation token.
    pub async fn execute_with_cancel(
        &self,
        config: &RunConfig,
        task: &str,
        cancel: Option<CancelToken>,
    ) -> Result<ChainOutcome> {
        // All connection references are checked before anything opens.
        config.validate()?;

        let chain = config
            .tasks
            .get(task)
            .ok_or_else(|| EngineError::UnknownTask(task.to_string()))?;

        let registry = ConnectionRegistry::open_all(config, &self.catalog).await?;
        info!(task, connections = registry.names().count(), "Run started");

        let mut executor =
            ChainExecutor::new(&registry).with_batch_size(self.options.batch_size);
        if let Some(token) = cancel {
            executor = executor.with_cancel(token);
        }

        let outcome = executor.run(task, chain).await;

        // Teardown runs on success and failure alike.
        registry.close_all().await;
        info!(task, state = %outcome.state, "Run finished");

        Ok(outcome)
    }
}
