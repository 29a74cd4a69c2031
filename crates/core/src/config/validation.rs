// Pre-flight Validation
// Unknown references are rejected before any connection opens, so a typo in
// a late statement can never be discovered after earlier statements have
// already committed.

use super::RunConfig;
use crate::error::{EngineError, Result};

impl RunConfig {
    /// Validate the whole configuration: descriptor shape, non-empty chains
    /// (already enforced at construction), and every connection reference.
    pub fn validate(&self) -> Result<()> {
        for (name, descriptor) in &self.connections {
            if descriptor.dialect.trim().is_empty() {
                return Err(EngineError::Config(format!(
                    "connection '{}': dialect must not be empty",
                    name
                )));
            }
            match (&descriptor.path, &descriptor.url) {
                (Some(_), Some(_)) => {
                    return Err(EngineError::Config(format!(
                        "connection '{}': set either 'path' or 'url', not both",
                        name
                    )));
                }
                (None, None) => {
                    return Err(EngineError::Config(format!(
                        "connection '{}': one of 'path' or 'url' is required",
                        name
                    )));
                }
                _ => {}
            }
        }

        for (task, chain) in &self.tasks {
            for (index, statement) in chain.statements().iter().enumerate() {
                for reference in statement.connection_names() {
                    if !self.connections.contains_key(reference) {
                        return Err(EngineError::UnknownConnection {
                            task: task.clone(),
                            index,
                            name: reference.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
