// Connection Descriptors - logical name to dialect + parameters

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parameters for one declared connection.
///
/// The logical name is the key of the surrounding connection map and is
/// unique within a run. Exactly one of `path` (file-backed engines) or
/// `url` (server engines) must be set; `validate` on the run configuration
/// enforces this before anything opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Dialect identifier (e.g. "sqlite"), resolved against the driver
    /// catalog at open time.
    pub dialect: String,

    /// Database file path. Relative paths are resolved against the
    /// configuration file's own directory during load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Connection URL for server engines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ConnectionDescriptor {
    /// The target location, for diagnostics.
    pub fn location(&self) -> String {
        match (&self.path, &self.url) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(url)) => url.clone(),
            (None, None) => "<unset>".to_string(),
        }
    }
}
