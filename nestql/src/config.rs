use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Resolver behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Skip fields that fail validation instead of returning the error.
    pub silent: bool,
    /// Deepest relation / operator nesting accepted in a request.
    pub max_depth: usize,
    /// Query-string parameter that holds the filter request.
    pub root_key: String,
}

impl Default for ResolverConfig {
    fn default() -> Self { Self { silent: false, max_depth: 16, root_key: "filters".to_string() } }
}

impl ResolverConfig {
    pub fn strict() -> Self { Self::default() }

    pub fn silent() -> Self { Self { silent: true, ..Self::default() } }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Defaults overridden by `NESTQL_SILENT`, `NESTQL_MAX_DEPTH` and `NESTQL_ROOT_KEY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(silent) = std::env::var("NESTQL_SILENT") {
            config.silent = matches!(silent.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Ok(depth) = std::env::var("NESTQL_MAX_DEPTH") {
            match usize::from_str(&depth) {
                Ok(depth) => config.max_depth = depth,
                Err(_) => warn!(value = %depth, "ignoring invalid NESTQL_MAX_DEPTH"),
            }
        }
        if let Ok(root_key) = std::env::var("NESTQL_ROOT_KEY") {
            config.root_key = root_key;
        }
        config
    }
}
