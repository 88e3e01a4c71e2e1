//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Tunables for request processing. All fields have working defaults; a
/// YAML file can override any subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum classification confidence before a request is considered
    /// resolved.
    pub confidence_threshold: f64,
    /// Raise `UnresolvableIntent` below the threshold instead of
    /// proceeding with defaults.
    pub fail_below_threshold: bool,
    /// Upper bound on repair round-trips for a failing artifact.
    pub max_repair_iterations: usize,
    /// Billing hours per month used by cost estimation.
    pub hours_per_month: f64,
    /// Turns kept per session.
    pub history_capacity: usize,
    /// Reference snippets requested from the retriever per request.
    pub snippet_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            fail_below_threshold: false,
            max_repair_iterations: 3,
            hours_per_month: smith_validate::HOURS_PER_MONTH,
            history_capacity: 50,
            snippet_limit: 3,
        }
    }
}

impl PipelineConfig {
    /// Load overrides from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        serde_yaml::from_str(&raw)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
    }
}
