use serde::{Deserialize, Serialize};

/// Settings for the worker pool behind [`LinearAlgebraEngine`](crate::engine::LinearAlgebraEngine).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker threads; 0 lets rayon pick.
    pub threads: usize,

    /// Workers are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl EngineConfig {
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            thread_name_prefix: "linalg-worker".to_string(),
        }
    }
}
