//! Shared parallel processing configuration types.

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigValidator};

/// Configuration for parallel recognition of regions.
///
/// Per-region recognizer calls are independent, so they may run on a bounded worker pool.
/// Results are always written back by visiting index, never in completion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of worker threads for recognition.
    /// If None, rayon's global pool is used (typically number of CPU cores).
    /// Default: None
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Threshold for number of regions to recognize sequentially (<= this uses sequential)
    /// Default: 1 (single regions are processed inline)
    #[serde(default = "ParallelPolicy::default_region_threshold")]
    pub region_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never leaves the calling thread.
    pub fn sequential() -> Self {
        Self {
            max_threads: Some(1),
            region_threshold: usize::MAX,
        }
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the region processing threshold.
    pub fn with_region_threshold(mut self, threshold: usize) -> Self {
        self.region_threshold = threshold;
        self
    }

    /// Whether `count` regions should be recognized on the worker pool.
    pub fn should_parallelize(&self, count: usize) -> bool {
        count > self.region_threshold && self.max_threads != Some(1)
    }

    fn default_region_threshold() -> usize {
        1
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            region_threshold: Self::default_region_threshold(),
        }
    }
}

impl ConfigValidator for ParallelPolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threads) = self.max_threads {
            self.validate_thread_count(threads)?;
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
