//! Shared types for pipeline stages.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::core::ProcessingStage;

/// Result wrapper for stage processing operations.
#[derive(Debug, Clone)]
pub struct StageResult<T> {
    /// The processed data from the stage
    pub data: T,
    /// Performance and error metrics for the stage
    pub metrics: StageMetrics,
}

impl<T> StageResult<T> {
    pub fn new(data: T, metrics: StageMetrics) -> Self {
        Self { data, metrics }
    }
}

/// Metrics collected while a stage runs.
#[derive(Debug, Clone, Serialize)]
pub struct StageMetrics {
    /// The stage these numbers belong to
    pub stage: ProcessingStage,
    /// Time taken to process the stage
    pub processing_time: Option<Duration>,
    /// Number of items successfully processed
    pub success_count: usize,
    /// Number of items that failed processing
    pub failure_count: usize,
    /// Additional stage-specific metrics
    pub additional_info: BTreeMap<String, String>,
}

impl StageMetrics {
    /// Create new metrics with the given counts
    pub fn new(stage: ProcessingStage, success_count: usize, failure_count: usize) -> Self {
        Self {
            stage,
            processing_time: None,
            success_count,
            failure_count,
            additional_info: BTreeMap::new(),
        }
    }

    /// Set the processing time
    pub fn with_processing_time(mut self, duration: Duration) -> Self {
        self.processing_time = Some(duration);
        self
    }

    /// Add additional information to the metrics
    pub fn with_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }

    /// Get the total number of items processed
    pub fn total_count(&self) -> usize {
        self.success_count + self.failure_count
    }

    /// Get the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            0.0
        } else {
            (self.success_count as f64 / total as f64) * 100.0
        }
    }
}
