//! The ink reading pipeline.
//!
//! This module wires the processors together with the recognition stage:
//!
//! - [`InkPipeline`] / [`InkPipelineBuilder`]: the end-to-end pipeline
//! - [`RecognitionStageProcessor`]: per-region recognition with timeouts, retries and a
//!   bounded worker pool
//! - [`PipelineConfig`]: JSON/TOML configuration of every stage
//! - [`PipelineResult`]: ordered region texts, optional artifacts and [`StageMetrics`]

pub mod config;
pub mod ink;
pub mod recognition;
pub mod result;
pub mod types;

pub use config::{ConfigFormat, PipelineConfig};
pub use ink::{InkPipeline, InkPipelineBuilder};
pub use recognition::{RecognitionConfig, RecognitionStageProcessor};
pub use result::PipelineResult;
pub use types::{StageMetrics, StageResult};
