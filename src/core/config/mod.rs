//! Configuration management for the pipeline.
//!
//! This module provides the validation trait shared by every configuration section
//! and the parallel processing policy.

pub mod errors;
pub mod parallel;

pub use errors::{ConfigError, ConfigValidator};
pub use parallel::ParallelPolicy;
