//! The core module of the pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! - Error handling
//! - Configuration validation and the parallel policy
//! - Input validation helpers
//! - The text recognizer trait
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod errors;
pub mod traits;
pub mod validation;

pub use config::{ConfigError, ConfigValidator, ParallelPolicy};
pub use errors::{OCRError, OcrResult, ProcessingStage, RecognitionError};
pub use traits::{Detection, TextRecognizer};
