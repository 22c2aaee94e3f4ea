//! Error types for the ink reading pipeline.
//!
//! This module defines the errors that can surface from the pipeline: image loading and
//! decoding failures, precondition violations on the input image or mask, configuration
//! problems, and processing failures inside a stage. Recognizer failures have their own
//! type, [`RecognitionError`], because they are recovered locally and never abort a request.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Enum representing the stages of the pipeline.
///
/// This enum is used to identify which stage of the pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// Hue-band masking of the input image.
    ColorMask,
    /// Connected-component extraction and cropping.
    RegionExtraction,
    /// Row clustering into reading order.
    Clustering,
    /// Calls into the text recognizer.
    Recognition,
    /// The grayscale/threshold/morphology side branch.
    Diagnostic,
    /// Encoding images for transport or display.
    Encoding,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::ColorMask => write!(f, "color mask"),
            ProcessingStage::RegionExtraction => write!(f, "region extraction"),
            ProcessingStage::Clustering => write!(f, "clustering"),
            ProcessingStage::Recognition => write!(f, "recognition"),
            ProcessingStage::Diagnostic => write!(f, "diagnostic cleanup"),
            ProcessingStage::Encoding => write!(f, "encoding"),
        }
    }
}

/// Errors that can occur in the pipeline.
#[derive(Error, Debug)]
pub enum OCRError {
    /// Error occurred while loading or decoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// A transport payload (e.g. a base64 data URL) could not be decoded.
    #[error("decode: {message}")]
    Decode {
        /// A message describing what could not be decoded.
        message: String,
    },

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A caller contract was violated (empty image, mask/image size mismatch, ...).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for pipeline operations.
pub type OcrResult<T> = Result<T, OCRError>;

impl OCRError {
    /// Creates an OCRError for a failed stage operation.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an OCRError for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an OCRError for configuration errors.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates an OCRError for an undecodable transport payload.
    pub fn decode_error(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns true if this error is a precondition violation on the caller's input.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

impl From<image::ImageError> for OCRError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for OCRError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

/// Errors reported at the recognizer boundary.
///
/// The pipeline never propagates these to the caller; a failed or timed-out call becomes an
/// empty string for that region and is logged as a warning.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// The recognition backend reported a failure.
    #[error("recognizer backend failed")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The call did not finish within the configured timeout.
    #[error("recognition timed out after {after:?}")]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// The worker running the call went away without reporting a result.
    #[error("recognition worker exited without a result")]
    WorkerLost,

    /// Too many timed-out calls are still running; no new helper thread was started.
    #[error("{abandoned} abandoned recognizer calls still running")]
    Saturated {
        /// Number of timed-out calls that have not returned yet.
        abandoned: usize,
    },
}

impl RecognitionError {
    /// Wraps any backend error.
    pub fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(error))
    }

    /// Wraps a plain message as a backend error.
    pub fn message(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Backend(message.into())
    }
}
