//! The boundary to an external text recognition capability.

use crate::core::errors::RecognitionError;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// One text fragment reported by a recognizer for a pixel block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The detected text.
    pub text: String,
    /// The recognizer's confidence for this fragment.
    pub confidence: f32,
}

impl Detection {
    /// Creates a new detection.
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// A text recognition capability.
///
/// Given a pixel block, an implementation returns zero or more detections in its own
/// order. The pipeline treats it as a black box: any failure is reported as a
/// [`RecognitionError`] and recovered by the caller as an empty entry.
///
/// Implementations are shared across in-flight requests and worker threads, so they
/// must be `Send + Sync`. A recognizer that is not internally thread-safe should
/// serialize access itself (for example behind a `Mutex`).
pub trait TextRecognizer: Send + Sync {
    /// Recognizes the text in `block`.
    fn recognize(&self, block: &RgbImage) -> Result<Vec<Detection>, RecognitionError>;

    /// A short name used in logs.
    fn name(&self) -> &str {
        "recognizer"
    }
}

impl<F> TextRecognizer for F
where
    F: Fn(&RgbImage) -> Result<Vec<Detection>, RecognitionError> + Send + Sync,
{
    fn recognize(&self, block: &RgbImage) -> Result<Vec<Detection>, RecognitionError> {
        self(block)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_closure_is_recognizer() {
        let recognizer: Arc<dyn TextRecognizer> =
            Arc::new(|block: &RgbImage| -> Result<Vec<Detection>, RecognitionError> {
                Ok(vec![Detection::new(
                    format!("{}x{}", block.width(), block.height()),
                    0.9,
                )])
            });
        let detections = recognizer.recognize(&RgbImage::new(3, 2)).unwrap();
        assert_eq!(detections, vec![Detection::new("3x2", 0.9)]);
        assert_eq!(recognizer.name(), "closure");
    }
}
