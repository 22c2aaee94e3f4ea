//! Per-region recognition output.

use serde::{Deserialize, Serialize};

use super::region::RegionBox;

/// How the recognizer call for a region ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecognitionOutcome {
    /// At least one detection was joined into the text.
    Recognized,
    /// The recognizer ran but reported nothing usable.
    NoDetections,
    /// The call failed or timed out; the text is empty.
    Failed { reason: String },
}

/// The text read from one region, at the region's position in the visiting sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionText {
    /// Bounding box of the region in the original image.
    pub bounds: RegionBox,
    /// Index of the row the region was clustered into.
    pub row: usize,
    /// Detected fragments joined with single spaces; empty when nothing was read.
    pub text: String,
    /// Number of detections that contributed to `text`.
    pub detections: usize,
    pub outcome: RecognitionOutcome,
}

impl RegionText {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, RecognitionOutcome::Failed { .. })
    }
}
