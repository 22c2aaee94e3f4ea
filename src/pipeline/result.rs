//! Result types for the ink pipeline.

use std::fmt;
use std::time::Duration;

use image::GrayImage;
use serde_json::json;

use super::types::StageMetrics;
use crate::core::{OCRError, ProcessingStage};
use crate::domain::{Mask, RegionText};

/// Everything one pipeline run produced.
///
/// `regions` is in visiting order: row by row, left to right inside a row. Its length is
/// always the number of extracted regions, including regions whose recognition failed.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Width of the input image.
    pub width: u32,
    /// Height of the input image.
    pub height: u32,
    /// Per-region text in visiting order.
    pub regions: Vec<RegionText>,
    /// Number of rows the regions were clustered into.
    pub row_count: usize,
    /// The color mask, when requested.
    pub mask: Option<Mask>,
    /// The diagnostic cleanup image, when enabled.
    pub diagnostic: Option<GrayImage>,
    /// Per-stage metrics in execution order.
    pub metrics: Vec<StageMetrics>,
    pub total_time: Duration,
}

impl PipelineResult {
    /// The extracted text, one entry per region in visiting order.
    pub fn texts(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn into_texts(self) -> Vec<String> {
        self.regions.into_iter().map(|r| r.text).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of regions with non-empty text.
    pub fn recognized_count(&self) -> usize {
        self.regions.iter().filter(|r| !r.text.is_empty()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.regions.iter().filter(|r| r.is_failed()).count()
    }

    pub fn stage_metrics(&self, stage: ProcessingStage) -> Option<&StageMetrics> {
        self.metrics.iter().find(|m| m.stage == stage)
    }

    /// Serializes the regions and metrics (not the images) as pretty JSON.
    pub fn to_json(&self) -> Result<String, OCRError> {
        let value = json!({
            "width": self.width,
            "height": self.height,
            "row_count": self.row_count,
            "regions": self.regions,
            "metrics": self.metrics,
            "total_time_ms": self.total_time.as_secs_f64() * 1000.0,
        });
        serde_json::to_string_pretty(&value).map_err(|e| {
            OCRError::processing_error(ProcessingStage::Encoding, "serializing result", e)
        })
    }
}

/// One `Block {n}: {text}` line per region, numbered from 1.
impl fmt::Display for PipelineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, region) in self.regions.iter().enumerate() {
            writeln!(f, "Block {}: {}", index + 1, region.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RecognitionOutcome, RegionBox};

    fn region_text(x: u32, row: usize, text: &str, outcome: RecognitionOutcome) -> RegionText {
        RegionText {
            bounds: RegionBox::new(x, 0, 4, 4),
            row,
            text: text.to_string(),
            detections: usize::from(!text.is_empty()),
            outcome,
        }
    }

    fn sample() -> PipelineResult {
        PipelineResult {
            width: 40,
            height: 20,
            regions: vec![
                region_text(0, 0, "first", RecognitionOutcome::Recognized),
                region_text(
                    10,
                    0,
                    "",
                    RecognitionOutcome::Failed {
                        reason: "timeout".to_string(),
                    },
                ),
                region_text(20, 1, "third", RecognitionOutcome::Recognized),
            ],
            row_count: 2,
            mask: None,
            diagnostic: None,
            metrics: vec![StageMetrics::new(ProcessingStage::Recognition, 2, 1)],
            total_time: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_block_report() {
        assert_eq!(
            sample().to_string(),
            "Block 1: first\nBlock 2: \nBlock 3: third\n"
        );
    }

    #[test]
    fn test_counts_and_texts() {
        let result = sample();
        assert_eq!(result.texts(), vec!["first", "", "third"]);
        assert_eq!(result.recognized_count(), 2);
        assert_eq!(result.failed_count(), 1);
        assert!(result.stage_metrics(ProcessingStage::Recognition).is_some());
        assert!(result.stage_metrics(ProcessingStage::Diagnostic).is_none());
        assert_eq!(result.into_texts().len(), 3);
    }

    #[test]
    fn test_json_view() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["regions"].as_array().unwrap().len(), 3);
        assert_eq!(value["regions"][1]["outcome"]["status"], "failed");
        assert_eq!(value["metrics"][0]["stage"], "recognition");
    }
}
