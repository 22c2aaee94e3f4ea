//! The end-to-end ink reading pipeline.
//!
//! For one image the pipeline computes the color mask, extracts the connected regions,
//! clusters them into reading order and recognizes each region with the injected
//! [`TextRecognizer`]. The diagnostic cleanup runs beside this flow when enabled; its
//! output is returned but never feeds the other stages.
//!
//! ```rust,no_run
//! use inkread::core::{Detection, RecognitionError};
//! use inkread::pipeline::InkPipelineBuilder;
//! use image::RgbImage;
//!
//! let pipeline = InkPipelineBuilder::new(
//!     |block: &RgbImage| -> Result<Vec<Detection>, RecognitionError> {
//!         Ok(vec![Detection::new(format!("{}x{}", block.width(), block.height()), 1.0)])
//!     },
//! )
//! .row_threshold(24)
//! .build()?;
//!
//! let result = pipeline.process_path("page.png")?;
//! print!("{}", result);
//! # Ok::<(), inkread::core::OCRError>(())
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{GrayImage, RgbImage};
use tracing::{debug, info};

use super::config::PipelineConfig;
use super::recognition::{RecognitionConfig, RecognitionStageProcessor};
use super::result::PipelineResult;
use super::types::StageMetrics;
use crate::core::config::{ConfigValidator, ParallelPolicy};
use crate::core::validation::validate_image_dimensions;
use crate::core::{OCRError, ProcessingStage, TextRecognizer};
use crate::domain::{Mask, Region, VisitingSequence};
use crate::processors::{
    ClusterConfig, ColorMask, ColorMaskConfig, DiagnosticCleanup, ExtractionConfig,
    ReadingOrderClusterer, RegionExtractor, RowAnchor, ScanDirection,
};
use crate::utils::{decode_data_url, load_image};

/// Reads color-highlighted regions of an image in natural order.
///
/// A pipeline holds no per-request state and can serve concurrent requests from several
/// threads; the recognizer it was built with is shared by all of them.
#[derive(Debug)]
pub struct InkPipeline {
    config: PipelineConfig,
    masker: ColorMask,
    extractor: RegionExtractor,
    clusterer: ReadingOrderClusterer,
    recognition: RecognitionStageProcessor,
    diagnostic: Option<DiagnosticCleanup>,
}

impl InkPipeline {
    /// Builds a pipeline from a complete configuration.
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        config: PipelineConfig,
    ) -> Result<Self, OCRError> {
        config.validate()?;
        let diagnostic = if config.diagnostic.enabled {
            Some(DiagnosticCleanup::new(config.diagnostic.clone())?)
        } else {
            None
        };

        Ok(Self {
            masker: ColorMask::new(config.color_mask.clone())?,
            extractor: RegionExtractor::new(config.extraction.clone())?,
            clusterer: ReadingOrderClusterer::new(config.clustering.clone())?,
            recognition: RecognitionStageProcessor::new(
                recognizer,
                config.recognition.clone(),
                config.parallel.clone(),
            )?,
            diagnostic,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The color mask of `image`.
    pub fn compute_mask(&self, image: &RgbImage) -> Mask {
        self.masker.apply(image)
    }

    /// Masks `image` and extracts its regions, in no particular order.
    pub fn extract_regions(&self, image: &RgbImage) -> Result<Vec<Region>, OCRError> {
        validate_image_dimensions(image.width(), image.height(), "input")?;
        let mask = self.masker.apply(image);
        self.extractor.extract(image, &mask)
    }

    /// Masks, extracts and clusters `image` without calling the recognizer.
    pub fn visiting_sequence(
        &self,
        image: &RgbImage,
    ) -> Result<VisitingSequence<Region>, OCRError> {
        let regions = self.extract_regions(image)?;
        Ok(self.clusterer.cluster(regions))
    }

    /// Runs the diagnostic cleanup, if enabled.
    pub fn diagnostic_image(&self, image: &RgbImage) -> Option<GrayImage> {
        self.diagnostic.as_ref().map(|cleanup| cleanup.apply(image))
    }

    /// Runs the full pipeline on `image`.
    ///
    /// # Errors
    ///
    /// Fails only on precondition violations (an empty image) or when the recognition
    /// worker pool cannot be built. An image without highlighted pixels produces an empty
    /// result, and recognizer failures produce empty entries.
    pub fn process(&self, image: &RgbImage) -> Result<PipelineResult, OCRError> {
        let start_time = Instant::now();
        validate_image_dimensions(image.width(), image.height(), "input")?;
        let mut metrics = Vec::with_capacity(5);

        let stage_start = Instant::now();
        let mask = self.masker.apply(image);
        let foreground = mask.count_foreground();
        metrics.push(
            StageMetrics::new(ProcessingStage::ColorMask, 1, 0)
                .with_processing_time(stage_start.elapsed())
                .with_info("foreground_pixels", foreground.to_string()),
        );

        let stage_start = Instant::now();
        let regions = self.extractor.extract(image, &mask)?;
        metrics.push(
            StageMetrics::new(ProcessingStage::RegionExtraction, regions.len(), 0)
                .with_processing_time(stage_start.elapsed()),
        );

        let stage_start = Instant::now();
        let sequence = self.clusterer.cluster(regions);
        let row_count = sequence.row_count();
        metrics.push(
            StageMetrics::new(ProcessingStage::Clustering, sequence.len(), 0)
                .with_processing_time(stage_start.elapsed())
                .with_info("rows", row_count.to_string()),
        );

        let recognized = self.recognition.process(&sequence)?;
        metrics.push(recognized.metrics);

        let diagnostic = self.diagnostic.as_ref().map(|cleanup| {
            let stage_start = Instant::now();
            let cleaned = cleanup.apply(image);
            metrics.push(
                StageMetrics::new(ProcessingStage::Diagnostic, 1, 0)
                    .with_processing_time(stage_start.elapsed()),
            );
            cleaned
        });

        for stage in &metrics {
            debug!(
                "Stage {} took {:?} ({} ok, {} failed)",
                stage.stage,
                stage.processing_time.unwrap_or_default(),
                stage.success_count,
                stage.failure_count
            );
        }

        let result = PipelineResult {
            width: image.width(),
            height: image.height(),
            regions: recognized.data,
            row_count,
            mask: self.config.keep_mask.then_some(mask),
            diagnostic,
            metrics,
            total_time: start_time.elapsed(),
        };

        info!(
            "Read {} regions in {} rows ({} with text, {} failed) in {:?}",
            result.len(),
            result.row_count,
            result.recognized_count(),
            result.failed_count(),
            result.total_time
        );
        Ok(result)
    }

    /// Loads an image file and runs the pipeline on it.
    pub fn process_path(&self, path: impl AsRef<Path>) -> Result<PipelineResult, OCRError> {
        let image = load_image(path.as_ref())?;
        self.process(&image)
    }

    /// Decodes a base64 image payload (optionally a `data:image/...;base64,` URL) and runs
    /// the pipeline on it.
    pub fn process_data_url(&self, payload: &str) -> Result<PipelineResult, OCRError> {
        let image = decode_data_url(payload)?;
        self.process(&image)
    }
}

/// Builder for [`InkPipeline`].
pub struct InkPipelineBuilder {
    recognizer: Arc<dyn TextRecognizer>,
    config: PipelineConfig,
}

impl std::fmt::Debug for InkPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InkPipelineBuilder")
            .field("recognizer", &self.recognizer.name())
            .field("config", &self.config)
            .finish()
    }
}

impl InkPipelineBuilder {
    /// Starts a builder around an owned recognizer.
    pub fn new<R: TextRecognizer + 'static>(recognizer: R) -> Self {
        Self::from_shared(Arc::new(recognizer))
    }

    /// Starts a builder around a recognizer handle shared with other pipelines.
    pub fn from_shared(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            config: PipelineConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn color_mask(mut self, config: ColorMaskConfig) -> Self {
        self.config.color_mask = config;
        self
    }

    /// Sets the hue band of the color mask (`0..=179`, wrapping when `low > high`).
    pub fn hue_range(mut self, low: u8, high: u8) -> Self {
        self.config.color_mask.hue_range = (low, high);
        self
    }

    pub fn extraction(mut self, config: ExtractionConfig) -> Self {
        self.config.extraction = config;
        self
    }

    pub fn clustering(mut self, config: ClusterConfig) -> Self {
        self.config.clustering = config;
        self
    }

    pub fn row_threshold(mut self, row_threshold: u32) -> Self {
        self.config.clustering.row_threshold = row_threshold;
        self
    }

    pub fn scan_direction(mut self, scan_direction: ScanDirection) -> Self {
        self.config.clustering.scan_direction = scan_direction;
        self
    }

    pub fn row_anchor(mut self, row_anchor: RowAnchor) -> Self {
        self.config.clustering.row_anchor = row_anchor;
        self
    }

    pub fn recognition(mut self, config: RecognitionConfig) -> Self {
        self.config.recognition = config;
        self
    }

    /// Bounds each recognizer call; a call that takes longer yields an empty entry.
    pub fn recognition_timeout(mut self, timeout: Duration) -> Self {
        self.config.recognition.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn parallel_policy(mut self, policy: ParallelPolicy) -> Self {
        self.config.parallel = policy;
        self
    }

    pub fn diagnostic(mut self, enabled: bool) -> Self {
        self.config.diagnostic.enabled = enabled;
        self
    }

    pub fn keep_mask(mut self, keep_mask: bool) -> Self {
        self.config.keep_mask = keep_mask;
        self
    }

    pub fn build(self) -> Result<InkPipeline, OCRError> {
        InkPipeline::new(self.recognizer, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Detection, RecognitionError};
    use crate::domain::{RecognitionOutcome, RegionBox};
    use crate::utils::encode_png_base64;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BLUE: Rgb<u8> = Rgb([20, 40, 220]);
    const RED: Rgb<u8> = Rgb([220, 30, 30]);
    const PAPER: Rgb<u8> = Rgb([250, 248, 240]);

    fn page(boxes: &[(RegionBox, Rgb<u8>)]) -> RgbImage {
        RgbImage::from_fn(120, 80, |x, y| {
            boxes
                .iter()
                .find(|(b, _)| b.contains(x, y))
                .map_or(PAPER, |(_, color)| *color)
        })
    }

    fn three_blue_boxes() -> RgbImage {
        page(&[
            (RegionBox::new(60, 10, 22, 10), BLUE),
            (RegionBox::new(10, 14, 18, 10), BLUE),
            (RegionBox::new(30, 50, 25, 12), BLUE),
        ])
    }

    fn width_reader(block: &RgbImage) -> Result<Vec<Detection>, RecognitionError> {
        Ok(vec![Detection::new(format!("w{}", block.width()), 0.95)])
    }

    fn pipeline() -> InkPipeline {
        InkPipelineBuilder::new(width_reader).build().unwrap()
    }

    #[test]
    fn test_reads_regions_in_row_order() {
        let result = pipeline().process(&three_blue_boxes()).unwrap();
        assert_eq!(result.texts(), vec!["w18", "w22", "w25"]);
        assert_eq!(result.row_count, 2);
        assert_eq!(result.regions[0].bounds, RegionBox::new(10, 14, 18, 10));
        assert_eq!(result.regions[2].row, 1);
        assert_eq!(result.to_string(), "Block 1: w18\nBlock 2: w22\nBlock 3: w25\n");
        assert!(result.mask.is_none());
        assert!(result.diagnostic.is_none());
    }

    #[test]
    fn test_blank_page_skips_recognizer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let pipeline = InkPipelineBuilder::new(
            move |_: &RgbImage| -> Result<Vec<Detection>, RecognitionError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            },
        )
        .build()
        .unwrap();
        let result = pipeline.process(&page(&[])).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.row_count, 0);
        assert_eq!(result.to_string(), "");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let err = pipeline().process(&RgbImage::new(0, 0)).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_failed_region_keeps_its_slot() {
        let pipeline = InkPipelineBuilder::new(
            |block: &RgbImage| -> Result<Vec<Detection>, RecognitionError> {
                if block.width() == 22 {
                    Err(RecognitionError::message("unreadable"))
                } else {
                    width_reader(block)
                }
            },
        )
        .build()
        .unwrap();
        let result = pipeline.process(&three_blue_boxes()).unwrap();
        assert_eq!(result.texts(), vec!["w18", "", "w25"]);
        assert!(matches!(
            result.regions[1].outcome,
            RecognitionOutcome::Failed { .. }
        ));
        assert_eq!(result.failed_count(), 1);
    }

    #[test]
    fn test_repeated_runs_agree() {
        let pipeline = pipeline();
        let image = three_blue_boxes();
        let first = pipeline.process(&image).unwrap();
        let second = pipeline.process(&image).unwrap();
        assert_eq!(first.regions, second.regions);
    }

    #[test]
    fn test_other_colors_ignored_by_default_band() {
        let image = page(&[
            (RegionBox::new(5, 5, 10, 10), RED),
            (RegionBox::new(40, 5, 12, 10), BLUE),
        ]);
        let result = pipeline().process(&image).unwrap();
        assert_eq!(result.texts(), vec!["w12"]);

        let red_pipeline = InkPipelineBuilder::new(width_reader)
            .hue_range(170, 10)
            .build()
            .unwrap();
        assert_eq!(red_pipeline.process(&image).unwrap().texts(), vec!["w10"]);
    }

    #[test]
    fn test_optional_artifacts() {
        let pipeline = InkPipelineBuilder::new(width_reader)
            .keep_mask(true)
            .diagnostic(true)
            .build()
            .unwrap();
        let result = pipeline.process(&three_blue_boxes()).unwrap();
        let mask = result.mask.as_ref().unwrap();
        assert_eq!(mask.dimensions(), (120, 80));
        assert!(mask.get(11, 15));
        assert!(!mask.get(0, 0));
        assert_eq!(result.diagnostic.as_ref().unwrap().dimensions(), (120, 80));
        assert!(result.stage_metrics(ProcessingStage::Diagnostic).is_some());
    }

    #[test]
    fn test_visiting_sequence_without_recognition() {
        let sequence = pipeline().visiting_sequence(&three_blue_boxes()).unwrap();
        assert_eq!(sequence.row_count(), 2);
        let xs: Vec<u32> = sequence.iter().map(|r| r.x).collect();
        assert_eq!(xs, vec![10, 60, 30]);
    }

    #[test]
    fn test_data_url_input() {
        let encoded = encode_png_base64(&three_blue_boxes()).unwrap();
        let url = format!("data:image/png;base64,{}", encoded);
        let result = pipeline().process_data_url(&url).unwrap();
        assert_eq!(result.texts(), vec!["w18", "w22", "w25"]);

        assert!(matches!(
            pipeline().process_data_url("data:image/png;base64,@@@"),
            Err(OCRError::Decode { .. })
        ));
    }

    #[test]
    fn test_parallel_pipeline_matches_sequential() {
        let parallel = InkPipelineBuilder::new(width_reader)
            .parallel_policy(ParallelPolicy::new().with_max_threads(Some(3)))
            .build()
            .unwrap();
        let sequential = InkPipelineBuilder::new(width_reader)
            .parallel_policy(ParallelPolicy::sequential())
            .build()
            .unwrap();
        let image = three_blue_boxes();
        assert_eq!(
            parallel.process(&image).unwrap().regions,
            sequential.process(&image).unwrap().regions
        );
    }

    #[test]
    fn test_invalid_config_fails_build() {
        let err = InkPipelineBuilder::new(width_reader)
            .row_threshold(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
    }
}
