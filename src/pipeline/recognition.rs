//! Text recognition stage.
//!
//! Every region of a [`VisitingSequence`] is handed to the injected [`TextRecognizer`].
//! The detections returned for one region are joined with single spaces in the order the
//! recognizer reported them. A region whose call fails, times out or yields nothing gets
//! an empty string, so the output always has exactly one entry per region, in visiting
//! order.
//!
//! Calls are independent. When the [`ParallelPolicy`] allows it they run on a rayon pool
//! and the results are put back by visiting index.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{StageMetrics, StageResult};
use crate::core::config::{ConfigError, ConfigValidator, ParallelPolicy};
use crate::core::{Detection, OCRError, ProcessingStage, RecognitionError, TextRecognizer};
use crate::domain::{RecognitionOutcome, Region, RegionText, VisitingSequence};

const MAX_RETRIES: u32 = 16;

/// Configuration for the recognition stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Upper bound on a single recognizer call, in milliseconds. `None` waits forever.
    pub timeout_ms: Option<u64>,
    /// How many times a failed call is repeated. Timeouts are not retried.
    pub max_retries: u32,
    /// Detections below this confidence are left out of the joined text.
    pub min_confidence: Option<f32>,
    /// Timed-out calls allowed to keep running in the background. Once reached, further
    /// timed calls fail immediately until one of them returns.
    pub max_abandoned_calls: usize,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            max_retries: 0,
            min_confidence: None,
            max_abandoned_calls: 4,
        }
    }
}

impl RecognitionConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn with_max_abandoned_calls(mut self, max_abandoned_calls: usize) -> Self {
        self.max_abandoned_calls = max_abandoned_calls;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl ConfigValidator for RecognitionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::InvalidConfig {
                message: "timeout_ms must be greater than 0 when set".to_string(),
            });
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ConfigError::ResourceLimitExceeded {
                message: format!(
                    "max_retries {} exceeds maximum of {}",
                    self.max_retries, MAX_RETRIES
                ),
            });
        }
        if let Some(min_confidence) = self.min_confidence {
            self.validate_confidence_threshold(min_confidence)?;
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Runs the recognizer over a visiting sequence.
pub struct RecognitionStageProcessor {
    recognizer: Arc<dyn TextRecognizer>,
    config: RecognitionConfig,
    policy: ParallelPolicy,
    abandoned: Arc<AtomicUsize>,
}

impl std::fmt::Debug for RecognitionStageProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionStageProcessor")
            .field("recognizer", &self.recognizer.name())
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("abandoned", &self.abandoned_calls())
            .finish()
    }
}

impl RecognitionStageProcessor {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        config: RecognitionConfig,
        policy: ParallelPolicy,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        policy.validate()?;
        Ok(Self {
            recognizer,
            config,
            policy,
            abandoned: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    /// Timed-out calls whose helper threads have not returned yet.
    pub fn abandoned_calls(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Recognizes every region of `sequence`.
    ///
    /// The output has one [`RegionText`] per region, in visiting order. Recognizer
    /// failures never surface as errors; the only error is failing to build the worker
    /// pool.
    pub fn process(
        &self,
        sequence: &VisitingSequence<Region>,
    ) -> Result<StageResult<Vec<RegionText>>, OCRError> {
        let start_time = Instant::now();
        let items: Vec<(usize, &Region)> = sequence.iter_with_rows().collect();

        if items.is_empty() {
            let metrics = StageMetrics::new(ProcessingStage::Recognition, 0, 0)
                .with_processing_time(start_time.elapsed())
                .with_info("regions", "0");
            return Ok(StageResult::new(Vec::new(), metrics));
        }

        let texts = if self.policy.should_parallelize(items.len()) {
            debug!(
                "Using parallel recognition for {} regions ({})",
                items.len(),
                self.recognizer.name()
            );
            self.recognize_parallel(&items)?
        } else {
            debug!(
                "Using sequential recognition for {} regions ({})",
                items.len(),
                self.recognizer.name()
            );
            items
                .iter()
                .enumerate()
                .map(|(index, (row, region))| self.recognize_region(index, *row, region))
                .collect::<Vec<_>>()
        };

        let failure_count = texts.iter().filter(|text| text.is_failed()).count();
        let metrics = StageMetrics::new(
            ProcessingStage::Recognition,
            texts.len() - failure_count,
            failure_count,
        )
        .with_processing_time(start_time.elapsed())
        .with_info("regions", texts.len().to_string())
        .with_info("recognizer", self.recognizer.name());

        Ok(StageResult::new(texts, metrics))
    }

    fn recognize_parallel(
        &self,
        items: &[(usize, &Region)],
    ) -> Result<Vec<RegionText>, OCRError> {
        let run = || -> Vec<(usize, RegionText)> {
            items
                .par_iter()
                .enumerate()
                .map(|(index, (row, region))| {
                    (index, self.recognize_region(index, *row, region))
                })
                .collect()
        };

        let mut indexed = match self.policy.max_threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("inkread-recognize-{}", i))
                    .build()
                    .map_err(|e| {
                        OCRError::processing_error(
                            ProcessingStage::Recognition,
                            "building recognition worker pool",
                            e,
                        )
                    })?;
                pool.install(run)
            }
            None => run(),
        };

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, text)| text).collect())
    }

    /// Recognizes one region. Failures are logged and turned into an empty entry.
    pub fn recognize_region(&self, index: usize, row: usize, region: &Region) -> RegionText {
        let bounds = region.bounds();
        match self.recognize_with_retries(&region.pixels) {
            Ok(detections) => {
                let (text, used) = self.aggregate(&detections);
                let outcome = if used == 0 {
                    RecognitionOutcome::NoDetections
                } else {
                    RecognitionOutcome::Recognized
                };
                RegionText {
                    bounds,
                    row,
                    text,
                    detections: used,
                    outcome,
                }
            }
            Err(e) => {
                let reason = describe(&e);
                warn!(
                    "Recognition failed for region {} at ({}, {}): {}",
                    index, bounds.x, bounds.y, reason
                );
                RegionText {
                    bounds,
                    row,
                    text: String::new(),
                    detections: 0,
                    outcome: RecognitionOutcome::Failed { reason },
                }
            }
        }
    }

    /// Joins detection texts with single spaces, skipping those under the confidence floor.
    ///
    /// Returns the text and the number of detections that went into it.
    pub fn aggregate(&self, detections: &[Detection]) -> (String, usize) {
        let kept: Vec<&str> = detections
            .iter()
            .filter(|d| self.config.min_confidence.map_or(true, |min| d.confidence >= min))
            .map(|d| d.text.as_str())
            .collect();
        (kept.join(" "), kept.len())
    }

    fn recognize_with_retries(
        &self,
        block: &RgbImage,
    ) -> Result<Vec<Detection>, RecognitionError> {
        let mut attempt = 0;
        loop {
            match self.call_once(block) {
                Ok(detections) => return Ok(detections),
                Err(e @ RecognitionError::Timeout { .. }) => return Err(e),
                Err(e @ RecognitionError::Saturated { .. }) => return Err(e),
                Err(e) if attempt >= self.config.max_retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    debug!("Retrying recognition (attempt {}): {}", attempt + 1, e);
                }
            }
        }
    }

    /// One recognizer call, bounded by the configured timeout.
    ///
    /// With a timeout the call runs on a helper thread. A call that outlives the timeout
    /// is abandoned; its thread finishes in the background and the result is dropped.
    /// At most `max_abandoned_calls` such threads are tolerated at once.
    fn call_once(&self, block: &RgbImage) -> Result<Vec<Detection>, RecognitionError> {
        let Some(after) = self.config.timeout() else {
            return self.recognizer.recognize(block);
        };

        let abandoned = self.abandoned_calls();
        if abandoned >= self.config.max_abandoned_calls {
            return Err(RecognitionError::Saturated { abandoned });
        }

        let (tx, rx) = mpsc::channel();
        let recognizer = Arc::clone(&self.recognizer);
        let block = block.clone();
        // set by whichever side finishes first: the helper returning or the caller giving up
        let settled = Arc::new(AtomicBool::new(false));
        let helper_settled = Arc::clone(&settled);
        let helper_abandoned = Arc::clone(&self.abandoned);
        thread::Builder::new()
            .name("inkread-recognize-call".to_string())
            .spawn(move || {
                let _ = tx.send(recognizer.recognize(&block));
                if helper_settled.swap(true, Ordering::SeqCst) {
                    helper_abandoned.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .map_err(RecognitionError::backend)?;

        match rx.recv_timeout(after) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                let pending = self.abandoned.fetch_add(1, Ordering::SeqCst) + 1;
                if settled.swap(true, Ordering::SeqCst) {
                    self.abandoned.fetch_sub(1, Ordering::SeqCst);
                } else {
                    warn!(
                        "Abandoned recognizer call after {:?} ({} still running)",
                        after, pending
                    );
                }
                Err(RecognitionError::Timeout { after })
            }
            Err(RecvTimeoutError::Disconnected) => Err(RecognitionError::WorkerLost),
        }
    }
}

fn describe(error: &RecognitionError) -> String {
    match std::error::Error::source(error) {
        Some(source) => format!("{}: {}", error, source),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegionBox;
    use crate::processors::ReadingOrderClusterer;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recognizer<F>(f: F) -> Arc<dyn TextRecognizer>
    where
        F: Fn(&RgbImage) -> Result<Vec<Detection>, RecognitionError> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    fn stage(
        recognizer: Arc<dyn TextRecognizer>,
        config: RecognitionConfig,
    ) -> RecognitionStageProcessor {
        RecognitionStageProcessor::new(recognizer, config, ParallelPolicy::sequential()).unwrap()
    }

    /// Regions in one row, each filled with a distinct red level equal to its index * 10.
    fn painted_sequence(count: u32) -> VisitingSequence<Region> {
        let image = RgbImage::from_fn(count * 10, 10, |x, _| Rgb([(x / 10 * 10) as u8, 0, 0]));
        let regions: Vec<Region> = (0..count)
            .map(|i| Region::crop(&image, RegionBox::new(i * 10, 0, 10, 10)).unwrap())
            .collect();
        ReadingOrderClusterer::default().cluster(regions)
    }

    fn read_red(block: &RgbImage) -> Result<Vec<Detection>, RecognitionError> {
        Ok(vec![Detection::new(format!("r{}", block.get_pixel(0, 0)[0]), 0.9)])
    }

    #[test]
    fn test_detections_joined_with_spaces() {
        let rec = recognizer(|_| {
            Ok(vec![
                Detection::new("hello", 0.9),
                Detection::new("ink", 0.8),
                Detection::new("world", 0.7),
            ])
        });
        let result = stage(rec, RecognitionConfig::default())
            .process(&painted_sequence(1))
            .unwrap();
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].text, "hello ink world");
        assert_eq!(result.data[0].detections, 3);
        assert_eq!(result.data[0].outcome, RecognitionOutcome::Recognized);
    }

    #[test]
    fn test_no_detections_gives_empty_string() {
        let rec = recognizer(|_| Ok(Vec::new()));
        let result = stage(rec, RecognitionConfig::default())
            .process(&painted_sequence(2))
            .unwrap();
        assert!(result.data.iter().all(|t| t.text.is_empty()));
        assert!(result
            .data
            .iter()
            .all(|t| t.outcome == RecognitionOutcome::NoDetections));
        assert_eq!(result.metrics.failure_count, 0);
    }

    #[test]
    fn test_failure_is_isolated_to_its_region() {
        let rec = recognizer(|block| {
            if block.get_pixel(0, 0)[0] == 10 {
                Err(RecognitionError::message("backend unavailable"))
            } else {
                read_red(block)
            }
        });
        let result = stage(rec, RecognitionConfig::default())
            .process(&painted_sequence(3))
            .unwrap();
        let texts: Vec<&str> = result.data.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["r0", "", "r20"]);
        assert!(result.data[1].is_failed());
        match &result.data[1].outcome {
            RecognitionOutcome::Failed { reason } => {
                assert!(reason.contains("backend unavailable"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(result.metrics.success_count, 2);
        assert_eq!(result.metrics.failure_count, 1);
    }

    #[test]
    fn test_timeout_gives_empty_string() {
        let rec = recognizer(|block| {
            if block.get_pixel(0, 0)[0] == 0 {
                thread::sleep(Duration::from_millis(500));
            }
            read_red(block)
        });
        let config = RecognitionConfig::default().with_timeout(Duration::from_millis(50));
        let result = stage(rec, config).process(&painted_sequence(2)).unwrap();
        assert_eq!(result.data[0].text, "");
        assert!(result.data[0].is_failed());
        assert_eq!(result.data[1].text, "r10");
    }

    #[test]
    fn test_hung_recognizer_is_not_called_past_abandon_limit() {
        let release = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));
        let (gate, counter) = (Arc::clone(&release), Arc::clone(&calls));
        let rec = recognizer(move |block| {
            counter.fetch_add(1, Ordering::SeqCst);
            while !gate.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            read_red(block)
        });
        let config = RecognitionConfig::default()
            .with_timeout(Duration::from_millis(30))
            .with_max_abandoned_calls(1);
        let processor = stage(rec, config);

        let result = processor.process(&painted_sequence(3)).unwrap();
        assert!(result.data.iter().all(|t| t.text.is_empty() && t.is_failed()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(processor.abandoned_calls(), 1);
        match &result.data[1].outcome {
            RecognitionOutcome::Failed { reason } => assert!(reason.contains("abandoned")),
            other => panic!("unexpected outcome {:?}", other),
        }

        release.store(true, Ordering::SeqCst);
        let deadline = Instant::now() + Duration::from_secs(5);
        while processor.abandoned_calls() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(processor.abandoned_calls(), 0);

        let result = processor.process(&painted_sequence(2)).unwrap();
        let texts: Vec<&str> = result.data.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["r0", "r10"]);
    }

    #[test]
    fn test_failed_call_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let rec = recognizer(move |block| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RecognitionError::message("flaky"))
            } else {
                read_red(block)
            }
        });
        let config = RecognitionConfig::default().with_max_retries(1);
        let result = stage(rec, config).process(&painted_sequence(1)).unwrap();
        assert_eq!(result.data[0].text, "r0");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_min_confidence_filters_detections() {
        let rec = recognizer(|_| {
            Ok(vec![
                Detection::new("kept", 0.9),
                Detection::new("noise", 0.2),
            ])
        });
        let config = RecognitionConfig::default().with_min_confidence(0.5);
        let result = stage(rec, config).process(&painted_sequence(1)).unwrap();
        assert_eq!(result.data[0].text, "kept");
        assert_eq!(result.data[0].detections, 1);
    }

    #[test]
    fn test_parallel_results_follow_visiting_order() {
        let rec = recognizer(|block| {
            // later regions finish first
            let red = block.get_pixel(0, 0)[0] as u64;
            thread::sleep(Duration::from_millis(200 - red));
            read_red(block)
        });
        let policy = ParallelPolicy::new().with_max_threads(Some(4));
        let processor =
            RecognitionStageProcessor::new(rec, RecognitionConfig::default(), policy).unwrap();
        let result = processor.process(&painted_sequence(8)).unwrap();
        let texts: Vec<String> = result.data.iter().map(|t| t.text.clone()).collect();
        let expected: Vec<String> = (0..8).map(|i| format!("r{}", i * 10)).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn test_empty_sequence() {
        let rec = recognizer(read_red);
        let result = stage(rec, RecognitionConfig::default())
            .process(&VisitingSequence::default())
            .unwrap();
        assert!(result.data.is_empty());
        assert_eq!(result.metrics.total_count(), 0);
    }

    #[test]
    fn test_row_index_recorded() {
        let image = RgbImage::from_pixel(40, 80, Rgb([0, 0, 0]));
        let regions = vec![
            Region::crop(&image, RegionBox::new(0, 60, 5, 5)).unwrap(),
            Region::crop(&image, RegionBox::new(0, 0, 5, 5)).unwrap(),
        ];
        let sequence = ReadingOrderClusterer::default().cluster(regions);
        let result = stage(recognizer(read_red), RecognitionConfig::default())
            .process(&sequence)
            .unwrap();
        let rows: Vec<(usize, u32)> = result.data.iter().map(|t| (t.row, t.bounds.y)).collect();
        assert_eq!(rows, vec![(0, 0), (1, 60)]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RecognitionConfig {
            timeout_ms: Some(0),
            ..RecognitionConfig::default()
        };
        assert!(RecognitionStageProcessor::new(
            recognizer(read_red),
            config,
            ParallelPolicy::default()
        )
        .is_err());
        let config = RecognitionConfig::default().with_min_confidence(1.5);
        assert!(config.validate().is_err());
    }
}
