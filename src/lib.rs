//! # inkread
//!
//! Extracts color-highlighted text regions (for example blue ink on paper) from an image,
//! arranges them in natural reading order and reads each one with a pluggable text
//! recognizer.
//!
//! ## Features
//!
//! - Hue-band color masking with configurable, wrapping bands
//! - Connected-component region extraction with crops from the original image
//! - Row clustering into a deterministic visiting order
//! - Per-region recognition with timeouts, retries and a bounded worker pool
//! - Optional diagnostic cleanup image and region overlay
//! - JSON/TOML configuration
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration validation and the recognizer trait
//! * [`domain`] - Masks, regions, rows and the visiting sequence
//! * [`processors`] - Color mask, region extraction, reading order and diagnostic cleanup
//! * [`pipeline`] - The end-to-end pipeline, its configuration and results
//! * [`utils`] - Image loading, base64 transport helpers, overlays and logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use inkread::prelude::*;
//! use image::{Rgb, RgbImage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = InkPipelineBuilder::new(
//!     |block: &RgbImage| -> Result<Vec<Detection>, RecognitionError> {
//!         Ok(vec![Detection::new(format!("{}px", block.width()), 1.0)])
//!     },
//! )
//! .build()?;
//!
//! // a blue stroke on white paper
//! let page = RgbImage::from_fn(64, 32, |x, y| {
//!     if (8..40).contains(&x) && (10..16).contains(&y) {
//!         Rgb([20, 40, 220])
//!     } else {
//!         Rgb([255, 255, 255])
//!     }
//! });
//!
//! let result = pipeline.process(&page)?;
//! assert_eq!(result.texts(), vec!["32px"]);
//! assert_eq!(result.to_string(), "Block 1: 32px\n");
//! # Ok(())
//! # }
//! ```
//!
//! ### Configuration files
//!
//! ```rust,no_run
//! use inkread::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::from_json_str(r#"
//! {
//!   "color_mask": { "hue_range": [100, 140], "min_saturation": 150, "min_value": 50 },
//!   "clustering": { "row_threshold": 24, "scan_direction": "top_to_bottom" },
//!   "recognition": { "timeout_ms": 2000 },
//!   "parallel": { "max_threads": 4 }
//! }
//! "#)?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod core;
pub mod domain;

pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use inkread::prelude::*;
/// ```
///
/// Included items focus on the most common tasks:
/// - The pipeline (`InkPipeline`, `InkPipelineBuilder`, `PipelineConfig`, `PipelineResult`)
/// - The recognizer seam (`TextRecognizer`, `Detection`, `RecognitionError`)
/// - Essential error and result types (`OCRError`, `OcrResult`)
/// - Basic image loading (`load_image`, `decode_data_url`)
///
/// Individual stages and their configurations live in [`processors`] and [`pipeline`].
pub mod prelude {
    pub use crate::pipeline::{InkPipeline, InkPipelineBuilder, PipelineConfig, PipelineResult};

    pub use crate::core::{Detection, RecognitionError, TextRecognizer};

    pub use crate::core::{OCRError, OcrResult};

    pub use crate::domain::{RegionBox, RegionText};

    pub use crate::utils::{decode_data_url, load_image};
}
