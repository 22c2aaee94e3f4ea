//! Image processing stages for color-highlighted region reading.
//!
//! This module provides the pure processing steps that turn an input image into an
//! ordered set of regions, plus the optional diagnostic side branch.
//!
//! # Modules
//!
//! * `color_mask` - Hue-band selection of highlighted pixels
//! * `region_extraction` - Connected components of the mask cropped from the original image
//! * `reading_order` - Row clustering and visiting order of the extracted regions
//! * `diagnostic` - Blur, adaptive threshold and closing for the diagnostic artifact
//! * `types` - Type definitions used across the processors module

pub mod color_mask;
pub mod diagnostic;
pub mod reading_order;
pub mod region_extraction;
pub mod types;

pub use color_mask::{ColorMask, ColorMaskConfig, rgb_to_hsv};
pub use diagnostic::{DiagnosticCleanup, DiagnosticConfig};
pub use reading_order::{ClusterConfig, DEFAULT_ROW_THRESHOLD, ReadingOrderClusterer};
pub use region_extraction::{ExtractionConfig, RegionExtractor};
pub use types::*;
