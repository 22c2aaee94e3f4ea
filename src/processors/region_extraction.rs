//! Connected-component region extraction.
//!
//! The mask is framed with one background pixel and traced with border following
//! (8-connectivity). Only top-level outer borders are kept, so a blob sitting inside the
//! hole of another blob is not reported separately and holes never produce regions of
//! their own. Components touching the image edge are reported like any other. Each kept
//! component is reduced to its minimal enclosing box, which is then cropped from the
//! *original* image.

use image::{GrayImage, RgbImage, imageops};
use imageproc::contours::{BorderType, Contour, find_contours};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::validation::{validate_image_dimensions, validate_same_dimensions};
use crate::core::{OCRError, ProcessingStage};
use crate::domain::{Mask, Region, RegionBox};

/// Configuration for [`RegionExtractor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Components narrower than this are dropped as noise.
    pub min_width: u32,
    /// Components shorter than this are dropped as noise.
    pub min_height: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_width: 1,
            min_height: 1,
        }
    }
}

impl ExtractionConfig {
    pub fn with_min_size(mut self, min_width: u32, min_height: u32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }
}

impl ConfigValidator for ExtractionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive_u32(self.min_width, "min_width")?;
        self.validate_positive_u32(self.min_height, "min_height")?;
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Finds connected mask components and crops them from the original image.
///
/// No ordering guarantee is made on the output; reading order is the clusterer's job.
#[derive(Debug, Clone, Default)]
pub struct RegionExtractor {
    config: ExtractionConfig,
}

impl RegionExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Bounding boxes of the top-level connected components of `mask`.
    ///
    /// Zero-area and undersized components are discarded silently.
    pub fn component_boxes(&self, mask: &Mask) -> Vec<RegionBox> {
        let contours = find_contours::<u32>(&padded(mask));
        let total = contours.len();

        let boxes: Vec<RegionBox> = contours
            .iter()
            .filter(|contour| {
                contour.border_type == BorderType::Outer && contour.parent.is_none()
            })
            .filter_map(bounding_box)
            .map(|bbox| RegionBox::new(bbox.x - 1, bbox.y - 1, bbox.width, bbox.height))
            .filter(|bbox| {
                !bbox.is_degenerate()
                    && bbox.width >= self.config.min_width
                    && bbox.height >= self.config.min_height
            })
            .collect();

        debug!(
            "Traced {} borders, kept {} top-level components",
            total,
            boxes.len()
        );
        boxes
    }

    /// Extracts one [`Region`] per kept component.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::InvalidInput` if the image is empty or the mask and image
    /// dimensions differ. Cropping never reaches outside the image.
    pub fn extract(&self, image: &RgbImage, mask: &Mask) -> Result<Vec<Region>, OCRError> {
        validate_image_dimensions(image.width(), image.height(), "input")?;
        validate_same_dimensions(mask.dimensions(), image.dimensions(), "mask", "image")?;

        self.component_boxes(mask)
            .into_iter()
            .map(|bbox| {
                Region::crop(image, bbox).map_err(|e| {
                    OCRError::processing_error(
                        ProcessingStage::RegionExtraction,
                        &format!("cropping component at ({}, {})", bbox.x, bbox.y),
                        e,
                    )
                })
            })
            .collect()
    }
}

/// Copy of the mask with a one-pixel background frame.
///
/// Border following only recognises an outer border when background lies outside it,
/// so components touching the image edge need the frame. Coordinates shift by one.
fn padded(mask: &Mask) -> GrayImage {
    let source = mask.as_gray();
    let mut framed = GrayImage::new(source.width() + 2, source.height() + 2);
    imageops::replace(&mut framed, source, 1, 1);
    framed
}

/// Minimal axis-aligned box enclosing a traced border.
fn bounding_box(contour: &Contour<u32>) -> Option<RegionBox> {
    let first = contour.points.first()?;
    let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.x, first.y, first.x, first.y);
    for point in &contour.points[1..] {
        x_min = x_min.min(point.x);
        y_min = y_min.min(point.y);
        x_max = x_max.max(point.x);
        y_max = y_max.max(point.y);
    }
    Some(RegionBox::from_inclusive(x_min, y_min, x_max, y_max))
}
