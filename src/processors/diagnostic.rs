//! Binarized cleanup of the input image.
//!
//! This is a side branch: its output is a visualization artifact and is never consumed by
//! region extraction, clustering or recognition. The steps are grayscale conversion, a
//! gaussian blur, a gaussian-weighted adaptive threshold and a morphological close.

use image::{GrayImage, Luma, RgbImage, imageops};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};

/// Configuration for [`DiagnosticCleanup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticConfig {
    /// Whether the pipeline produces the artifact at all.
    pub enabled: bool,
    /// Sigma of the pre-threshold blur (1.1 is roughly a 5x5 kernel).
    pub blur_sigma: f32,
    /// Odd neighbourhood size of the adaptive threshold.
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub offset: i32,
    /// Radius of the square closing element (1 means 3x3).
    pub close_radius: u8,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            blur_sigma: 1.1,
            block_size: 11,
            offset: 2,
            close_radius: 1,
        }
    }
}

impl DiagnosticConfig {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sigma of the gaussian window used for the local mean.
    ///
    /// Derived from the block size the same way as for a gaussian kernel of that
    /// aperture: `0.3 * ((block_size - 1) / 2 - 1) + 0.8`.
    pub fn window_sigma(&self) -> f32 {
        0.3 * ((self.block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }
}

impl ConfigValidator for DiagnosticConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_f32_range(self.blur_sigma, 0.1, 50.0, "blur_sigma")?;
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "block_size must be an odd number of at least 3, got {}",
                    self.block_size
                ),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Produces the binarized diagnostic image.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCleanup {
    config: DiagnosticConfig,
}

impl DiagnosticCleanup {
    pub fn new(config: DiagnosticConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DiagnosticConfig {
        &self.config
    }

    /// Runs the cleanup. Dark strokes come out as 0 on a 255 background.
    pub fn apply(&self, image: &RgbImage) -> GrayImage {
        if image.width() == 0 || image.height() == 0 {
            return GrayImage::new(image.width(), image.height());
        }

        let gray = imageops::grayscale(image);
        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);
        let binary = self.adaptive_threshold(&blurred);
        let closed = morphology::close(&binary, Norm::LInf, self.config.close_radius);

        debug!(
            "Diagnostic cleanup produced {}x{} binary image",
            closed.width(),
            closed.height()
        );
        closed
    }

    /// Gaussian-weighted adaptive threshold: a pixel is set when it is brighter than its
    /// local weighted mean minus `offset`.
    fn adaptive_threshold(&self, image: &GrayImage) -> GrayImage {
        let local_mean = gaussian_blur_f32(image, self.config.window_sigma());
        let offset = self.config.offset;
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let value = image.get_pixel(x, y)[0] as i32;
            let mean = local_mean.get_pixel(x, y)[0] as i32;
            if value > mean - offset {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}
