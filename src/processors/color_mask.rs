//! Hue-band color masking.
//!
//! Each pixel is converted to hue/saturation/value (8-bit convention, hue `0..=179`)
//! and selected when its hue lies inside the configured closed band and its
//! saturation and value reach the configured minimums. The default band is the one
//! conventionally used for blue ink; the targeted color is a deployment choice and is
//! always read from [`ColorMaskConfig`].

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::domain::Mask;
use crate::processors::types::{ChannelOrder, HUE_SCALE, Hsv};

/// Configuration for [`ColorMask`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorMaskConfig {
    /// Closed hue band `(low, high)` in `0..=179`. When `low > high` the band wraps
    /// through 0, which is how reds are expressed.
    pub hue_range: (u8, u8),
    /// Minimum saturation (inclusive).
    pub min_saturation: u8,
    /// Minimum value/brightness (inclusive).
    pub min_value: u8,
    /// Channel order of the input pixels.
    pub channel_order: ChannelOrder,
}

impl Default for ColorMaskConfig {
    fn default() -> Self {
        Self {
            hue_range: (100, 140),
            min_saturation: 150,
            min_value: 50,
            channel_order: ChannelOrder::Rgb,
        }
    }
}

impl ColorMaskConfig {
    pub fn with_hue_range(mut self, low: u8, high: u8) -> Self {
        self.hue_range = (low, high);
        self
    }

    pub fn with_min_saturation(mut self, min_saturation: u8) -> Self {
        self.min_saturation = min_saturation;
        self
    }

    pub fn with_min_value(mut self, min_value: u8) -> Self {
        self.min_value = min_value;
        self
    }

    pub fn with_channel_order(mut self, channel_order: ChannelOrder) -> Self {
        self.channel_order = channel_order;
        self
    }

    /// Whether `hue` falls inside the (possibly wrapping) band.
    pub fn hue_matches(&self, hue: u8) -> bool {
        let (low, high) = self.hue_range;
        if low <= high {
            (low..=high).contains(&hue)
        } else {
            hue >= low || hue <= high
        }
    }

    /// Whether an HSV pixel is inside the configured band.
    pub fn matches(&self, hsv: Hsv) -> bool {
        self.hue_matches(hsv.hue)
            && hsv.saturation >= self.min_saturation
            && hsv.value >= self.min_value
    }
}

impl ConfigValidator for ColorMaskConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let (low, high) = self.hue_range;
        if low >= HUE_SCALE || high >= HUE_SCALE {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "hue_range bounds must be below {}, got ({}, {})",
                    HUE_SCALE, low, high
                ),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Converts a pixel to 8-bit HSV.
///
/// Value is the largest channel, saturation is `255 * (max - min) / max`, and hue is the
/// angle in degrees halved and rounded so that it fits `0..=179`. Achromatic pixels get
/// hue 0.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = (max - min) as f32;

    let saturation = if max == 0 {
        0
    } else {
        (255.0 * delta / max as f32).round() as u8
    };

    let hue = if max == min {
        0
    } else {
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let degrees = if max == r {
            60.0 * (gf - bf) / delta
        } else if max == g {
            120.0 + 60.0 * (bf - rf) / delta
        } else {
            240.0 + 60.0 * (rf - gf) / delta
        };
        let degrees = if degrees < 0.0 {
            degrees + 360.0
        } else {
            degrees
        };
        let halved = (degrees / 2.0).round() as u16;
        (halved % HUE_SCALE as u16) as u8
    };

    Hsv {
        hue,
        saturation,
        value: max,
    }
}

/// Produces a [`Mask`] of the pixels whose color lies in a configured band.
///
/// This is a pure function of the image and the configuration. An image without any
/// matching pixel yields an all-false mask, which is valid input to region extraction.
#[derive(Debug, Clone, Default)]
pub struct ColorMask {
    config: ColorMaskConfig,
}

impl ColorMask {
    /// Creates a masker after validating the configuration.
    pub fn new(config: ColorMaskConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ColorMaskConfig {
        &self.config
    }

    /// Converts one input pixel to HSV, honoring the configured channel order.
    pub fn to_hsv(&self, pixel: &Rgb<u8>) -> Hsv {
        let [c0, c1, c2] = pixel.0;
        match self.config.channel_order {
            ChannelOrder::Rgb => rgb_to_hsv(c0, c1, c2),
            ChannelOrder::Bgr => rgb_to_hsv(c2, c1, c0),
        }
    }

    /// Whether one input pixel is selected.
    pub fn selects(&self, pixel: &Rgb<u8>) -> bool {
        self.config.matches(self.to_hsv(pixel))
    }

    /// Computes the mask for `image`.
    pub fn apply(&self, image: &RgbImage) -> Mask {
        let mask = Mask::from_fn(image.width(), image.height(), |x, y| {
            self.selects(image.get_pixel(x, y))
        });
        debug!(
            "Color mask selected {} of {} pixels (hue {:?})",
            mask.count_foreground(),
            image.width() as u64 * image.height() as u64,
            self.config.hue_range
        );
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgb<u8> = Rgb([20, 40, 220]);
    const RED: Rgb<u8> = Rgb([220, 30, 30]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert_eq!(
            rgb_to_hsv(0, 0, 255),
            Hsv {
                hue: 120,
                saturation: 255,
                value: 255
            }
        );
        assert_eq!(rgb_to_hsv(255, 0, 0).hue, 0);
        assert_eq!(rgb_to_hsv(0, 255, 0).hue, 60);
        let gray = rgb_to_hsv(128, 128, 128);
        assert_eq!((gray.hue, gray.saturation, gray.value), (0, 0, 128));
        assert_eq!(rgb_to_hsv(0, 0, 0).saturation, 0);
    }

    #[test]
    fn test_hue_wraps_below_scale() {
        // magenta-red just short of 360 degrees must not produce hue 180
        let hsv = rgb_to_hsv(255, 0, 1);
        assert!(hsv.hue < HUE_SCALE);
    }

    #[test]
    fn test_default_band_selects_blue_only() {
        let masker = ColorMask::default();
        assert!(masker.selects(&BLUE));
        assert!(!masker.selects(&RED));
        assert!(!masker.selects(&WHITE));
        // too dark
        assert!(!masker.selects(&Rgb([0, 0, 40])));
        // too washed out
        assert!(!masker.selects(&Rgb([150, 160, 230])));
    }

    #[test]
    fn test_bgr_channel_order() {
        let masker =
            ColorMask::new(ColorMaskConfig::default().with_channel_order(ChannelOrder::Bgr))
                .unwrap();
        // (220, 40, 20) read as BGR is the blue pixel above
        assert!(masker.selects(&Rgb([220, 40, 20])));
        assert!(!masker.selects(&BLUE));
    }

    #[test]
    fn test_wrapping_band_selects_red() {
        let config = ColorMaskConfig::default().with_hue_range(170, 10);
        assert!(config.hue_matches(175));
        assert!(config.hue_matches(0));
        assert!(config.hue_matches(10));
        assert!(!config.hue_matches(11));
        assert!(!config.hue_matches(120));
        let masker = ColorMask::new(config).unwrap();
        assert!(masker.selects(&RED));
        assert!(!masker.selects(&BLUE));
    }

    #[test]
    fn test_invalid_hue_bound_rejected() {
        let config = ColorMaskConfig::default().with_hue_range(100, 180);
        assert!(ColorMask::new(config).is_err());
    }

    #[test]
    fn test_mask_is_sound_over_color_sweep() {
        let image = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        });
        let masker = ColorMask::default();
        let mask = masker.apply(&image);
        for (x, y, pixel) in image.enumerate_pixels() {
            let hsv = masker.to_hsv(pixel);
            assert_eq!(mask.get(x, y), masker.config().matches(hsv));
            if mask.get(x, y) {
                assert!((100..=140).contains(&hsv.hue));
                assert!(hsv.saturation >= 150 && hsv.value >= 50);
            }
        }
    }

    #[test]
    fn test_no_matching_pixels_gives_blank_mask() {
        let image = RgbImage::from_pixel(8, 8, WHITE);
        let mask = ColorMask::default().apply(&image);
        assert!(mask.is_blank());
        assert_eq!(mask.dimensions(), (8, 8));
    }
}
