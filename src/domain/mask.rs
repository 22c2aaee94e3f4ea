//! Binary color masks.

use image::{GrayImage, Luma};

const FOREGROUND: u8 = 255;

/// A per-pixel boolean grid with the same dimensions as its source image.
///
/// A pixel is `true` when its color falls inside the configured band. The mask is
/// backed by an 8-bit grayscale buffer holding 0 or 255 so it can be handed straight
/// to contour tracing or written out for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    bitmap: GrayImage,
}

impl Mask {
    /// Creates an all-false mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            bitmap: GrayImage::new(width, height),
        }
    }

    /// Builds a mask by evaluating `f` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let bitmap = GrayImage::from_fn(width, height, |x, y| {
            Luma([if f(x, y) { FOREGROUND } else { 0 }])
        });
        Self { bitmap }
    }

    /// Wraps a grayscale image; any non-zero pixel is foreground.
    pub fn from_gray(gray: &GrayImage) -> Self {
        Self::from_fn(gray.width(), gray.height(), |x, y| gray.get_pixel(x, y)[0] > 0)
    }

    /// Returns whether the pixel at (x, y) is selected.
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is outside the mask.
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bitmap.get_pixel(x, y)[0] > 0
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }

    /// Number of selected pixels.
    pub fn count_foreground(&self) -> usize {
        self.bitmap.pixels().filter(|p| p[0] > 0).count()
    }

    /// True when no pixel is selected.
    pub fn is_blank(&self) -> bool {
        self.bitmap.pixels().all(|p| p[0] == 0)
    }

    /// The 0/255 grayscale view of the mask.
    pub fn as_gray(&self) -> &GrayImage {
        &self.bitmap
    }

    pub fn into_gray(self) -> GrayImage {
        self.bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_and_counts() {
        let mask = Mask::from_fn(4, 3, |x, y| x == y);
        assert_eq!(mask.dimensions(), (4, 3));
        assert_eq!(mask.count_foreground(), 3);
        assert!(mask.get(1, 1));
        assert!(!mask.get(2, 1));
        assert!(!mask.is_blank());
    }

    #[test]
    fn test_new_mask_is_blank() {
        let mask = Mask::new(5, 5);
        assert!(mask.is_blank());
        assert_eq!(mask.count_foreground(), 0);
    }

    #[test]
    fn test_from_gray_thresholds_nonzero() {
        let mut gray = GrayImage::new(2, 1);
        gray.put_pixel(1, 0, Luma([7]));
        let mask = Mask::from_gray(&gray);
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert_eq!(mask.as_gray().get_pixel(1, 0)[0], 255);
    }
}
