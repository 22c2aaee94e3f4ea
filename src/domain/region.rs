//! Regions, rows and the visiting sequence.
//!
//! Coordinates follow image conventions: the origin is the top-left pixel, x grows
//! rightward and y grows downward.

use image::{RgbImage, imageops};
use serde::{Deserialize, Serialize};

use crate::core::OCRError;

/// An axis-aligned bounding box in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the box spanning the inclusive pixel range [x_min, x_max] x [y_min, y_max].
    pub fn from_inclusive(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Self {
        Self::new(x_min, y_min, x_max - x_min + 1, y_max - y_min + 1)
    }

    /// Exclusive right edge, saturating at `u32::MAX`.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `u32::MAX`.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// A box with no area cannot carry pixels.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// True if the box lies entirely inside a `width` x `height` grid.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= width && b <= height)
    }
}

/// A connected component of the mask together with its crop of the original image.
///
/// Regions are created once by the extractor and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// The original (unmasked) pixels inside the box.
    pub pixels: RgbImage,
}

impl Region {
    /// Crops `bounds` out of `image`.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::InvalidInput` if the box is degenerate or does not fit the image.
    pub fn crop(image: &RgbImage, bounds: RegionBox) -> Result<Self, OCRError> {
        if bounds.is_degenerate() {
            return Err(OCRError::invalid_input(format!(
                "cannot crop a zero-area region at ({}, {})",
                bounds.x, bounds.y
            )));
        }
        if !bounds.fits_within(image.width(), image.height()) {
            return Err(OCRError::invalid_input(format!(
                "region {}x{} at ({}, {}) exceeds image {}x{}",
                bounds.width,
                bounds.height,
                bounds.x,
                bounds.y,
                image.width(),
                image.height()
            )));
        }
        let pixels =
            imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height).to_image();
        Ok(Self {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            pixels,
        })
    }

    pub fn bounds(&self) -> RegionBox {
        RegionBox::new(self.x, self.y, self.width, self.height)
    }
}

/// Anything with a top-left position that the reading-order clusterer can arrange.
pub trait Positioned {
    /// The (x, y) of the top-left corner.
    fn position(&self) -> (u32, u32);
}

impl Positioned for RegionBox {
    fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

impl Positioned for Region {
    fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

/// Regions judged to lie at approximately the same vertical position.
///
/// Once clustering has finished, members are ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<T = Region> {
    members: Vec<T>,
}

impl<T> Row<T> {
    pub(crate) fn from_members(members: Vec<T>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[T] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.members.iter()
    }

    pub fn into_members(self) -> Vec<T> {
        self.members
    }
}

/// The final reading order: rows in emission order, each row left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitingSequence<T = Region> {
    rows: Vec<Row<T>>,
}

impl<T> Default for VisitingSequence<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T> VisitingSequence<T> {
    pub(crate) fn from_rows(rows: Vec<Row<T>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total number of regions across all rows.
    pub fn len(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Row::is_empty)
    }

    /// Iterates regions in visiting order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.rows.iter().flat_map(|row| row.iter())
    }

    /// Iterates `(row_index, region)` pairs in visiting order.
    pub fn iter_with_rows(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(row_idx, row)| row.iter().map(move |member| (row_idx, member)))
    }

    /// Flattens the sequence, dropping row boundaries.
    pub fn into_flat(self) -> Vec<T> {
        self.rows.into_iter().flat_map(Row::into_members).collect()
    }
}

impl VisitingSequence<Region> {
    /// The same sequence with pixel payloads dropped.
    pub fn bounds(&self) -> VisitingSequence<RegionBox> {
        VisitingSequence::from_rows(
            self.rows
                .iter()
                .map(|row| Row::from_members(row.iter().map(Region::bounds).collect()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_region_box_geometry() {
        let bbox = RegionBox::from_inclusive(2, 3, 5, 3);
        assert_eq!(bbox, RegionBox::new(2, 3, 4, 1));
        assert_eq!(bbox.right(), 6);
        assert_eq!(bbox.bottom(), 4);
        assert_eq!(bbox.area(), 4);
        assert!(bbox.contains(5, 3));
        assert!(!bbox.contains(6, 3));
        assert!(!bbox.is_degenerate());
        assert!(RegionBox::new(1, 1, 0, 4).is_degenerate());
    }

    #[test]
    fn test_crop_copies_original_pixels() {
        let image = RgbImage::from_fn(6, 4, |x, y| Rgb([x as u8, y as u8, 0]));
        let region = Region::crop(&image, RegionBox::new(2, 1, 3, 2)).unwrap();
        assert_eq!(region.pixels.dimensions(), (3, 2));
        assert_eq!(*region.pixels.get_pixel(0, 0), Rgb([2, 1, 0]));
        assert_eq!(*region.pixels.get_pixel(2, 1), Rgb([4, 2, 0]));
        assert_eq!(region.bounds(), RegionBox::new(2, 1, 3, 2));
    }

    #[test]
    fn test_crop_rejects_out_of_bounds_and_degenerate() {
        let image = RgbImage::new(4, 4);
        assert!(Region::crop(&image, RegionBox::new(2, 2, 3, 1)).is_err());
        assert!(Region::crop(&image, RegionBox::new(0, 0, 0, 1)).is_err());
    }

    #[test]
    fn test_huge_coordinates_do_not_overflow() {
        let bbox = RegionBox::new(u32::MAX - 1, 3, 10, u32::MAX);
        assert_eq!(bbox.right(), u32::MAX);
        assert_eq!(bbox.bottom(), u32::MAX);
        assert!(!bbox.fits_within(u32::MAX, u32::MAX));
        assert!(bbox.contains(u32::MAX - 1, 3));

        let image = RgbImage::new(4, 4);
        let err = Region::crop(&image, bbox).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_sequence_flattening() {
        let seq = VisitingSequence::from_rows(vec![
            Row::from_members(vec![RegionBox::new(0, 0, 1, 1), RegionBox::new(5, 0, 1, 1)]),
            Row::from_members(vec![RegionBox::new(2, 40, 1, 1)]),
        ]);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.row_count(), 2);
        let rows: Vec<usize> = seq.iter_with_rows().map(|(row, _)| row).collect();
        assert_eq!(rows, vec![0, 0, 1]);
        let xs: Vec<u32> = seq.into_flat().iter().map(|b| b.x).collect();
        assert_eq!(xs, vec![0, 5, 2]);
    }

    #[test]
    fn test_empty_sequence() {
        let seq: VisitingSequence<RegionBox> = VisitingSequence::default();
        assert!(seq.is_empty());
        assert_eq!(seq.len(), 0);
    }
}
