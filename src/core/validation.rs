//! Input Validation Utilities
//!
//! Precondition checks applied at the boundaries of the pipeline. A failure here is a
//! caller contract violation and is reported immediately, never retried.

use crate::core::OCRError;

/// Validates that an image has a non-empty pixel grid.
#[inline]
pub fn validate_image_dimensions(
    width: u32,
    height: u32,
    image_name: &str,
) -> Result<(), OCRError> {
    if width == 0 || height == 0 {
        return Err(OCRError::InvalidInput {
            message: format!(
                "Image '{}' must have positive dimensions, got {}x{}",
                image_name, width, height
            ),
        });
    }
    Ok(())
}

/// Validates that two grids have identical dimensions.
#[inline]
pub fn validate_same_dimensions(
    first: (u32, u32),
    second: (u32, u32),
    name1: &str,
    name2: &str,
) -> Result<(), OCRError> {
    if first != second {
        return Err(OCRError::InvalidInput {
            message: format!(
                "Dimension mismatch: {} is {}x{}, but {} is {}x{}",
                name1, first.0, first.1, name2, second.0, second.1
            ),
        });
    }
    Ok(())
}
