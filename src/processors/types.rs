//! Types used in image processing operations
//!
//! This module defines the enums and small value types that configure the processors.

use serde::{Deserialize, Serialize};

/// Specifies the order of the three channels of each input pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    /// Red, green, blue (what the `image` crate decodes to)
    #[default]
    Rgb,
    /// Blue, green, red (common for buffers from video capture APIs)
    Bgr,
}

/// A pixel in hue/saturation/value form using the 8-bit convention:
/// hue in `0..=179` (degrees halved), saturation and value in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

/// Exclusive upper bound of the 8-bit hue scale.
pub const HUE_SCALE: u8 = 180;

/// Specifies the direction in which regions are seeded before row grouping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDirection {
    /// Seed by ascending y, then ascending x. Rows come out top to bottom regardless of layout.
    #[default]
    TopToBottom,
    /// Seed by descending x, then ascending y. Reproduces the legacy traversal, which only
    /// yields correct rows when each row's members are contiguous in that order.
    RightToLeft,
}

/// Specifies which y-coordinate a candidate is compared against when deciding row membership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAnchor {
    /// The most recently appended region (rows may drift downward across many members)
    #[default]
    Previous,
    /// The first region seeded into the open row (every member stays within the threshold of it)
    First,
}
