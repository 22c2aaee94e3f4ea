//! Overlay rendering for clustered regions.
//!
//! Draws each region of a visiting sequence as a hollow box on a copy of the original
//! image. Rows alternate between two colors so the clustering is visible at a glance,
//! and an optional polyline joins the region centers in visiting order.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use tracing::debug;

use crate::domain::{RegionBox, VisitingSequence};

const EVEN_ROW_COLOR: Rgb<u8> = Rgb([0, 200, 0]);

const ODD_ROW_COLOR: Rgb<u8> = Rgb([255, 140, 0]);

const PATH_COLOR: Rgb<u8> = Rgb([220, 0, 0]);

/// Styling for [`draw_region_overlay`].
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Box outline thickness in pixels, drawn outward from the region.
    pub bbox_thickness: u32,
    /// Colors cycled per row.
    pub row_colors: Vec<Rgb<u8>>,
    /// Whether to connect the region centers in visiting order.
    pub draw_order_path: bool,
    pub path_color: Rgb<u8>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            bbox_thickness: 2,
            row_colors: vec![EVEN_ROW_COLOR, ODD_ROW_COLOR],
            draw_order_path: true,
            path_color: PATH_COLOR,
        }
    }
}

/// Draws the regions of `sequence` onto a copy of `image`.
pub fn draw_region_overlay(
    image: &RgbImage,
    sequence: &VisitingSequence<RegionBox>,
    config: &OverlayConfig,
) -> RgbImage {
    let mut canvas = image.clone();
    let (width, height) = canvas.dimensions();

    for (row_index, bounds) in sequence.iter_with_rows() {
        let color = row_color(config, row_index);
        for thickness in 0..config.bbox_thickness {
            if let Some(rect) = outline_rect(bounds, thickness, width, height) {
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }
        }
    }

    if config.draw_order_path {
        let centers: Vec<(f32, f32)> = sequence.iter().map(center).collect();
        for pair in centers.windows(2) {
            draw_line_segment_mut(&mut canvas, pair[0], pair[1], config.path_color);
        }
    }

    debug!(
        "Drew overlay for {} regions in {} rows",
        sequence.len(),
        sequence.row_count()
    );
    canvas
}

fn row_color(config: &OverlayConfig, row_index: usize) -> Rgb<u8> {
    if config.row_colors.is_empty() {
        EVEN_ROW_COLOR
    } else {
        config.row_colors[row_index % config.row_colors.len()]
    }
}

/// The box grown by `thickness` on every side, clipped to the image.
fn outline_rect(bounds: &RegionBox, thickness: u32, width: u32, height: u32) -> Option<Rect> {
    if bounds.is_degenerate() {
        return None;
    }
    let left = bounds.x.saturating_sub(thickness);
    let top = bounds.y.saturating_sub(thickness);
    let right = (bounds.right() + thickness).min(width);
    let bottom = (bounds.bottom() + thickness).min(height);
    (right > left && bottom > top)
        .then(|| Rect::at(left as i32, top as i32).of_size(right - left, bottom - top))
}

fn center(bounds: &RegionBox) -> (f32, f32) {
    (
        bounds.x as f32 + bounds.width as f32 / 2.0,
        bounds.y as f32 + bounds.height as f32 / 2.0,
    )
}
