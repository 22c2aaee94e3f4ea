//! Reading-order clustering for extracted regions.
//!
//! Regions are arranged into rows in two passes:
//!
//! 1. **Seed pass**: all regions are sorted into a deterministic traversal order given by
//!    the [`ScanDirection`].
//! 2. **Row pass**: the seeded regions are walked once. A region joins the open row when
//!    the absolute difference between its y and the anchor y is strictly below
//!    `row_threshold`; otherwise the open row is closed and a new one started. Closed
//!    rows are sorted left to right.
//!
//! With [`ScanDirection::TopToBottom`] the result does not depend on the order of the
//! input. [`ScanDirection::RightToLeft`] keeps the legacy x-descending seed: rows are
//! only correct when each row's members are contiguous in that traversal, and members
//! of different rows whose x-ranges interleave end up split into extra rows.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{ConfigError, ConfigValidator};
use crate::domain::{Positioned, Row, VisitingSequence};
use crate::processors::types::{RowAnchor, ScanDirection};

/// Default vertical distance, in pixels, under which two regions share a row.
pub const DEFAULT_ROW_THRESHOLD: u32 = 20;

/// Configuration for [`ReadingOrderClusterer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Regions closer than this (strictly) in y to the anchor join the open row.
    /// Scale it with the expected text height of the deployment.
    pub row_threshold: u32,
    /// Seed traversal order.
    pub scan_direction: ScanDirection,
    /// Which y the candidate is compared against.
    pub row_anchor: RowAnchor,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            row_threshold: DEFAULT_ROW_THRESHOLD,
            scan_direction: ScanDirection::default(),
            row_anchor: RowAnchor::default(),
        }
    }
}

impl ClusterConfig {
    pub fn with_row_threshold(mut self, row_threshold: u32) -> Self {
        self.row_threshold = row_threshold;
        self
    }

    pub fn with_scan_direction(mut self, scan_direction: ScanDirection) -> Self {
        self.scan_direction = scan_direction;
        self
    }

    pub fn with_row_anchor(mut self, row_anchor: RowAnchor) -> Self {
        self.row_anchor = row_anchor;
        self
    }
}

impl ConfigValidator for ClusterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive_u32(self.row_threshold, "row_threshold")
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Groups regions into rows and orders them for reading.
#[derive(Debug, Clone, Default)]
pub struct ReadingOrderClusterer {
    config: ClusterConfig,
}

impl ReadingOrderClusterer {
    pub fn new(config: ClusterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Sorts `items` into the seed traversal order.
    ///
    /// Ties on the primary key are broken by the other coordinate so the traversal is
    /// reproducible.
    pub fn seed_order<T: Positioned>(&self, items: &mut [T]) {
        match self.config.scan_direction {
            ScanDirection::TopToBottom => items.sort_by_key(|item| {
                let (x, y) = item.position();
                (y, x)
            }),
            ScanDirection::RightToLeft => items.sort_by(|a, b| {
                let (ax, ay) = a.position();
                let (bx, by) = b.position();
                bx.cmp(&ax).then(ay.cmp(&by))
            }),
        }
    }

    /// Clusters `items` into a [`VisitingSequence`].
    ///
    /// Every input item appears in the output exactly once. Rows are emitted in the order
    /// they were closed, and members of each row are ordered by ascending x. An empty
    /// input yields an empty sequence.
    pub fn cluster<T: Positioned>(&self, items: Vec<T>) -> VisitingSequence<T> {
        let mut seeded = items;
        self.seed_order(&mut seeded);

        let threshold = self.config.row_threshold;
        let mut rows: Vec<Row<T>> = Vec::new();
        let mut open: Vec<T> = Vec::new();
        let mut anchor_y: Option<u32> = None;

        for item in seeded {
            let (_, y) = item.position();
            let joins = match anchor_y {
                Some(anchor) => anchor.abs_diff(y) < threshold,
                None => true,
            };
            if !joins {
                rows.push(close_row(std::mem::take(&mut open)));
            }

            let starts_row = open.is_empty();
            open.push(item);
            anchor_y = match self.config.row_anchor {
                RowAnchor::Previous => Some(y),
                RowAnchor::First if starts_row => Some(y),
                RowAnchor::First => anchor_y,
            };
        }

        if !open.is_empty() {
            rows.push(close_row(open));
        }

        debug!(
            "Clustered regions into {} rows (threshold {}px, {:?})",
            rows.len(),
            threshold,
            self.config.scan_direction
        );
        VisitingSequence::from_rows(rows)
    }
}

/// Orders a finished row left to right; equal x falls back to y.
fn close_row<T: Positioned>(mut members: Vec<T>) -> Row<T> {
    members.sort_by_key(|member| member.position());
    Row::from_members(members)
}
